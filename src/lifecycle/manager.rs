//! 实例生命周期管理
//! 持有唯一的长期运行实例，负责启动与停止

use super::env::init_env;
use crate::engine::{ConfigSource, Engine, Instance};
use crate::error::Result;
use log::{info, warn};
use std::sync::Arc;

/// 加载配置、构建并启动一个实例
///
/// 启动失败时先关闭已构建的实例，再返回启动错误。
pub fn start_instance(engine: &dyn Engine, config: &str) -> Result<Arc<dyn Instance>> {
    let source = ConfigSource::new(config);
    let config = engine.load_config(&source)?;
    let instance = engine.new_instance(config)?;
    if let Err(e) = instance.start() {
        if let Err(close_err) = instance.close() {
            warn!("failed to close instance after start error: {}", close_err);
        }
        return Err(e);
    }
    Ok(instance)
}

/// 生命周期管理器
///
/// 内部不加锁：`run`/`stop` 需要 `&mut self`，并发调用由持有者自行串行化。
pub struct LifecycleManager {
    engine: Arc<dyn Engine>,
    instance: Option<Arc<dyn Instance>>,
}

impl LifecycleManager {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            instance: None,
        }
    }

    /// 从 `config` 启动新实例并替换当前实例
    ///
    /// 已有实例会先被关闭；任何一步失败都不会留下实例。
    pub fn run(&mut self, data_dir: &str, config: &str, max_memory: i64) -> Result<()> {
        init_env(data_dir, max_memory);

        if self.instance.is_some() {
            warn!("replacing the running instance");
            if let Err(e) = self.stop() {
                warn!("previous instance did not close cleanly: {}", e);
            }
        }

        let instance = start_instance(self.engine.as_ref(), config)?;
        instance.release_memory();
        self.instance = Some(instance);

        info!("instance started from {}", ConfigSource::new(config).name());
        Ok(())
    }

    /// 关闭并清空当前实例；没有实例时什么都不做
    pub fn stop(&mut self) -> Result<()> {
        match self.instance.take() {
            Some(instance) => {
                let result = instance.close();
                info!("instance stopped");
                result
            }
            None => Ok(()),
        }
    }

    pub fn version(&self) -> String {
        self.engine.version().to_string()
    }

    pub fn is_running(&self) -> bool {
        self.instance.is_some()
    }

    pub fn instance(&self) -> Option<Arc<dyn Instance>> {
        self.instance.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BoxedStream, BuiltinEngine, EngineConfig};
    use crate::error::CoreError;
    use crate::proxy::Destination;
    use crate::test_support::{FailingStartEngine, env_lock};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FREEDOM: &str = r#"{"outbound": {"protocol": "freedom"}}"#;

    fn manager() -> LifecycleManager {
        LifecycleManager::new(Arc::new(BuiltinEngine::new()))
    }

    #[test]
    fn test_run_and_stop() {
        let _env = env_lock();
        let mut manager = manager();
        manager.run(".", FREEDOM, 0).unwrap();
        assert!(manager.is_running());

        manager.stop().unwrap();
        assert!(!manager.is_running());
        manager.stop().unwrap();
    }

    #[test]
    fn test_stop_without_run_is_noop() {
        let mut manager = manager();
        assert!(manager.stop().is_ok());
        assert!(manager.stop().is_ok());
    }

    #[test]
    fn test_run_with_bad_config_leaves_no_instance() {
        let _env = env_lock();
        let mut manager = manager();
        let err = manager.run(".", "/nonexistent/config.json", 0).unwrap_err();
        assert!(matches!(err, CoreError::ConfigLoad { .. }));
        assert!(!err.to_string().is_empty());
        assert!(!manager.is_running());
        assert!(manager.stop().is_ok());
    }

    #[test]
    fn test_run_replaces_and_closes_previous_instance() {
        let _env = env_lock();
        let mut manager = manager();
        manager.run(".", FREEDOM, 0).unwrap();
        let first = manager.instance().unwrap();

        manager.run(".", FREEDOM, 0).unwrap();
        let second = manager.instance().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(matches!(first.close(), Err(CoreError::InstanceClose(_))));

        manager.stop().unwrap();
    }

    #[test]
    fn test_failed_run_clears_previous_instance() {
        let _env = env_lock();
        let mut manager = manager();
        manager.run(".", FREEDOM, 0).unwrap();
        assert!(manager.run(".", "{not json", 0).is_err());
        assert!(!manager.is_running());
    }

    #[test]
    fn test_run_with_start_failure_closes_instance() {
        let _env = env_lock();
        let engine = Arc::new(FailingStartEngine::default());
        let mut manager = LifecycleManager::new(engine.clone());

        let err = manager.run(".", FREEDOM, 0).unwrap_err();
        assert!(matches!(err, CoreError::InstanceStart(_)));
        assert_eq!(err.to_string(), "failed to start instance: port in use");
        assert_eq!(engine.closes(), 1);
        assert!(!manager.is_running());

        assert!(manager.stop().is_ok());
        assert_eq!(engine.closes(), 1);
    }

    #[test]
    fn test_version() {
        assert_eq!(manager().version(), env!("CARGO_PKG_VERSION"));
    }

    struct FailingClose {
        closes: AtomicUsize,
    }

    #[async_trait]
    impl Instance for FailingClose {
        fn start(&self) -> Result<()> {
            Ok(())
        }

        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::InstanceClose("listener busy".to_string()))
        }

        async fn dial(&self, _destination: &Destination) -> Result<BoxedStream> {
            Err(CoreError::InstanceNotRunning)
        }
    }

    struct FailingCloseEngine;

    impl Engine for FailingCloseEngine {
        fn version(&self) -> &str {
            "test"
        }

        fn load_config(&self, source: &ConfigSource) -> Result<EngineConfig> {
            source.parse()
        }

        fn new_instance(&self, _config: EngineConfig) -> Result<Arc<dyn Instance>> {
            Ok(Arc::new(FailingClose {
                closes: AtomicUsize::new(0),
            }))
        }
    }

    #[test]
    fn test_stop_clears_slot_even_when_close_fails() {
        let _env = env_lock();
        let mut manager = LifecycleManager::new(Arc::new(FailingCloseEngine));
        manager.run(".", FREEDOM, 0).unwrap();

        let err = manager.stop().unwrap_err();
        assert_eq!(err.to_string(), "failed to close instance: listener busy");
        assert!(!manager.is_running());
        assert!(manager.stop().is_ok());
    }
}
