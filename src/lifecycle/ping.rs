//! 独立探测实例：创建、启动、测量、关闭，不影响长期运行的实例

use super::env::init_env;
use super::manager::start_instance;
use crate::check::{ProbeResult, measure};
use crate::engine::{Engine, Instance};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// 离开作用域时关闭实例
pub struct InstanceGuard {
    instance: Arc<dyn Instance>,
}

impl InstanceGuard {
    pub fn new(instance: Arc<dyn Instance>) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> Arc<dyn Instance> {
        self.instance.clone()
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        if let Err(e) = self.instance.close() {
            warn!("failed to close probe instance: {}", e);
        }
    }
}

/// 用 `config` 启动专用实例并测量经它访问 `url` 的延迟
pub async fn ping(
    engine: &dyn Engine,
    data_dir: &str,
    config: &str,
    timeout: Duration,
    url: &str,
) -> ProbeResult {
    init_env(data_dir, 0);

    let guard = match start_instance(engine, config) {
        Ok(instance) => InstanceGuard::new(instance),
        Err(e) => {
            debug!("probe instance setup failed: {}", e);
            return ProbeResult::setup_failed(&e);
        }
    };

    measure(Some(guard.instance()), timeout, url).await
}
