//! 字符串接口
//! 所有错误在这里压平成文本：空串表示成功，非空为错误描述

mod runtime;

pub use runtime::{block_on, enter};

use crate::check::ProbeResult;
use crate::engine::{BuiltinEngine, Engine};
use crate::error::CoreError;
use crate::lifecycle::{self, LifecycleManager};
use crate::util;
use lazy_static::lazy_static;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

lazy_static! {
    static ref MANAGER: Mutex<LifecycleManager> =
        Mutex::new(LifecycleManager::new(Arc::new(BuiltinEngine::new())));
}

fn manager() -> MutexGuard<'static, LifecycleManager> {
    MANAGER.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn flatten(result: crate::error::Result<()>) -> String {
    match result {
        Ok(()) => String::new(),
        Err(e) => e.to_string(),
    }
}

/// 启动长期运行实例，替换已有实例
pub fn run(data_dir: &str, config: &str, max_memory: i64) -> String {
    let _runtime = enter();
    flatten(manager().run(data_dir, config, max_memory))
}

/// 停止长期运行实例；未运行时直接返回空串
pub fn stop() -> String {
    flatten(manager().stop())
}

pub fn version() -> String {
    BuiltinEngine::new().version().to_string()
}

/// 用专用实例测量延迟，返回 `<delay>:<diagnostic>`
///
/// 阻塞调用线程；在 tokio 运行时内部调用时直接返回 `10000:` 诊断。
pub fn ping(data_dir: &str, config: &str, timeout_seconds: i32, url: &str) -> String {
    if tokio::runtime::Handle::try_current().is_ok() {
        debug!("ping called from inside a tokio runtime");
        return ProbeResult::setup_failed(&CoreError::BlockingInRuntime).to_string();
    }

    let timeout = Duration::from_secs(timeout_seconds.max(0) as u64);
    let engine = BuiltinEngine::new();
    block_on(lifecycle::ping(&engine, data_dir, config, timeout, url)).to_string()
}

/// 冒号分隔的 `count` 个空闲端口；任何一步失败返回空串
pub fn free_ports(count: i32) -> String {
    if count <= 0 {
        return String::new();
    }
    match util::free_ports(count as usize) {
        Ok(ports) => ports
            .iter()
            .map(|port| port.to_string())
            .collect::<Vec<_>>()
            .join(":"),
        Err(e) => {
            debug!("free port allocation failed: {}", e);
            String::new()
        }
    }
}

/// 返回 UUID 的规范形式，非法输入返回错误描述
pub fn custom_uuid(text: &str) -> String {
    match util::canonical_uuid(text) {
        Ok(id) => id,
        Err(e) => format!("invalid UUID {:?}: {}", text, e),
    }
}

/// 把短文本映射为 UUID，非法输入返回错误描述
pub fn derive_uuid(name: &str) -> String {
    util::derive_uuid(name).unwrap_or_else(|e| e)
}
