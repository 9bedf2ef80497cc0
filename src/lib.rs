//! 代理引擎控制接口
//! 启动/停止长期运行的代理实例、查询版本，以及经代理实例测量到目标 URL 的往返延迟

pub mod api;
pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod proxy;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_support;

pub use check::{PING_DELAY_ERROR, PING_DELAY_TIMEOUT, ProbeOutcome, ProbeResult, measure};
pub use engine::{BuiltinEngine, ConfigSource, Engine, Instance};
pub use error::{CoreError, Result};
pub use lifecycle::LifecycleManager;
