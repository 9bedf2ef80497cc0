//! 代理引擎抽象
//! 协议实现、路由等都在引擎内部，这里只关心：加载配置、创建实例、启动/关闭、经实例拨号

mod builtin;

pub use builtin::{BuiltinEngine, BuiltinInstance, EngineConfig, OutboundConfig};

use crate::error::{CoreError, Result};
use crate::proxy::Destination;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// 实例拨号得到的双向字节流
pub trait ProxyStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> ProxyStream for T {}

pub type BoxedStream = Box<dyn ProxyStream>;

/// 运行中的引擎实例
///
/// 实例只能启动一次、关闭一次；关闭后不能再用于拨号。
#[async_trait]
pub trait Instance: Send + Sync {
    fn start(&self) -> Result<()>;

    fn close(&self) -> Result<()>;

    /// 经实例连接目标；丢弃返回的 future 即取消拨号
    async fn dial(&self, destination: &Destination) -> Result<BoxedStream>;

    /// 立即回收空闲内存
    fn release_memory(&self) {}
}

/// 引擎：从配置构建实例
pub trait Engine: Send + Sync {
    fn version(&self) -> &str;

    fn load_config(&self, source: &ConfigSource) -> Result<EngineConfig>;

    fn new_instance(&self, config: EngineConfig) -> Result<Arc<dyn Instance>>;
}

/// 配置来源：文件路径，或以 `{` 开头的内联 JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Inline(String),
}

impl ConfigSource {
    pub fn new(config: &str) -> Self {
        if config.trim_start().starts_with('{') {
            ConfigSource::Inline(config.to_string())
        } else {
            ConfigSource::File(config.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ConfigSource::File(path) => path,
            ConfigSource::Inline(_) => "<inline>",
        }
    }

    /// 按扩展名选择 YAML 或 JSON 反序列化
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        match self {
            ConfigSource::Inline(text) => {
                serde_json::from_str(text).map_err(|e| CoreError::config_load(self.name(), e))
            }
            ConfigSource::File(path) => {
                let content =
                    fs::read_to_string(path).map_err(|e| CoreError::config_load(path, e))?;
                let is_yaml = Path::new(path)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                    .unwrap_or(false);

                if is_yaml {
                    serde_yaml::from_str(&content).map_err(|e| CoreError::config_load(path, e))
                } else {
                    serde_json::from_str(&content).map_err(|e| CoreError::config_load(path, e))
                }
            }
        }
    }
}

impl From<&str> for ConfigSource {
    fn from(config: &str) -> Self {
        ConfigSource::new(config)
    }
}
