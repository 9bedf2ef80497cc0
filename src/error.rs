//! 核心错误类型
//! 内部保留类型化的错误，只在 api 边界转换为字符串

use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// 配置加载失败
    #[error("failed to load config {source_name}: {reason}")]
    ConfigLoad { source_name: String, reason: String },

    /// 实例构建失败
    #[error("failed to create instance: {0}")]
    InstanceConstruction(String),

    /// 实例启动失败
    #[error("failed to start instance: {0}")]
    InstanceStart(String),

    /// 实例关闭失败
    #[error("failed to close instance: {0}")]
    InstanceClose(String),

    /// 实例未处于运行状态
    #[error("instance is not running")]
    InstanceNotRunning,

    #[error("core instance nil")]
    NilInstance,

    /// 在 tokio 运行时内部调用了阻塞接口
    #[error("cannot block inside an async runtime")]
    BlockingInRuntime,

    /// 目标地址解析失败
    #[error("invalid destination {input:?}: {reason}")]
    DestinationParse { input: String, reason: String },

    /// 拨号失败（拒绝连接、超时等保持原始 io 错误）
    #[error("dial {destination}: {source}")]
    Dial {
        destination: String,
        #[source]
        source: io::Error,
    },

    /// HTTP 客户端构建失败
    #[error("failed to build http client: {0}")]
    ClientBuild(String),

    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),

    /// 请求失败，文本取自底层错误链
    #[error("{0}")]
    Request(String),
}

impl CoreError {
    pub fn config_load(source_name: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::ConfigLoad {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn dial(destination: impl ToString, source: io::Error) -> Self {
        CoreError::Dial {
            destination: destination.to_string(),
            source,
        }
    }
}

/// 从错误链中提取诊断文本
///
/// hyper 会把连接器返回的错误包装成 `client error (Connect)`，这里优先取出链中的
/// `CoreError`，让拨号错误原样到达调用方。
pub fn describe_error(err: &(dyn StdError + 'static)) -> String {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(core) = e.downcast_ref::<CoreError>() {
            return core.to_string();
        }
        current = e.source();
    }

    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.join(": ")
}
