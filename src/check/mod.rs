//! 延迟探测
//! 经代理实例顺序发起 3 次 GET，对成功样本取整数平均

use crate::engine::Instance;
use crate::error::CoreError;
use crate::proxy::ProxiedClient;
use log::debug;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 请求超时或网络失败
pub const PING_DELAY_TIMEOUT: i64 = 11000;
/// 探测开始前失败（配置、实例构建、启动、客户端构建）
pub const PING_DELAY_ERROR: i64 = 10000;

pub const PROBE_ATTEMPTS: usize = 3;

/// 单次请求的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeSample {
    Measured(i64),
    Failed(String),
}

impl ProbeSample {
    /// 失败样本记为超时哨兵值
    pub fn delay(&self) -> i64 {
        match self {
            ProbeSample::Measured(ms) => *ms,
            ProbeSample::Failed(_) => PING_DELAY_TIMEOUT,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProbeSample::Measured(_) => None,
            ProbeSample::Failed(message) => Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Measured(i64),
    TimedOut,
    SetupFailed,
}

/// 一次探测的汇总结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    /// 最后一次失败的错误文本；即使整体成功也会保留
    pub diagnostic: String,
}

impl ProbeResult {
    pub fn setup_failed(err: &CoreError) -> Self {
        Self {
            outcome: ProbeOutcome::SetupFailed,
            diagnostic: err.to_string(),
        }
    }

    /// 成功样本取平均（整数除法，失败样本不参与）；全部失败则为超时哨兵值
    pub fn aggregate(samples: &[ProbeSample]) -> Self {
        let (sum, count) = samples
            .iter()
            .filter_map(|sample| match sample {
                ProbeSample::Measured(ms) => Some(*ms),
                ProbeSample::Failed(_) => None,
            })
            .fold((0i64, 0i64), |(sum, count), ms| (sum + ms, count + 1));

        let diagnostic = samples
            .iter()
            .rev()
            .find_map(ProbeSample::error)
            .unwrap_or_default()
            .to_string();

        let outcome = if count > 0 {
            ProbeOutcome::Measured(sum / count)
        } else {
            ProbeOutcome::TimedOut
        };

        Self {
            outcome,
            diagnostic,
        }
    }

    /// 对外的延迟数值：毫秒，或两个哨兵值之一
    pub fn delay(&self) -> i64 {
        match self.outcome {
            ProbeOutcome::Measured(ms) => ms,
            ProbeOutcome::TimedOut => PING_DELAY_TIMEOUT,
            ProbeOutcome::SetupFailed => PING_DELAY_ERROR,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Measured(_))
    }
}

/// `<delay>:<diagnostic>`，诊断文本原样跟在第一个冒号之后
impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.delay(), self.diagnostic)
    }
}

/// 测量经 `instance` 访问 `url` 的往返延迟
///
/// 三次请求严格顺序执行，失败不会提前结束；客户端构建失败时直接返回错误哨兵值。
pub async fn measure(
    instance: Option<Arc<dyn Instance>>,
    timeout: Duration,
    url: &str,
) -> ProbeResult {
    let client = match ProxiedClient::new(instance, timeout) {
        Ok(client) => client,
        Err(e) => return ProbeResult::setup_failed(&e),
    };

    let mut samples = Vec::with_capacity(PROBE_ATTEMPTS);
    for attempt in 1..=PROBE_ATTEMPTS {
        let start = Instant::now();
        let sample = match client.get(url).await {
            Ok(status) => {
                let elapsed = start.elapsed().as_millis() as i64;
                debug!("probe {}/{} {} -> {} in {}ms", attempt, PROBE_ATTEMPTS, url, status, elapsed);
                ProbeSample::Measured(elapsed)
            }
            Err(e) => {
                debug!("probe {}/{} {} failed: {}", attempt, PROBE_ATTEMPTS, url, e);
                ProbeSample::Failed(e.to_string())
            }
        };
        samples.push(sample);
    }

    ProbeResult::aggregate(&samples)
}
