//! 内置直连引擎
//! 只提供 freedom（直连，可重定向）和 blackhole（全部拒绝）两种出站

use super::{BoxedStream, ConfigSource, Engine, Instance};
use crate::error::{CoreError, Result};
use crate::proxy::{Destination, Network};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;

const STATE_CREATED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_CLOSED: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub outbound: OutboundConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum OutboundConfig {
    Freedom {
        /// 所有连接改发到该地址（host:port）
        #[serde(default)]
        redirect: Option<String>,
        #[serde(default)]
        connect_timeout_ms: Option<u64>,
    },
    Blackhole,
}

#[derive(Debug, Clone)]
enum Outbound {
    Freedom {
        redirect: Option<Destination>,
        connect_timeout: Option<Duration>,
    },
    Blackhole,
}

#[derive(Debug, Default, Clone)]
pub struct BuiltinEngine;

impl BuiltinEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for BuiltinEngine {
    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn load_config(&self, source: &ConfigSource) -> Result<EngineConfig> {
        let config: EngineConfig = source.parse()?;
        debug!("loaded engine config from {}", source.name());
        Ok(config)
    }

    fn new_instance(&self, config: EngineConfig) -> Result<Arc<dyn Instance>> {
        Ok(Arc::new(BuiltinInstance::new(config)?))
    }
}

pub struct BuiltinInstance {
    outbound: Outbound,
    state: AtomicU8,
}

impl BuiltinInstance {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let outbound = match config.outbound {
            OutboundConfig::Freedom {
                redirect,
                connect_timeout_ms,
            } => {
                let redirect = redirect
                    .map(|addr| Destination::parse(&format!("tcp:{}", addr)))
                    .transpose()
                    .map_err(|e| CoreError::InstanceConstruction(e.to_string()))?;
                Outbound::Freedom {
                    redirect,
                    connect_timeout: connect_timeout_ms.map(Duration::from_millis),
                }
            }
            OutboundConfig::Blackhole => Outbound::Blackhole,
        };

        Ok(Self {
            outbound,
            state: AtomicU8::new(STATE_CREATED),
        })
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }
}

#[async_trait]
impl Instance for BuiltinInstance {
    fn start(&self) -> Result<()> {
        match self.state.compare_exchange(
            STATE_CREATED,
            STATE_RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                info!("builtin instance started ({:?})", self.outbound);
                Ok(())
            }
            Err(STATE_RUNNING) => Err(CoreError::InstanceStart("already started".to_string())),
            Err(_) => Err(CoreError::InstanceStart("instance closed".to_string())),
        }
    }

    fn close(&self) -> Result<()> {
        match self.state.swap(STATE_CLOSED, Ordering::AcqRel) {
            STATE_CLOSED => Err(CoreError::InstanceClose("already closed".to_string())),
            _ => {
                info!("builtin instance closed");
                Ok(())
            }
        }
    }

    async fn dial(&self, destination: &Destination) -> Result<BoxedStream> {
        if !self.is_running() {
            return Err(CoreError::InstanceNotRunning);
        }

        match &self.outbound {
            Outbound::Blackhole => Err(CoreError::dial(
                destination,
                io::Error::new(io::ErrorKind::ConnectionRefused, "blocked by blackhole outbound"),
            )),
            Outbound::Freedom {
                redirect,
                connect_timeout,
            } => {
                if destination.network != Network::Tcp {
                    return Err(CoreError::dial(
                        destination,
                        io::Error::new(io::ErrorKind::Unsupported, "freedom outbound only dials tcp"),
                    ));
                }

                let target = redirect.as_ref().unwrap_or(destination);
                debug!("freedom dial {} via {}", destination, target);

                let connect = TcpStream::connect(target.host_port());
                let stream = match connect_timeout {
                    Some(limit) => tokio::time::timeout(*limit, connect)
                        .await
                        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))
                        .and_then(|res| res),
                    None => connect.await,
                }
                .map_err(|e| CoreError::dial(destination, e))?;

                let _ = stream.set_nodelay(true);
                Ok(Box::new(stream))
            }
        }
    }

    fn release_memory(&self) {
        debug!("builtin instance holds no reclaimable buffers");
    }
}
