//! 测试辅助：本地 HTTP 响应端、按脚本拨号的实例、环境变量锁

use crate::engine::{BoxedStream, ConfigSource, Engine, EngineConfig, Instance};
use crate::error::{CoreError, Result};
use crate::proxy::Destination;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub enum Step {
    Refuse,
    /// 拨号永不返回
    Stall,
    Connect(SocketAddr),
}

pub struct ScriptedInstance {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    dialed: Mutex<Vec<String>>,
}

impl ScriptedInstance {
    pub fn scripted(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            dialed: Mutex::new(Vec::new()),
        }
    }

    pub fn refusing() -> Self {
        Self::scripted(vec![], Step::Refuse)
    }

    pub fn stalling() -> Self {
        Self::scripted(vec![], Step::Stall)
    }

    pub fn redirecting(addr: SocketAddr) -> Self {
        Self::scripted(vec![], Step::Connect(addr))
    }

    pub fn dial_count(&self) -> usize {
        self.dialed.lock().unwrap().len()
    }

    pub fn dialed(&self) -> Vec<String> {
        self.dialed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Instance for ScriptedInstance {
    fn start(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn dial(&self, destination: &Destination) -> Result<BoxedStream> {
        self.dialed.lock().unwrap().push(destination.to_string());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::Refuse => Err(CoreError::dial(
                destination,
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            )),
            Step::Stall => std::future::pending::<Result<BoxedStream>>().await,
            Step::Connect(addr) => TcpStream::connect(addr)
                .await
                .map(|stream| Box::new(stream) as BoxedStream)
                .map_err(|e| CoreError::dial(destination, e)),
        }
    }
}

/// 对每个请求回 `204 No Content` 并关闭连接
pub async fn spawn_http_responder() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => {
                            request.extend_from_slice(&chunk[..n]);
                            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                    }
                }
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 204 No Content\r\nConnection: close\r\nContent-Length: 0\r\n\r\n",
                    )
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// 串行化会调用 `init_env` 的测试
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 启动总是失败的实例，记录 `close` 次数
pub struct FailingStart {
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Instance for FailingStart {
    fn start(&self) -> Result<()> {
        Err(CoreError::InstanceStart("port in use".to_string()))
    }

    fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn dial(&self, _destination: &Destination) -> Result<BoxedStream> {
        Err(CoreError::InstanceNotRunning)
    }
}

/// 只构建 `FailingStart` 实例的引擎，所有实例共享同一个计数
#[derive(Default)]
pub struct FailingStartEngine {
    closes: Arc<AtomicUsize>,
}

impl FailingStartEngine {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Engine for FailingStartEngine {
    fn version(&self) -> &str {
        "test"
    }

    fn load_config(&self, source: &ConfigSource) -> Result<EngineConfig> {
        source.parse()
    }

    fn new_instance(&self, _config: EngineConfig) -> Result<Arc<dyn Instance>> {
        Ok(Arc::new(FailingStart {
            closes: self.closes.clone(),
        }))
    }
}
