//! 经代理实例拨号的连接器
//! hyper 的每次建连都走 `DialerAdapter`，不使用主机网络栈

use crate::engine::{BoxedStream, Instance};
use crate::error::{CoreError, Result};
use crate::proxy::Destination;
use hyper::Uri;
use hyper::rt::ReadBufCursor;
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::rt::TokioIo;
use log::debug;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;

/// 把 `(network, address)` 转成实例的拨号目标
#[derive(Clone)]
pub struct DialerAdapter {
    instance: Arc<dyn Instance>,
}

impl DialerAdapter {
    pub fn new(instance: Arc<dyn Instance>) -> Self {
        Self { instance }
    }

    /// 例如 `dial("tcp", "example.com:443")`
    ///
    /// 地址非法时在拨号前就返回 `DestinationParse`；实例的拨号错误原样返回。
    pub async fn dial(&self, network: &str, address: &str) -> Result<BoxedStream> {
        let destination = Destination::parse(&format!("{}:{}", network, address))?;
        debug!("dialing {} through proxy instance", destination);
        self.instance.dial(&destination).await
    }
}

/// hyper 连接器：按请求 URI 的 host/port 经实例拨号
#[derive(Clone)]
pub struct ProxyConnector {
    dialer: DialerAdapter,
}

impl ProxyConnector {
    pub fn new(dialer: DialerAdapter) -> Self {
        Self { dialer }
    }
}

impl Service<Uri> for ProxyConnector {
    type Response = ProxiedConnection;
    type Error = CoreError;
    type Future = Pin<Box<dyn Future<Output = Result<ProxiedConnection>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let dialer = self.dialer.clone();
        Box::pin(async move {
            let address = authority_of(&uri)?;
            let stream = dialer.dial("tcp", &address).await?;
            Ok(ProxiedConnection::new(stream))
        })
    }
}

fn authority_of(uri: &Uri) -> Result<String> {
    let host = uri.host().ok_or_else(|| CoreError::DestinationParse {
        input: uri.to_string(),
        reason: "missing host".to_string(),
    })?;
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("https") => 443,
        _ => 80,
    });
    Ok(format!("{}:{}", host, port))
}

/// 实例返回的字节流，适配为 hyper 连接
pub struct ProxiedConnection {
    io: TokioIo<BoxedStream>,
}

impl ProxiedConnection {
    pub fn new(stream: BoxedStream) -> Self {
        Self {
            io: TokioIo::new(stream),
        }
    }
}

impl hyper::rt::Read for ProxiedConnection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        hyper::rt::Read::poll_read(Pin::new(&mut self.io), cx, buf)
    }
}

impl hyper::rt::Write for ProxiedConnection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        hyper::rt::Write::poll_write(Pin::new(&mut self.io), cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        hyper::rt::Write::poll_flush(Pin::new(&mut self.io), cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        hyper::rt::Write::poll_shutdown(Pin::new(&mut self.io), cx)
    }
}

impl Connection for ProxiedConnection {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}
