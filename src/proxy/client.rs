//! 经代理实例发请求的 HTTP 客户端

use super::dialer::{DialerAdapter, ProxyConnector};
use crate::engine::Instance;
use crate::error::{CoreError, Result, describe_error};
use bytes::Bytes;
use http_body_util::Empty;
use hyper::header::{CONNECTION, USER_AGENT};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;

const PROBE_USER_AGENT: &str = concat!("proxy-core-ping/", env!("CARGO_PKG_VERSION"));

/// 每次请求都重新经实例拨号，不复用连接
pub struct ProxiedClient {
    client: Client<HttpsConnector<ProxyConnector>, Empty<Bytes>>,
    timeout: Duration,
}

impl ProxiedClient {
    /// `timeout` 为整个请求的截止时间，为零表示不限时
    pub fn new(instance: Option<Arc<dyn Instance>>, timeout: Duration) -> Result<Self> {
        let instance = instance.ok_or(CoreError::NilInstance)?;

        let connector = ProxyConnector::new(DialerAdapter::new(instance));
        let tls = native_tls::TlsConnector::new()
            .map_err(|e| CoreError::ClientBuild(e.to_string()))?;
        let https = HttpsConnector::from((connector, tokio_native_tls::TlsConnector::from(tls)));

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(https);

        Ok(Self { client, timeout })
    }

    /// GET 一次，返回响应状态码（任何状态都算请求完成）
    pub async fn get(&self, url: &str) -> Result<StatusCode> {
        let uri: Uri = url
            .parse()
            .map_err(|e| CoreError::Request(format!("invalid url {:?}: {}", url, e)))?;

        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(CONNECTION, "close")
            .header(USER_AGENT, PROBE_USER_AGENT)
            .body(Empty::<Bytes>::new())
            .map_err(|e| CoreError::Request(e.to_string()))?;

        let send = self.client.request(request);
        let response = (if self.timeout.is_zero() {
            send.await
        } else {
            tokio::time::timeout(self.timeout, send)
                .await
                .map_err(|_| CoreError::RequestTimeout(self.timeout))?
        })
        .map_err(|e| CoreError::Request(describe_error(&e)))?;

        Ok(response.status())
    }
}
