//! 代理拨号与 HTTP 客户端
//! 对外提供拨号目标解析、拨号适配器和经实例拨号的客户端

mod client;
mod destination;
mod dialer;

pub use client::ProxiedClient;
pub use destination::{Address, Destination, Network};
pub use dialer::{DialerAdapter, ProxiedConnection, ProxyConnector};
