//! 拨号目标：`网络:主机:端口`

use crate::error::{CoreError, Result};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Tcp,
    Udp,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Udp => "udp",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    Ip(IpAddr),
    Domain(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ip(IpAddr::V6(ip)) => write!(f, "[{}]", ip),
            Address::Ip(ip) => write!(f, "{}", ip),
            Address::Domain(domain) => f.write_str(domain),
        }
    }
}

/// 代理实例的拨号目标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub network: Network,
    pub address: Address,
    pub port: u16,
}

impl Destination {
    /// 解析 `tcp:example.com:443` / `udp:[::1]:53` 形式的目标
    ///
    /// 网络前缀、主机和端口都必须显式给出，任何缺失都返回 `DestinationParse`。
    pub fn parse(input: &str) -> Result<Self> {
        let fail = |reason: &str| CoreError::DestinationParse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (network, rest) = input
            .split_once(':')
            .ok_or_else(|| fail("missing network prefix"))?;
        let network = match network.to_ascii_lowercase().as_str() {
            "tcp" => Network::Tcp,
            "udp" => Network::Udp,
            _ => return Err(fail("unknown network")),
        };

        let (host, port) = split_host_port(rest).map_err(fail)?;
        if host.is_empty() {
            return Err(fail("missing host"));
        }
        let port: u16 = port.parse().map_err(|_| fail("invalid port"))?;
        if port == 0 {
            return Err(fail("port must not be zero"));
        }

        let address = match host.parse::<IpAddr>() {
            Ok(ip) => Address::Ip(ip),
            Err(_) if host.chars().any(|c| c.is_whitespace() || c == '/') => {
                return Err(fail("invalid host"));
            }
            Err(_) => Address::Domain(host.to_string()),
        };

        Ok(Self {
            network,
            address,
            port,
        })
    }

    /// `host:port`，IPv6 带方括号
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.network, self.address, self.port)
    }
}

impl FromStr for Destination {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn split_host_port(s: &str) -> std::result::Result<(&str, &str), &'static str> {
    if let Some(rest) = s.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or("missing ']' in address")?;
        let port = tail.strip_prefix(':').ok_or("missing port in address")?;
        return Ok((host, port));
    }

    let (host, port) = s.rsplit_once(':').ok_or("missing port in address")?;
    if host.contains(':') {
        return Err("too many colons in address");
    }
    Ok((host, port))
}
