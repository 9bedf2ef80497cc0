//! 空闲端口分配

use std::io;
use std::net::TcpListener;

/// 同时绑定 `count` 个临时监听器，读出系统分配的端口后全部释放
///
/// 监听器在读出全部端口前保持打开，所以返回的端口互不相同。
pub fn free_ports(count: usize) -> io::Result<Vec<u16>> {
    let listeners = (0..count)
        .map(|_| TcpListener::bind("127.0.0.1:0"))
        .collect::<io::Result<Vec<_>>>()?;

    listeners
        .iter()
        .map(|listener| listener.local_addr().map(|addr| addr.port()))
        .collect()
}
