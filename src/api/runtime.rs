//! 进程级 tokio 运行时
//! 多线程运行时常驻，`run` 返回后长期实例仍可继续工作

use lazy_static::lazy_static;
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

lazy_static! {
    static ref RUNTIME: Runtime = Builder::new_multi_thread()
        .enable_all()
        .thread_name("proxy-core")
        .build()
        .unwrap_or_else(|e| panic!("failed to build tokio runtime: {}", e));
}

/// 在进程级运行时上阻塞执行 future；不能在异步上下文中调用
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}

/// 进入运行时上下文，让同步代码里的 `tokio::spawn` 可用
pub fn enter() -> tokio::runtime::EnterGuard<'static> {
    RUNTIME.enter()
}
