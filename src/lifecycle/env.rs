//! 引擎所需的进程环境变量

use log::debug;

/// 资源（数据文件）目录
pub const ASSET_LOCATION_ENV: &str = "CORE_LOCATION_ASSET";
/// 强制释放内存模式
pub const MEMORY_FORCEFREE_ENV: &str = "CORE_MEMORY_FORCEFREE";
/// 强制释放模式下的内存上限（字节）
pub const MEMORY_LIMIT_ENV: &str = "CORE_MEMORY_LIMIT";

/// 设置资源目录；`max_memory > 0` 时同时开启强制释放内存模式
///
/// 环境变量是进程级的，调用方需保证没有其他线程同时读写环境。
pub fn init_env(data_dir: &str, max_memory: i64) {
    unsafe {
        std::env::set_var(ASSET_LOCATION_ENV, data_dir);
        if max_memory > 0 {
            std::env::set_var(MEMORY_FORCEFREE_ENV, "1");
            std::env::set_var(MEMORY_LIMIT_ENV, max_memory.to_string());
        }
    }
    debug!("engine env: asset dir {}, max memory {}", data_dir, max_memory);
}
