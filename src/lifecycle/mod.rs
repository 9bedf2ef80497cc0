//! 实例生命周期：长期运行实例的启动/停止，以及一次性探测实例

mod env;
mod manager;
mod ping;

pub use env::{ASSET_LOCATION_ENV, MEMORY_FORCEFREE_ENV, MEMORY_LIMIT_ENV, init_env};
pub use manager::{LifecycleManager, start_instance};
pub use ping::{InstanceGuard, ping};
