mod ports;
mod uuids;

pub use ports::free_ports;
pub use uuids::{MAX_DERIVE_LEN, canonical_uuid, derive_uuid};
