//! Record types, client-local storage and JSONL I/O for funnel tracking

mod io;
mod paths;
mod store;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::Paths;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use types::{
    ConsentRecord, DeviceType, Filters, FunnelEvent, FunnelEventType, LoggedFunnelEvent,
    SessionRecord,
};
