//! Core traits defined in `audiogate-core` and implemented by other crates.

pub mod clock;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::StorageProvider;
