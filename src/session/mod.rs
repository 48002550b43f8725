//! Session plumbing around the pure reducer: clock, transitions, storage and saves

pub mod clock;
pub mod controller;
pub mod persistence;
pub mod storage;
pub mod transition;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::Session;
pub use persistence::{deserialize, serialize, should_persist, PersistenceGateway, SaveDocument};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transition::{apply_transition, Dispatched};
