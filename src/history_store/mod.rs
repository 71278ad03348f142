mod memory_store;
mod models;
mod trait_def;

pub use memory_store::MemoryHistoryStore;
pub use models::{PlayEvent, TrackPlayCount, UserId};
pub use trait_def::HistoryStore;
