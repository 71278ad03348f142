mod filter;
mod memory_store;
mod models;
mod trait_def;

pub use filter::TrackFilter;
pub use memory_store::MemoryCatalogStore;
pub use models::*;
pub use trait_def::CatalogStore;
