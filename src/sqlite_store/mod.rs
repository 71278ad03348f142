mod query;
mod schema;
mod store;

pub use schema::MUSIC_VERSIONED_SCHEMAS;
pub use store::{SqliteMusicStore, StoreCounts, DEFAULT_BUSY_TIMEOUT};
