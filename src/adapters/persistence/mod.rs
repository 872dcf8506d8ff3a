//! Record store adapters.

pub mod memory_store;
pub mod seed;
pub mod sqlite_store;

pub use memory_store::MemoryStore;
pub use seed::seed_demo;
pub use sqlite_store::SqliteStore;
