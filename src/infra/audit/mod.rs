pub mod in_memory;
pub mod sqlite_store;

#[allow(unused_imports)]
pub use in_memory::InMemoryAuditStore;
pub use sqlite_store::SqliteAuditStore;
