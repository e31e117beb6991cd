pub mod in_memory;
pub mod sqlite_store;

#[allow(unused_imports)]
pub use in_memory::InMemoryActionStore;
pub use sqlite_store::SqliteActionStore;
