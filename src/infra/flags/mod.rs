pub mod in_memory;
pub mod sqlite_store;

#[allow(unused_imports)]
pub use in_memory::InMemoryFlagStore;
pub use sqlite_store::SqliteFlagStore;
