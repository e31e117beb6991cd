// Flag ledger module - submission, review state machine, risk scoring
// and statistics. The heart of the pipeline.

pub mod flag_models;
pub mod flag_service;
pub mod flag_stats;
pub mod flag_store;
pub mod risk;

pub use flag_models::*;
pub use flag_service::*;
pub use flag_stats::FlagStats;
pub use flag_store::*;
