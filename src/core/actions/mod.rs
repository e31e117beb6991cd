// Moderation action ledger module.
// Following the same models/service split as the flags module.

pub mod action_models;
pub mod action_service;

pub use action_models::*;
pub use action_service::*;
