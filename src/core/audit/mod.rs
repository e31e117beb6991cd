// Audit log module - compliance trail, retained independently of the
// flag and moderation-action ledgers.

pub mod audit_models;
pub mod audit_service;

pub use audit_models::*;
pub use audit_service::*;
