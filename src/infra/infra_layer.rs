// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "flags/mod.rs"]
pub mod flags;

#[path = "actions/mod.rs"]
pub mod actions;

#[path = "audit/mod.rs"]
pub mod audit;

#[path = "access/mod.rs"]
pub mod access;
