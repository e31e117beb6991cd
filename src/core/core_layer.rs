// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "flags/mod.rs"]
pub mod flags;

#[path = "actions/mod.rs"]
pub mod actions;

#[path = "audit/mod.rs"]
pub mod audit;

#[path = "collaborators.rs"]
pub mod collaborators;
