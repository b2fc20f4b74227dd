//! Storage layer for the rulesets emulator
//!
//! Keeps every version of every ruleset per scope. Only an in-memory backend
//! exists; the trait keeps handlers independent of it.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use memory::InMemoryStorage;
pub use traits::{RulesetStorage, ScopeKey};
