//! Core domain models for the Rulesets SDK
//!
//! This crate contains the wire models shared by the client and the
//! emulator: rulesets, rules, action parameters, response envelopes,
//! and the per-operation option builders.

pub mod error;
pub mod models;
pub mod options;

pub use error::CoreError;
pub use models::*;
pub use options::*;
