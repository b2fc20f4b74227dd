//! Error types for the core crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("`{0}` is required")]
    MissingField(&'static str),

    #[error("`{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
