//! Rulesets API client
//!
//! Typed bindings for the rulesets API: list, fetch, replace and delete
//! rulesets, their version history, phase entrypoints, and individual rules,
//! at account and zone scope.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rulesets_client::{IamAuthenticator, RulesetsV1, RulesetsV1Options};
//! use rulesets_core::GetRulesetOptions;
//!
//! # async fn run() -> Result<(), rulesets_client::RulesetsError> {
//! let auth = Arc::new(IamAuthenticator::new("my-api-key")?);
//! let client = RulesetsV1::new(
//!     RulesetsV1Options::new("crn:v1:bluemix:public:internet-svcs:global:a/123::", "zone-id")
//!         .with_authenticator(auth),
//! )?;
//! let resp = client
//!     .get_zone_ruleset(&GetRulesetOptions::new("2c0fc9fa937b11eaa1b71c4d701ab86e"))
//!     .await?;
//! println!("{:?}", resp.result);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
mod operations;
pub mod service;
pub mod transport;

pub use auth::{
    Authenticator, BasicAuthenticator, BearerTokenAuthenticator, IamAuthenticator,
    NoAuthAuthenticator,
};
pub use config::ServiceProperties;
pub use error::{Result, RulesetsError};
pub use service::{RulesetsV1, RulesetsV1Options, DEFAULT_SERVICE_NAME, DEFAULT_SERVICE_URL};
pub use transport::{DetailedResponse, RetryPolicy};
