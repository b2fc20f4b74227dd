//! Storage traits defining the interface for persistence

use async_trait::async_trait;
use rulesets_core::RulesetDetails;
use std::fmt;

use crate::StorageError;

/// Owner of a set of rulesets: an instance, or one zone of an instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeKey {
    Account { crn: String },
    Zone { crn: String, zone: String },
}

impl ScopeKey {
    pub fn is_zone(&self) -> bool {
        matches!(self, ScopeKey::Zone { .. })
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Account { crn } => write!(f, "account:{}", crn),
            ScopeKey::Zone { crn, zone } => write!(f, "zone:{}:{}", crn, zone),
        }
    }
}

/// Versioned ruleset storage.
///
/// Every write produces a new version. Versions are decimal strings counting
/// up from "1"; rules saved without a version are stamped with the version of
/// the ruleset they were saved in.
#[async_trait]
pub trait RulesetStorage: Send + Sync {
    /// Store a new ruleset as version 1
    async fn create(
        &self,
        scope: &ScopeKey,
        ruleset: RulesetDetails,
    ) -> Result<RulesetDetails, StorageError>;

    /// Store the next version of an existing ruleset
    async fn save_version(
        &self,
        scope: &ScopeKey,
        ruleset: RulesetDetails,
    ) -> Result<RulesetDetails, StorageError>;

    /// Get the latest version of a ruleset
    async fn get_latest(
        &self,
        scope: &ScopeKey,
        id: &str,
    ) -> Result<Option<RulesetDetails>, StorageError>;

    /// Get a specific version of a ruleset
    async fn get_version(
        &self,
        scope: &ScopeKey,
        id: &str,
        version: &str,
    ) -> Result<Option<RulesetDetails>, StorageError>;

    /// All retained versions of a ruleset, oldest first
    async fn list_versions(
        &self,
        scope: &ScopeKey,
        id: &str,
    ) -> Result<Vec<RulesetDetails>, StorageError>;

    /// Latest version of every ruleset in the scope
    async fn list_latest(&self, scope: &ScopeKey) -> Result<Vec<RulesetDetails>, StorageError>;

    /// Delete a ruleset with all its versions
    async fn delete(&self, scope: &ScopeKey, id: &str) -> Result<(), StorageError>;

    /// Delete one version; the latest version cannot be deleted
    async fn delete_version(
        &self,
        scope: &ScopeKey,
        id: &str,
        version: &str,
    ) -> Result<(), StorageError>;
}
