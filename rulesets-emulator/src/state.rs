//! Application state shared across handlers

use rulesets_core::{RuleDetails, RulesetDetails, RulesetKind, RulesetPhase};
use rulesets_storage::{InMemoryStorage, RulesetStorage, ScopeKey};
use std::sync::Arc;

use crate::ApiError;

/// Id of the managed ruleset every instance can see
pub const MANAGED_RULESET_ID: &str = "efb7b8c949ac4650a09736fc376e9aee";

/// Shared application state
pub struct AppState {
    pub storage: Arc<dyn RulesetStorage>,
    /// Read-only rulesets visible from every scope
    pub managed: Vec<RulesetDetails>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(InMemoryStorage::new()))
    }

    /// Create with custom storage backend
    pub fn with_storage(storage: Arc<dyn RulesetStorage>) -> Self {
        Self {
            storage,
            managed: vec![seed_managed_ruleset()],
        }
    }

    pub fn managed_ruleset(&self, id: &str) -> Option<&RulesetDetails> {
        self.managed.iter().find(|r| r.id.as_deref() == Some(id))
    }

    /// Refuse writes to managed rulesets.
    pub fn ensure_writable(&self, id: &str) -> Result<(), ApiError> {
        match self.managed_ruleset(id) {
            Some(_) => Err(ApiError::Forbidden(format!(
                "Ruleset {} is a managed ruleset and cannot be modified",
                id
            ))),
            None => Ok(()),
        }
    }

    /// Latest version of `id`, falling back to the managed catalog
    pub async fn find_ruleset(&self, scope: &ScopeKey, id: &str) -> Result<RulesetDetails, ApiError> {
        if let Some(ruleset) = self.storage.get_latest(scope, id).await? {
            return Ok(ruleset);
        }
        self.managed_ruleset(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Ruleset {} not found", id)))
    }

    /// The entrypoint ruleset of `phase` in `scope`, if it was ever written
    pub async fn find_entrypoint(
        &self,
        scope: &ScopeKey,
        phase: RulesetPhase,
    ) -> Result<Option<RulesetDetails>, ApiError> {
        let kind = entrypoint_kind(scope);
        Ok(self
            .storage
            .list_latest(scope)
            .await?
            .into_iter()
            .find(|r| {
                r.kind.as_deref() == Some(kind.as_str())
                    && r.phase.as_deref() == Some(phase.as_str())
            }))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Entrypoints are `root` rulesets at account scope and `zone` rulesets at zone scope.
pub fn entrypoint_kind(scope: &ScopeKey) -> RulesetKind {
    if scope.is_zone() {
        RulesetKind::Zone
    } else {
        RulesetKind::Root
    }
}

fn managed_rule(id: &str, description: &str, categories: &[&str]) -> RuleDetails {
    RuleDetails {
        id: Some(id.to_string()),
        version: Some("1".to_string()),
        action: Some("block".to_string()),
        categories: Some(categories.iter().map(|c| c.to_string()).collect()),
        enabled: Some(true),
        description: Some(description.to_string()),
        expression: Some("true".to_string()),
        last_updated: Some("2024-01-01T00:00:00.000Z".to_string()),
        ..RuleDetails::default()
    }
}

fn seed_managed_ruleset() -> RulesetDetails {
    RulesetDetails {
        id: Some(MANAGED_RULESET_ID.to_string()),
        name: Some("CIS Managed Ruleset".to_string()),
        description: Some("Managed rules maintained by the service".to_string()),
        kind: Some(RulesetKind::Managed.to_string()),
        phase: Some(RulesetPhase::HttpRequestFirewallManaged.to_string()),
        version: Some("1".to_string()),
        last_updated: Some("2024-01-01T00:00:00.000Z".to_string()),
        rules: Some(vec![
            managed_rule(
                "5de7edfa648c4d6891dc3e7f84534ffa",
                "WordPress - Broken Access Control",
                &["wordpress", "broken-access-control"],
            ),
            managed_rule(
                "e3a567afc347477d9702d9047e97d760",
                "SQLi - Common Patterns",
                &["sqli"],
            ),
            managed_rule(
                "9b2c79f0f9f24f0ea3a7cb06c3b0f2c2",
                "XSS - HTML Injection",
                &["xss"],
            ),
        ]),
    }
}
