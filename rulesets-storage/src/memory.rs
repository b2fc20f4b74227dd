//! In-memory storage implementation for the emulator and tests

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rulesets_core::RulesetDetails;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::{RulesetStorage, ScopeKey, StorageError};

/// ruleset id -> versions, oldest first
type VersionHistory = BTreeMap<String, Vec<RulesetDetails>>;

/// In-memory storage for development and testing
pub struct InMemoryStorage {
    scopes: RwLock<HashMap<ScopeKey, VersionHistory>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn version_number(ruleset: &RulesetDetails) -> u64 {
    ruleset
        .version
        .as_deref()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Assign `version` to the ruleset and to rules that have none yet.
fn stamp(mut ruleset: RulesetDetails, version: u64) -> RulesetDetails {
    let version = version.to_string();
    let timestamp = now();
    if let Some(rules) = ruleset.rules.as_mut() {
        for rule in rules.iter_mut().filter(|r| r.version.is_none()) {
            rule.version = Some(version.clone());
            rule.last_updated = Some(timestamp.clone());
        }
    }
    ruleset.version = Some(version);
    ruleset.last_updated = Some(timestamp);
    ruleset
}

fn ruleset_id(ruleset: &RulesetDetails) -> Result<String, StorageError> {
    ruleset
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StorageError::Internal("ruleset has no id".to_string()))
}

#[async_trait]
impl RulesetStorage for InMemoryStorage {
    async fn create(
        &self,
        scope: &ScopeKey,
        ruleset: RulesetDetails,
    ) -> Result<RulesetDetails, StorageError> {
        let id = ruleset_id(&ruleset)?;
        let mut scopes = self.scopes.write().await;
        let history = scopes.entry(scope.clone()).or_default();

        if history.contains_key(&id) {
            return Err(StorageError::AlreadyExists(format!(
                "Ruleset {} already exists in {}",
                id, scope
            )));
        }

        let saved = stamp(ruleset, 1);
        history.insert(id, vec![saved.clone()]);
        Ok(saved)
    }

    async fn save_version(
        &self,
        scope: &ScopeKey,
        ruleset: RulesetDetails,
    ) -> Result<RulesetDetails, StorageError> {
        let id = ruleset_id(&ruleset)?;
        let mut scopes = self.scopes.write().await;
        let versions = scopes
            .get_mut(scope)
            .and_then(|history| history.get_mut(&id))
            .ok_or_else(|| StorageError::NotFound(format!("Ruleset {} not found", id)))?;

        let next = versions.last().map(version_number).unwrap_or(0) + 1;
        let saved = stamp(ruleset, next);
        versions.push(saved.clone());

        tracing::debug!(scope = %scope, id = %id, version = next, "Saved ruleset version");
        Ok(saved)
    }

    async fn get_latest(
        &self,
        scope: &ScopeKey,
        id: &str,
    ) -> Result<Option<RulesetDetails>, StorageError> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .and_then(|history| history.get(id))
            .and_then(|versions| versions.last())
            .cloned())
    }

    async fn get_version(
        &self,
        scope: &ScopeKey,
        id: &str,
        version: &str,
    ) -> Result<Option<RulesetDetails>, StorageError> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .and_then(|history| history.get(id))
            .and_then(|versions| {
                versions
                    .iter()
                    .find(|v| v.version.as_deref() == Some(version))
            })
            .cloned())
    }

    async fn list_versions(
        &self,
        scope: &ScopeKey,
        id: &str,
    ) -> Result<Vec<RulesetDetails>, StorageError> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .and_then(|history| history.get(id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_latest(&self, scope: &ScopeKey) -> Result<Vec<RulesetDetails>, StorageError> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .map(|history| {
                history
                    .values()
                    .filter_map(|versions| versions.last().cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, scope: &ScopeKey, id: &str) -> Result<(), StorageError> {
        let mut scopes = self.scopes.write().await;
        match scopes.get_mut(scope).and_then(|history| history.remove(id)) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!("Ruleset {} not found", id))),
        }
    }

    async fn delete_version(
        &self,
        scope: &ScopeKey,
        id: &str,
        version: &str,
    ) -> Result<(), StorageError> {
        let mut scopes = self.scopes.write().await;
        let versions = scopes
            .get_mut(scope)
            .and_then(|history| history.get_mut(id))
            .ok_or_else(|| StorageError::NotFound(format!("Ruleset {} not found", id)))?;

        let position = versions
            .iter()
            .position(|v| v.version.as_deref() == Some(version))
            .ok_or_else(|| {
                StorageError::NotFound(format!("Ruleset {} version {} not found", id, version))
            })?;

        if position == versions.len() - 1 {
            return Err(StorageError::InvalidOperation(format!(
                "Version {} is the latest version of ruleset {} and cannot be deleted",
                version, id
            )));
        }

        versions.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulesets_core::RuleDetails;

    fn account() -> ScopeKey {
        ScopeKey::Account {
            crn: "crn:v1:test".to_string(),
        }
    }

    fn ruleset(id: &str) -> RulesetDetails {
        RulesetDetails {
            id: Some(id.to_string()),
            name: Some("test".to_string()),
            rules: Some(vec![RuleDetails {
                id: Some("r1".to_string()),
                ..RuleDetails::default()
            }]),
            ..RulesetDetails::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_ruleset() {
        let storage = InMemoryStorage::new();
        let saved = storage.create(&account(), ruleset("rs1")).await.unwrap();
        assert_eq!(saved.version.as_deref(), Some("1"));
        assert_eq!(saved.rules()[0].version.as_deref(), Some("1"));
        assert!(saved.last_updated.is_some());

        let retrieved = storage.get_latest(&account(), "rs1").await.unwrap().unwrap();
        assert_eq!(retrieved, saved);

        assert!(storage.create(&account(), ruleset("rs1")).await.is_err());
    }

    #[tokio::test]
    async fn test_version_management() {
        let storage = InMemoryStorage::new();
        let v1 = storage.create(&account(), ruleset("rs1")).await.unwrap();

        let mut next = v1.clone();
        next.description = Some("second".to_string());
        next.rules.as_mut().unwrap().push(RuleDetails {
            id: Some("r2".to_string()),
            ..RuleDetails::default()
        });
        let v2 = storage.save_version(&account(), next).await.unwrap();
        assert_eq!(v2.version.as_deref(), Some("2"));
        // untouched rules keep their version
        assert_eq!(v2.rules()[0].version.as_deref(), Some("1"));
        assert_eq!(v2.rules()[1].version.as_deref(), Some("2"));

        let versions = storage.list_versions(&account(), "rs1").await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version.as_deref(), Some("1"));

        let old = storage.get_version(&account(), "rs1", "1").await.unwrap().unwrap();
        assert!(old.description.is_none());
    }

    #[tokio::test]
    async fn test_latest_version_cannot_be_deleted() {
        let storage = InMemoryStorage::new();
        let v1 = storage.create(&account(), ruleset("rs1")).await.unwrap();
        storage.save_version(&account(), v1).await.unwrap();

        let err = storage.delete_version(&account(), "rs1", "2").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidOperation(_)));

        storage.delete_version(&account(), "rs1", "1").await.unwrap();
        assert!(storage.get_version(&account(), "rs1", "1").await.unwrap().is_none());
        assert!(matches!(
            storage.delete_version(&account(), "rs1", "1").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let storage = InMemoryStorage::new();
        let zone = ScopeKey::Zone {
            crn: "crn:v1:test".to_string(),
            zone: "z1".to_string(),
        };
        storage.create(&zone, ruleset("rs1")).await.unwrap();

        assert!(storage.get_latest(&account(), "rs1").await.unwrap().is_none());
        assert!(storage.list_latest(&account()).await.unwrap().is_empty());
        assert_eq!(storage.list_latest(&zone).await.unwrap().len(), 1);

        storage.delete(&zone, "rs1").await.unwrap();
        assert!(storage.delete(&zone, "rs1").await.is_err());
    }
}
