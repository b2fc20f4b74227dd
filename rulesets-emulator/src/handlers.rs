//! API request handlers
//!
//! Every handler serves both scopes; the zone scope is selected when the route
//! carries a zone identifier.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rulesets_core::{
    Envelope, RuleCreate, RuleResp, RulesetBody, RulesetDetails, RulesetPhase, RulesetResp,
};
use rulesets_storage::ScopeKey;
use serde::Deserialize;
use std::sync::Arc;

use crate::rules;
use crate::state::entrypoint_kind;
use crate::{ApiError, AppState};

/// Path parameters of every rulesets route
#[derive(Debug, Deserialize)]
pub struct RulesetPath {
    pub crn: String,
    pub zone_identifier: Option<String>,
    pub ruleset_id: Option<String>,
    pub ruleset_version: Option<String>,
    pub rule_id: Option<String>,
    pub rule_tag: Option<String>,
    pub ruleset_phase: Option<String>,
}

impl RulesetPath {
    fn scope(&self) -> ScopeKey {
        match &self.zone_identifier {
            Some(zone) => ScopeKey::Zone {
                crn: self.crn.clone(),
                zone: zone.clone(),
            },
            None => ScopeKey::Account {
                crn: self.crn.clone(),
            },
        }
    }

    fn ruleset_id(&self) -> &str {
        self.ruleset_id.as_deref().unwrap_or_default()
    }

    fn version(&self) -> &str {
        self.ruleset_version.as_deref().unwrap_or_default()
    }

    fn rule_id(&self) -> &str {
        self.rule_id.as_deref().unwrap_or_default()
    }

    fn phase(&self) -> Result<RulesetPhase, ApiError> {
        Ok(self.ruleset_phase.as_deref().unwrap_or_default().parse()?)
    }
}

/// Copy the fields present in `body` onto `ruleset`; rules are replaced wholesale.
fn apply_body(ruleset: &mut RulesetDetails, body: RulesetBody) {
    if body.description.is_some() {
        ruleset.description = body.description;
    }
    if body.kind.is_some() {
        ruleset.kind = body.kind;
    }
    if body.name.is_some() {
        ruleset.name = body.name;
    }
    if body.phase.is_some() {
        ruleset.phase = body.phase;
    }
    if let Some(rules) = body.rules {
        ruleset.rules = Some(rules.into_iter().map(rules::rule_from_create).collect());
    }
}

/// A ruleset's kind and phase pin it to its entrypoint slot and cannot change.
fn ensure_same_identity(ruleset: &RulesetDetails, body: &RulesetBody) -> Result<(), ApiError> {
    let changed = |stored: &Option<String>, requested: &Option<String>| {
        requested.is_some() && requested != stored
    };
    if changed(&ruleset.kind, &body.kind) {
        return Err(ApiError::BadRequest(format!(
            "Ruleset kind cannot be changed from {}",
            ruleset.kind.as_deref().unwrap_or_default()
        )));
    }
    if changed(&ruleset.phase, &body.phase) {
        return Err(ApiError::BadRequest(format!(
            "Ruleset phase cannot be changed from {}",
            ruleset.phase.as_deref().unwrap_or_default()
        )));
    }
    Ok(())
}

async fn versions_of(
    state: &AppState,
    scope: &ScopeKey,
    id: &str,
) -> Result<Vec<RulesetDetails>, ApiError> {
    let versions = state.storage.list_versions(scope, id).await?;
    if !versions.is_empty() {
        return Ok(versions);
    }
    state
        .managed_ruleset(id)
        .map(|r| vec![r.clone()])
        .ok_or_else(|| ApiError::NotFound(format!("Ruleset {} not found", id)))
}

async fn version_of(
    state: &AppState,
    scope: &ScopeKey,
    id: &str,
    version: &str,
) -> Result<RulesetDetails, ApiError> {
    if let Some(ruleset) = state.storage.get_version(scope, id, version).await? {
        return Ok(ruleset);
    }
    versions_of(state, scope, id)
        .await?
        .into_iter()
        .find(|r| r.version.as_deref() == Some(version))
        .ok_or_else(|| {
            ApiError::NotFound(format!("Ruleset {} version {} not found", id, version))
        })
}

/// Latest stored (writable) version of a ruleset
async fn writable_ruleset(
    state: &AppState,
    scope: &ScopeKey,
    id: &str,
) -> Result<RulesetDetails, ApiError> {
    state.ensure_writable(id)?;
    state
        .storage
        .get_latest(scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Ruleset {} not found", id)))
}

// ==================== Ruleset Handlers ====================

/// List the latest version of every ruleset visible in the scope
pub async fn list_rulesets(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let mut listed: Vec<_> = state
        .storage
        .list_latest(&path.scope())
        .await?
        .iter()
        .map(RulesetDetails::to_listed)
        .collect();
    listed.extend(state.managed.iter().map(RulesetDetails::to_listed));
    Ok(Json(Envelope::ok(listed)))
}

pub async fn get_ruleset(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let ruleset = state.find_ruleset(&path.scope(), path.ruleset_id()).await?;
    Ok(Json(RulesetResp::ok(ruleset)))
}

/// Replace a ruleset, producing a new version
pub async fn update_ruleset(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
    Json(body): Json<RulesetBody>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = path.scope();
    let mut ruleset = writable_ruleset(&state, &scope, path.ruleset_id()).await?;
    ensure_same_identity(&ruleset, &body)?;
    apply_body(&mut ruleset, body);

    let saved = state.storage.save_version(&scope, ruleset).await?;
    tracing::info!(
        scope = %scope,
        id = path.ruleset_id(),
        version = saved.version.as_deref().unwrap_or_default(),
        "Updated ruleset"
    );
    Ok(Json(RulesetResp::ok(saved)))
}

pub async fn delete_ruleset(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = path.scope();
    state.ensure_writable(path.ruleset_id())?;
    state.storage.delete(&scope, path.ruleset_id()).await?;
    tracing::info!(scope = %scope, id = path.ruleset_id(), "Deleted ruleset");
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Version Handlers ====================

pub async fn list_ruleset_versions(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let versions = versions_of(&state, &path.scope(), path.ruleset_id()).await?;
    let listed: Vec<_> = versions.iter().map(RulesetDetails::to_listed).collect();
    Ok(Json(Envelope::ok(listed)))
}

pub async fn get_ruleset_version(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let ruleset = version_of(&state, &path.scope(), path.ruleset_id(), path.version()).await?;
    Ok(Json(RulesetResp::ok(ruleset)))
}

pub async fn delete_ruleset_version(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = path.scope();
    state.ensure_writable(path.ruleset_id())?;
    state
        .storage
        .delete_version(&scope, path.ruleset_id(), path.version())
        .await?;
    tracing::info!(
        scope = %scope,
        id = path.ruleset_id(),
        version = path.version(),
        "Deleted ruleset version"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Rules of a ruleset version carrying a category tag
pub async fn get_ruleset_version_by_tag(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let ruleset = version_of(&state, &path.scope(), path.ruleset_id(), path.version()).await?;
    let tag = path.rule_tag.as_deref().unwrap_or_default();
    Ok(Json(RulesetResp::ok(rules::filter_by_tag(&ruleset, tag))))
}

// ==================== Entrypoint Handlers ====================

async fn entrypoint_id(state: &AppState, path: &RulesetPath) -> Result<String, ApiError> {
    let phase = path.phase()?;
    state
        .find_entrypoint(&path.scope(), phase)
        .await?
        .and_then(|r| r.id)
        .ok_or_else(|| ApiError::NotFound(format!("No entrypoint ruleset for phase {}", phase)))
}

pub async fn get_entrypoint_ruleset(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let id = entrypoint_id(&state, &path).await?;
    let ruleset = state.find_ruleset(&path.scope(), &id).await?;
    Ok(Json(RulesetResp::ok(ruleset)))
}

/// Replace the entrypoint of a phase, creating it on first use
pub async fn update_entrypoint_ruleset(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
    Json(body): Json<RulesetBody>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = path.scope();
    let phase = path.phase()?;
    let kind = entrypoint_kind(&scope);

    let saved = match state.find_entrypoint(&scope, phase).await? {
        Some(mut ruleset) => {
            apply_body(&mut ruleset, body);
            ruleset.kind = Some(kind.to_string());
            ruleset.phase = Some(phase.to_string());
            state.storage.save_version(&scope, ruleset).await?
        }
        None => {
            let mut ruleset = RulesetDetails {
                id: Some(rules::new_id()),
                name: Some("default".to_string()),
                rules: Some(Vec::new()),
                ..RulesetDetails::default()
            };
            apply_body(&mut ruleset, body);
            ruleset.kind = Some(kind.to_string());
            ruleset.phase = Some(phase.to_string());
            state.storage.create(&scope, ruleset).await?
        }
    };

    tracing::info!(
        scope = %scope,
        phase = %phase,
        version = saved.version.as_deref().unwrap_or_default(),
        "Updated entrypoint ruleset"
    );
    Ok(Json(RulesetResp::ok(saved)))
}

pub async fn list_entrypoint_ruleset_versions(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let id = entrypoint_id(&state, &path).await?;
    let versions = versions_of(&state, &path.scope(), &id).await?;
    let listed: Vec<_> = versions.iter().map(RulesetDetails::to_listed).collect();
    Ok(Json(Envelope::ok(listed)))
}

pub async fn get_entrypoint_ruleset_version(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let id = entrypoint_id(&state, &path).await?;
    let ruleset = version_of(&state, &path.scope(), &id, path.version()).await?;
    Ok(Json(RulesetResp::ok(ruleset)))
}

// ==================== Rule Handlers ====================

/// Add a rule to a ruleset
pub async fn create_ruleset_rule(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
    Json(rule): Json<RuleCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = path.scope();
    let mut ruleset = writable_ruleset(&state, &scope, path.ruleset_id()).await?;
    let rule_id = rules::add_rule(&mut ruleset, rule)?;

    let saved = state.storage.save_version(&scope, ruleset).await?;
    tracing::info!(scope = %scope, id = path.ruleset_id(), rule = %rule_id, "Created rule");
    Ok(Json(RulesetResp::ok(saved)))
}

pub async fn update_ruleset_rule(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
    Json(patch): Json<RuleCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = path.scope();
    let mut ruleset = writable_ruleset(&state, &scope, path.ruleset_id()).await?;
    rules::update_rule(&mut ruleset, path.rule_id(), patch)?;

    let saved = state.storage.save_version(&scope, ruleset).await?;
    tracing::info!(scope = %scope, id = path.ruleset_id(), rule = path.rule_id(), "Updated rule");
    Ok(Json(RulesetResp::ok(saved)))
}

/// Remove a rule; the response carries the removed rule
pub async fn delete_ruleset_rule(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RulesetPath>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = path.scope();
    let mut ruleset = writable_ruleset(&state, &scope, path.ruleset_id()).await?;
    let removed = rules::remove_rule(&mut ruleset, path.rule_id())?;

    state.storage.save_version(&scope, ruleset).await?;
    tracing::info!(scope = %scope, id = path.ruleset_id(), rule = path.rule_id(), "Deleted rule");
    Ok(Json(RuleResp::ok(removed)))
}

// ==================== Health Check ====================

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "rulesets-emulator"
    }))
}
