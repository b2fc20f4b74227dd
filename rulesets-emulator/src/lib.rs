//! Rulesets API emulator
//!
//! In-memory server speaking the rulesets REST API at account and zone
//! scope. Used by the client's integration and BDD tests and runnable as a
//! standalone binary for local development.

pub mod error;
pub mod handlers;
pub mod rules;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, decompression::RequestDecompressionLayer,
    trace::TraceLayer,
};

const ACCOUNT_PREFIX: &str = "/v1/:crn/rulesets";
const ZONE_PREFIX: &str = "/v1/:crn/zones/:zone_identifier/rulesets";

/// Routes shared by both scopes, mounted under `prefix`
fn scoped_routes(router: Router<Arc<AppState>>, prefix: &str) -> Router<Arc<AppState>> {
    router
        // Rulesets
        .route(prefix, get(handlers::list_rulesets))
        .route(
            &format!("{prefix}/:ruleset_id"),
            get(handlers::get_ruleset)
                .put(handlers::update_ruleset)
                .delete(handlers::delete_ruleset),
        )
        // Versions
        .route(
            &format!("{prefix}/:ruleset_id/versions"),
            get(handlers::list_ruleset_versions),
        )
        .route(
            &format!("{prefix}/:ruleset_id/versions/:ruleset_version"),
            get(handlers::get_ruleset_version).delete(handlers::delete_ruleset_version),
        )
        // Entrypoints
        .route(
            &format!("{prefix}/phases/:ruleset_phase/entrypoint"),
            get(handlers::get_entrypoint_ruleset).put(handlers::update_entrypoint_ruleset),
        )
        .route(
            &format!("{prefix}/phases/:ruleset_phase/entrypoint/versions"),
            get(handlers::list_entrypoint_ruleset_versions),
        )
        .route(
            &format!("{prefix}/phases/:ruleset_phase/entrypoint/versions/:ruleset_version"),
            get(handlers::get_entrypoint_ruleset_version),
        )
        // Rules
        .route(
            &format!("{prefix}/:ruleset_id/rules"),
            post(handlers::create_ruleset_rule),
        )
        .route(
            &format!("{prefix}/:ruleset_id/rules/:rule_id"),
            patch(handlers::update_ruleset_rule).delete(handlers::delete_ruleset_rule),
        )
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let router = Router::new().route("/health", get(handlers::health_check));
    let router = scoped_routes(router, ACCOUNT_PREFIX);
    let router = scoped_routes(router, ZONE_PREFIX);

    router
        // Tag lookup is only offered at account scope
        .route(
            &format!("{ACCOUNT_PREFIX}/:ruleset_id/versions/:ruleset_version/by_tag/:rule_tag"),
            get(handlers::get_ruleset_version_by_tag),
        )
        // Middleware
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
