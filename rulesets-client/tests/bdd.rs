//! BDD Test Harness for the rulesets client
//!
//! Run with: cargo test --test bdd
//!
//! Every scenario starts its own emulator on an ephemeral port.

use cucumber::{given, then, when, World};
use rulesets_client::{NoAuthAuthenticator, RulesetsError, RulesetsV1, RulesetsV1Options};
use rulesets_core::{
    CreateRulesetRuleOptions, DeleteRulesetVersionOptions, GetRulesetOptions,
    GetRulesetVersionByTagOptions, Position, RuleCreate, RulesetDetails,
    UpdateEntrypointRulesetOptions, UpdateRulesetRuleOptions,
};
use rulesets_emulator::state::MANAGED_RULESET_ID;
use rulesets_emulator::{create_router, AppState};
use std::sync::Arc;

const CRN: &str = "crn:v1:bluemix:public:internet-svcs:global:a/bdd::";
const ZONE: &str = "bddzone";

/// World state shared across steps
#[derive(Debug, Default, World)]
pub struct RulesetsWorld {
    client: Option<RulesetsV1>,

    /// Ruleset returned by the last successful call
    ruleset: Option<RulesetDetails>,

    /// Error of the last failed call
    error: Option<RulesetsError>,
}

impl RulesetsWorld {
    fn client(&self) -> &RulesetsV1 {
        self.client.as_ref().expect("emulator was not started")
    }

    fn ruleset(&self) -> &RulesetDetails {
        self.ruleset.as_ref().expect("no ruleset was returned")
    }

    fn ruleset_id(&self) -> String {
        self.ruleset().id.clone().expect("ruleset has no id")
    }

    fn rule_id(&self, position: usize) -> String {
        self.ruleset().rules()[position - 1]
            .id
            .clone()
            .expect("rule has no id")
    }

    fn record(&mut self, result: Result<Option<RulesetDetails>, RulesetsError>) {
        match result {
            Ok(ruleset) => {
                self.ruleset = ruleset;
                self.error = None;
            }
            Err(err) => self.error = Some(err),
        }
    }
}

// ==================== GIVEN Steps ====================

#[given("a running rulesets emulator")]
async fn emulator_is_running(world: &mut RulesetsWorld) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind emulator");
    let addr = listener.local_addr().expect("No local address");
    let app = create_router(Arc::new(AppState::new()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Emulator stopped");
    });

    let client = RulesetsV1::new(
        RulesetsV1Options::new(CRN, ZONE)
            .with_url(format!("http://{}", addr))
            .with_authenticator(Arc::new(NoAuthAuthenticator)),
    )
    .expect("Failed to build client");
    world.client = Some(client);
}

#[given(expr = "the account entrypoint for phase {string} has a {string} rule")]
async fn account_entrypoint_exists(world: &mut RulesetsWorld, phase: String, action: String) {
    put_account_entrypoint(world, phase, action).await;
    assert!(world.error.is_none(), "setup failed: {:?}", world.error);
}

// ==================== WHEN Steps ====================

#[when(expr = "I update the account entrypoint for phase {string} with a {string} rule")]
async fn update_account_entrypoint(world: &mut RulesetsWorld, phase: String, action: String) {
    put_account_entrypoint(world, phase, action).await;
}

#[when(expr = "I update the zone entrypoint for phase {string} with a {string} rule")]
async fn update_zone_entrypoint(world: &mut RulesetsWorld, phase: String, action: String) {
    let options = UpdateEntrypointRulesetOptions::new(phase)
        .with_rules(vec![RuleCreate::new(action, "true")]);
    let result = world
        .client()
        .update_zone_entrypoint_ruleset(&options)
        .await
        .map(|r| r.result.map(|e| e.result));
    world.record(result);
}

#[when(expr = "I add a {string} rule at index {int}")]
async fn add_rule(world: &mut RulesetsWorld, action: String, index: i64) {
    let options = CreateRulesetRuleOptions::new(world.ruleset_id())
        .with_action(action)
        .with_expression("true")
        .with_position(Position::index(index));
    let result = world
        .client()
        .create_account_ruleset_rule(&options)
        .await
        .map(|r| r.result.map(|e| e.result));
    world.record(result);
}

#[when(expr = "I disable rule {int}")]
async fn disable_rule(world: &mut RulesetsWorld, position: usize) {
    let options = UpdateRulesetRuleOptions::new(world.ruleset_id(), world.rule_id(position))
        .with_enabled(false);
    let result = world
        .client()
        .update_account_ruleset_rule(&options)
        .await
        .map(|r| r.result.map(|e| e.result));
    world.record(result);
}

#[when(expr = "I delete version {string} of the ruleset")]
async fn delete_version(world: &mut RulesetsWorld, version: String) {
    let options = DeleteRulesetVersionOptions::new(world.ruleset_id(), version);
    match world.client().delete_account_ruleset_version(&options).await {
        Ok(_) => world.error = None,
        Err(err) => world.error = Some(err),
    }
}

#[when(expr = "I fetch version {string} of the managed ruleset tagged {string}")]
async fn fetch_by_tag(world: &mut RulesetsWorld, version: String, tag: String) {
    let options = GetRulesetVersionByTagOptions::new(MANAGED_RULESET_ID, version, tag);
    let result = world
        .client()
        .get_account_ruleset_version_by_tag(&options)
        .await
        .map(|r| r.result.map(|e| e.result));
    world.record(result);
}

#[when("I fetch a ruleset without an id")]
async fn fetch_without_id(world: &mut RulesetsWorld) {
    let result = world
        .client()
        .get_account_ruleset(&GetRulesetOptions::default())
        .await
        .map(|r| r.result.map(|e| e.result));
    world.record(result);
}

// ==================== THEN Steps ====================

#[then(expr = "the ruleset kind should be {string}")]
async fn check_kind(world: &mut RulesetsWorld, kind: String) {
    assert_eq!(world.ruleset().kind.as_deref(), Some(kind.as_str()));
}

#[then(expr = "the ruleset version should be {string}")]
async fn check_version(world: &mut RulesetsWorld, version: String) {
    assert_eq!(world.ruleset().version.as_deref(), Some(version.as_str()));
}

#[then(expr = "the ruleset should have {int} rules")]
async fn check_rule_count(world: &mut RulesetsWorld, count: usize) {
    assert_eq!(world.ruleset().rules().len(), count);
}

#[then(expr = "rule {int} should have action {string}")]
async fn check_rule_action(world: &mut RulesetsWorld, position: usize, action: String) {
    let rule = &world.ruleset().rules()[position - 1];
    assert_eq!(rule.action.as_deref(), Some(action.as_str()));
}

#[then(expr = "rule {int} should be disabled")]
async fn check_rule_disabled(world: &mut RulesetsWorld, position: usize) {
    let rule = &world.ruleset().rules()[position - 1];
    assert_eq!(rule.enabled, Some(false));
}

#[then(expr = "the request should fail with status {int}")]
async fn check_failure_status(world: &mut RulesetsWorld, status: u16) {
    let err = world.error.as_ref().expect("request did not fail");
    assert_eq!(err.status_code(), Some(status));
}

#[then("the request should fail validation")]
async fn check_validation_failure(world: &mut RulesetsWorld) {
    let err = world.error.as_ref().expect("request did not fail");
    assert!(err.is_validation(), "unexpected error: {}", err);
}

// ==================== Helpers ====================

async fn put_account_entrypoint(world: &mut RulesetsWorld, phase: String, action: String) {
    let options = UpdateEntrypointRulesetOptions::new(phase)
        .with_rules(vec![RuleCreate::new(action, "true")]);
    let result = world
        .client()
        .update_account_entrypoint_ruleset(&options)
        .await
        .map(|r| r.result.map(|e| e.result));
    world.record(result);
}

// ==================== Main ====================

#[tokio::main]
async fn main() {
    RulesetsWorld::run("tests/features").await;
}
