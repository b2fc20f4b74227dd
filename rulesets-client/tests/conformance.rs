//! Request/response conformance of every rulesets operation against a mock server

use rstest::rstest;
use rulesets_client::{
    NoAuthAuthenticator, RetryPolicy, RulesetsError, RulesetsV1, RulesetsV1Options,
};
use rulesets_core::{
    CreateRulesetRuleOptions, DeleteRulesetOptions, DeleteRulesetRuleOptions,
    DeleteRulesetVersionOptions, GetEntrypointRulesetOptions, GetEntrypointRulesetVersionOptions,
    GetRulesetOptions, GetRulesetVersionByTagOptions, GetRulesetVersionOptions,
    ListEntrypointRulesetVersionsOptions, ListRulesetVersionsOptions, ListRulesetsOptions,
    Logging, Position, RuleCreate, UpdateEntrypointRulesetOptions, UpdateRulesetOptions,
    UpdateRulesetRuleOptions,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CRN: &str = "testString";
const ZONE: &str = "testZone";
const RULESET_ID: &str = "testRulesetId";
const VERSION: &str = "1";
const RULE_ID: &str = "testRuleId";
const TAG: &str = "wordpress";
const PHASE: &str = "http_request_firewall_custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    ListRulesets,
    GetRuleset,
    UpdateRuleset,
    DeleteRuleset,
    ListVersions,
    GetVersion,
    DeleteVersion,
    GetVersionByTag,
    GetEntrypoint,
    UpdateEntrypoint,
    ListEntrypointVersions,
    GetEntrypointVersion,
    CreateRule,
    UpdateRule,
    DeleteRule,
}

const CALLS: [Call; 15] = [
    Call::ListRulesets,
    Call::GetRuleset,
    Call::UpdateRuleset,
    Call::DeleteRuleset,
    Call::ListVersions,
    Call::GetVersion,
    Call::DeleteVersion,
    Call::GetVersionByTag,
    Call::GetEntrypoint,
    Call::UpdateEntrypoint,
    Call::ListEntrypointVersions,
    Call::GetEntrypointVersion,
    Call::CreateRule,
    Call::UpdateRule,
    Call::DeleteRule,
];

/// One operation at one scope
#[derive(Debug, Clone, Copy)]
struct Op {
    zone: bool,
    call: Call,
}

impl Op {
    /// Every operation the client exposes
    fn all() -> Vec<Op> {
        let account = CALLS.iter().map(|&call| Op { zone: false, call });
        let zone = CALLS
            .iter()
            .filter(|&&call| call != Call::GetVersionByTag)
            .map(|&call| Op { zone: true, call });
        account.chain(zone).collect()
    }

    fn scope(zone: bool) -> Vec<Op> {
        Self::all().into_iter().filter(|op| op.zone == zone).collect()
    }

    fn method(&self) -> &'static str {
        match self.call {
            Call::UpdateRuleset | Call::UpdateEntrypoint => "PUT",
            Call::DeleteRuleset | Call::DeleteVersion | Call::DeleteRule => "DELETE",
            Call::CreateRule => "POST",
            Call::UpdateRule => "PATCH",
            _ => "GET",
        }
    }

    fn path(&self) -> String {
        let prefix = if self.zone {
            format!("/v1/{CRN}/zones/{ZONE}/rulesets")
        } else {
            format!("/v1/{CRN}/rulesets")
        };
        let suffix = match self.call {
            Call::ListRulesets => String::new(),
            Call::GetRuleset | Call::UpdateRuleset | Call::DeleteRuleset => format!("/{RULESET_ID}"),
            Call::ListVersions => format!("/{RULESET_ID}/versions"),
            Call::GetVersion | Call::DeleteVersion => format!("/{RULESET_ID}/versions/{VERSION}"),
            Call::GetVersionByTag => format!("/{RULESET_ID}/versions/{VERSION}/by_tag/{TAG}"),
            Call::GetEntrypoint | Call::UpdateEntrypoint => format!("/phases/{PHASE}/entrypoint"),
            Call::ListEntrypointVersions => format!("/phases/{PHASE}/entrypoint/versions"),
            Call::GetEntrypointVersion => format!("/phases/{PHASE}/entrypoint/versions/{VERSION}"),
            Call::CreateRule => format!("/{RULESET_ID}/rules"),
            Call::UpdateRule | Call::DeleteRule => format!("/{RULESET_ID}/rules/{RULE_ID}"),
        };
        prefix + &suffix
    }

    /// List operations have no required parameters
    fn has_required_params(&self) -> bool {
        self.call != Call::ListRulesets
    }

    /// Deletes of rulesets and versions discard the response body
    fn has_result(&self) -> bool {
        !matches!(self.call, Call::DeleteRuleset | Call::DeleteVersion)
    }

    fn expected_body(&self) -> Option<Value> {
        match self.call {
            Call::UpdateRuleset | Call::UpdateEntrypoint => Some(json!({
                "description": "Custom rules",
                "kind": "custom",
                "name": "testset",
                "phase": PHASE,
                "rules": [rule_json()],
            })),
            Call::CreateRule | Call::UpdateRule => Some(rule_json()),
            _ => None,
        }
    }

    fn sample_response(&self) -> Value {
        let result = match self.call {
            Call::ListRulesets | Call::ListVersions | Call::ListEntrypointVersions => json!([
                { "id": RULESET_ID, "version": VERSION, "kind": "custom", "phase": PHASE, "name": "testset" }
            ]),
            Call::DeleteRule => json!({ "id": RULE_ID, "version": VERSION, "action": "block" }),
            _ => json!({ "id": RULESET_ID, "version": VERSION, "kind": "custom", "phase": PHASE, "rules": [] }),
        };
        json!({ "success": true, "errors": [], "messages": [], "result": result })
    }

    /// Run the operation; `empty` sends default options. Returns whether a result was produced.
    async fn call(&self, client: &RulesetsV1, empty: bool) -> Result<bool, RulesetsError> {
        macro_rules! run {
            ($account:ident, $zone:ident, $options:expr) => {{
                let options = if empty { Default::default() } else { $options };
                if self.zone {
                    client.$zone(&options).await.map(|r| r.result.is_some())
                } else {
                    client.$account(&options).await.map(|r| r.result.is_some())
                }
            }};
        }

        match self.call {
            Call::ListRulesets => run!(
                get_account_rulesets,
                get_zone_rulesets,
                ListRulesetsOptions::new()
            ),
            Call::GetRuleset => run!(
                get_account_ruleset,
                get_zone_ruleset,
                GetRulesetOptions::new(RULESET_ID)
            ),
            Call::UpdateRuleset => run!(
                update_account_ruleset,
                update_zone_ruleset,
                UpdateRulesetOptions::new(RULESET_ID)
                    .with_description("Custom rules")
                    .with_kind("custom")
                    .with_name("testset")
                    .with_phase(PHASE)
                    .with_rules(vec![rule()])
            ),
            Call::DeleteRuleset => run!(
                delete_account_ruleset,
                delete_zone_ruleset,
                DeleteRulesetOptions::new(RULESET_ID)
            ),
            Call::ListVersions => run!(
                get_account_ruleset_versions,
                get_zone_ruleset_versions,
                ListRulesetVersionsOptions::new(RULESET_ID)
            ),
            Call::GetVersion => run!(
                get_account_ruleset_version,
                get_zone_ruleset_version,
                GetRulesetVersionOptions::new(RULESET_ID, VERSION)
            ),
            Call::DeleteVersion => run!(
                delete_account_ruleset_version,
                delete_zone_ruleset_version,
                DeleteRulesetVersionOptions::new(RULESET_ID, VERSION)
            ),
            Call::GetVersionByTag => {
                let options = if empty {
                    GetRulesetVersionByTagOptions::default()
                } else {
                    GetRulesetVersionByTagOptions::new(RULESET_ID, VERSION, TAG)
                };
                client
                    .get_account_ruleset_version_by_tag(&options)
                    .await
                    .map(|r| r.result.is_some())
            }
            Call::GetEntrypoint => run!(
                get_account_entrypoint_ruleset,
                get_zone_entrypoint_ruleset,
                GetEntrypointRulesetOptions::new(PHASE)
            ),
            Call::UpdateEntrypoint => run!(
                update_account_entrypoint_ruleset,
                update_zone_entrypoint_ruleset,
                UpdateEntrypointRulesetOptions::new(PHASE)
                    .with_description("Custom rules")
                    .with_kind("custom")
                    .with_name("testset")
                    .with_phase(PHASE)
                    .with_rules(vec![rule()])
            ),
            Call::ListEntrypointVersions => run!(
                get_account_entry_point_ruleset_versions,
                get_zone_entry_point_ruleset_versions,
                ListEntrypointRulesetVersionsOptions::new(PHASE)
            ),
            Call::GetEntrypointVersion => run!(
                get_account_entry_point_ruleset_version,
                get_zone_entry_point_ruleset_version,
                GetEntrypointRulesetVersionOptions::new(PHASE, VERSION)
            ),
            Call::CreateRule => run!(
                create_account_ruleset_rule,
                create_zone_ruleset_rule,
                CreateRulesetRuleOptions::new(RULESET_ID).with_rule(rule())
            ),
            Call::UpdateRule => run!(
                update_account_ruleset_rule,
                update_zone_ruleset_rule,
                UpdateRulesetRuleOptions::new(RULESET_ID, RULE_ID).with_rule(rule())
            ),
            Call::DeleteRule => run!(
                delete_account_ruleset_rule,
                delete_zone_ruleset_rule,
                DeleteRulesetRuleOptions::new(RULESET_ID, RULE_ID)
            ),
        }
    }
}

fn rule() -> RuleCreate {
    RuleCreate::new("block", "ip.src eq 1.1.1.1")
        .with_description("block one address")
        .with_enabled(true)
        .with_logging(Logging::enabled(true))
        .with_position(Position::index(1))
}

fn rule_json() -> Value {
    json!({
        "action": "block",
        "expression": "ip.src eq 1.1.1.1",
        "description": "block one address",
        "enabled": true,
        "logging": { "enabled": true },
        "position": { "index": 1 }
    })
}

fn client(server: &MockServer, retries: bool) -> RulesetsV1 {
    let mut client = RulesetsV1::new(
        RulesetsV1Options::new(CRN, ZONE)
            .with_url(server.uri())
            .with_authenticator(Arc::new(NoAuthAuthenticator)),
    )
    .unwrap();
    if retries {
        client.enable_retries_with_policy(RetryPolicy {
            max_retries: 3,
            min_retry_interval: Duration::from_millis(10),
            max_retry_interval: Duration::from_millis(50),
        });
    }
    client
}

#[test]
fn test_every_operation_is_covered() {
    assert_eq!(Op::all().len(), 29);
}

#[rstest]
#[case::account(false)]
#[case::zone(true)]
#[tokio::test]
async fn test_empty_options_fail_before_sending(#[case] zone: bool) {
    let server = MockServer::start().await;
    let client = client(&server, false);

    for op in Op::scope(zone).into_iter().filter(Op::has_required_params) {
        let err = op.call(&client, true).await.unwrap_err();
        assert!(err.is_validation(), "{:?}: {}", op, err);
    }

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[rstest]
#[case::account(false)]
#[case::zone(true)]
#[tokio::test]
async fn test_requests_reach_expected_endpoint(#[case] zone: bool) {
    for op in Op::scope(zone) {
        let server = MockServer::start().await;
        let mut mock = Mock::given(method(op.method())).and(path(op.path()));
        if let Some(body) = op.expected_body() {
            mock = mock.and(body_json(body));
        }
        mock.respond_with(ResponseTemplate::new(200).set_body_json(op.sample_response()))
            .expect(1)
            .mount(&server)
            .await;

        let has_result = op
            .call(&client(&server, false), false)
            .await
            .unwrap_or_else(|e| panic!("{:?}: {}", op, e));
        assert_eq!(has_result, op.has_result(), "{:?}", op);

        server.verify().await;
    }
}

#[rstest]
#[case::without_retries(false)]
#[case::with_retries(true)]
#[tokio::test]
async fn test_invalid_json_is_a_processing_error(#[case] retries: bool) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string("this is not valid json"),
        )
        .mount(&server)
        .await;
    let client = client(&server, retries);

    for op in Op::all().into_iter().filter(Op::has_result) {
        let err = op.call(&client, false).await.unwrap_err();
        assert!(
            matches!(err, RulesetsError::ResponseProcessing { status_code: 200, .. }),
            "{:?}: {}",
            op,
            err
        );
    }
}

#[rstest]
#[case::without_retries(false)]
#[case::with_retries(true)]
#[tokio::test]
async fn test_slow_responses_exceed_the_deadline(#[case] retries: bool) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "result": {} }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    let client = client(&server, retries);

    for op in Op::all() {
        let err = op
            .call(&client.with_timeout(Duration::from_millis(50)), false)
            .await
            .unwrap_err();
        assert!(err.is_deadline_exceeded(), "{:?}: {}", op, err);
    }
}

#[tokio::test]
async fn test_empty_body_gives_no_result() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let client = client(&server, false);

    for op in Op::all() {
        let has_result = op.call(&client, false).await.unwrap();
        assert!(!has_result, "{:?}", op);
    }
}

#[tokio::test]
async fn test_cleared_service_url_is_reported() {
    let server = MockServer::start().await;
    let mut client = client(&server, false);
    client.set_service_url("").unwrap();

    for op in Op::all() {
        let err = op.call(&client, false).await.unwrap_err();
        assert!(matches!(err, RulesetsError::MissingServiceUrl), "{:?}: {}", op, err);
        assert_eq!(err.to_string(), "service URL is empty");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_envelope_becomes_service_error() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 10007, "message": "Ruleset not found" }],
            "messages": [],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = client(&server, false)
        .get_zone_ruleset(&GetRulesetOptions::new(RULESET_ID))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.to_string(), "Ruleset not found");
    match err {
        RulesetsError::Service { body: Some(body), .. } => {
            assert_eq!(body["errors"][0]["code"], 10007);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/{CRN}/rulesets/{RULESET_ID}")))
        .and(wiremock::matchers::header("X-Request-Id", "abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, false)
        .get_account_ruleset(&GetRulesetOptions::new(RULESET_ID).with_header("X-Request-Id", "abc-123"))
        .await
        .unwrap();
}
