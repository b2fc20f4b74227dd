//! Wire models for rulesets, rules, and response envelopes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Declares a string-backed enum that matches a closed set of wire values.
///
/// Model fields keep these values as plain strings so that values added to the
/// service later still deserialize; the enums exist for builders and matching.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(CoreError::InvalidValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

wire_enum! {
    /// Kind of a ruleset
    RulesetKind, "kind" {
        Managed => "managed",
        Custom => "custom",
        Root => "root",
        Zone => "zone",
    }
}

wire_enum! {
    /// Traffic-processing phase a ruleset is evaluated in
    RulesetPhase, "phase" {
        DdosL4 => "ddos_l4",
        DdosL7 => "ddos_l7",
        HttpConfigSettings => "http_config_settings",
        HttpCustomErrors => "http_custom_errors",
        HttpLogCustom => "http_log_custom",
        HttpRatelimit => "http_ratelimit",
        HttpRequestCacheSettings => "http_request_cache_settings",
        HttpRequestDynamicRedirect => "http_request_dynamic_redirect",
        HttpRequestFirewallCustom => "http_request_firewall_custom",
        HttpRequestFirewallManaged => "http_request_firewall_managed",
        HttpRequestLateTransform => "http_request_late_transform",
        HttpRequestOrigin => "http_request_origin",
        HttpRequestRedirect => "http_request_redirect",
        HttpRequestSanitize => "http_request_sanitize",
        HttpRequestSbfm => "http_request_sbfm",
        HttpRequestSelectConfiguration => "http_request_select_configuration",
        HttpRequestTransform => "http_request_transform",
        HttpResponseCompression => "http_response_compression",
        HttpResponseFirewallManaged => "http_response_firewall_managed",
        HttpResponseHeadersTransform => "http_response_headers_transform",
    }
}

wire_enum! {
    /// Action taken when a rule expression matches
    RuleAction, "action" {
        Block => "block",
        Challenge => "challenge",
        CompressResponse => "compress_response",
        DdosDynamic => "ddos_dynamic",
        Execute => "execute",
        ForceConnectionClose => "force_connection_close",
        JsChallenge => "js_challenge",
        Log => "log",
        LogCustomField => "log_custom_field",
        ManagedChallenge => "managed_challenge",
        Redirect => "redirect",
        Rewrite => "rewrite",
        Route => "route",
        Score => "score",
        ServeError => "serve_error",
        SetCacheSettings => "set_cache_settings",
        SetConfig => "set_config",
        Skip => "skip",
    }
}

// ==================== Rule building blocks ====================

/// Logging switch for a rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl Logging {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
        }
    }
}

/// Where a rule is placed inside its ruleset.
///
/// At most one of the three fields is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Place the rule before the rule with this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Place the rule after the rule with this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// 1-based index in the rule list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

impl Position {
    pub fn before(rule_id: impl Into<String>) -> Self {
        Self {
            before: Some(rule_id.into()),
            ..Self::default()
        }
    }

    pub fn after(rule_id: impl Into<String>) -> Self {
        Self {
            after: Some(rule_id.into()),
            ..Self::default()
        }
    }

    pub fn index(index: i64) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }
}

/// Per-rule override inside a managed ruleset execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<i64>,
}

/// Per-category override inside a managed ruleset execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoriesOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity_level: Option<String>,
}

/// Overrides applied when executing another ruleset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RulesOverride>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoriesOverride>>,
}

/// Custom response served by a `serve_error` or `block` action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParametersResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
}

/// Parameters of a rule action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParameters {
    /// Id of the ruleset to execute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Overrides>,
    /// Version of the executed ruleset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `current` to skip the rest of the current ruleset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruleset: Option<String>,
    /// Ruleset ids to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rulesets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ActionParametersResponse>,
}

// ==================== Rules ====================

/// A rule as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_parameters: Option<ActionParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Logging>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// A rule as sent to the service when creating or updating rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_parameters: Option<ActionParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Logging>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl RuleCreate {
    pub fn new(action: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            expression: Some(expression.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_action_parameters(mut self, action_parameters: ActionParameters) -> Self {
        self.action_parameters = Some(action_parameters);
        self
    }

    pub fn with_logging(mut self, logging: Logging) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn with_ref(mut self, r#ref: impl Into<String>) -> Self {
        self.r#ref = Some(r#ref.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

// ==================== Rulesets ====================

/// A ruleset summary as returned by list operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListedRuleset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A ruleset with its rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesetDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleDetails>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl RulesetDetails {
    /// Summary of this ruleset without its rules
    pub fn to_listed(&self) -> ListedRuleset {
        ListedRuleset {
            description: self.description.clone(),
            id: self.id.clone(),
            kind: self.kind.clone(),
            last_updated: self.last_updated.clone(),
            name: self.name.clone(),
            phase: self.phase.clone(),
            version: self.version.clone(),
        }
    }

    pub fn rules(&self) -> &[RuleDetails] {
        self.rules.as_deref().unwrap_or_default()
    }
}

// ==================== Envelopes ====================

/// Pointer to the request field a message refers to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

/// An error or informational message in a response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MessageSource>,
}

impl Message {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: Some(message.into()),
            source: None,
        }
    }
}

/// Response envelope shared by every operation of the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<Message>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub result: T,
}

impl<T> Envelope<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            messages: Vec::new(),
            result,
        }
    }
}

/// Single ruleset response
pub type RulesetResp = Envelope<RulesetDetails>;

/// List of rulesets or ruleset versions
pub type ListRulesetsResp = Envelope<Vec<ListedRuleset>>;

/// Single rule response
pub type RuleResp = Envelope<RuleDetails>;
