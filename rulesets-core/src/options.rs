//! Per-operation option builders
//!
//! Each operation of the rulesets service takes one of these structs. Account
//! and zone scoped operations share the same options; the scope is chosen by
//! the method that is called. Path identifiers are required and are checked
//! by [`Validate::validate`] before any request is built.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ActionParameters, CoreError, Logging, Position, RuleCreate};

/// Client-side validation of required operation parameters
pub trait Validate {
    fn validate(&self) -> Result<(), CoreError>;
}

/// Returns the value of a required identifier, rejecting absent or empty values.
pub fn require<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, CoreError> {
    match value.as_deref() {
        None => Err(CoreError::MissingField(field)),
        Some("") => Err(CoreError::EmptyField(field)),
        Some(v) => Ok(v),
    }
}

macro_rules! required_fields {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl Validate for $ty {
            fn validate(&self) -> Result<(), CoreError> {
                $( require(&self.$field, stringify!($field))?; )*
                Ok(())
            }
        }

        impl $ty {
            /// Add custom request headers sent with this call only
            pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
                self.headers.extend(headers);
                self
            }

            pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
                self.headers.insert(name.into(), value.into());
                self
            }
        }
    };
}

/// Body of the ruleset update operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesetBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleCreate>>,
}

// ==================== Rulesets ====================

/// Options for listing the rulesets of an account or zone
#[derive(Debug, Clone, Default)]
pub struct ListRulesetsOptions {
    pub headers: HashMap<String, String>,
}

impl ListRulesetsOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

required_fields!(ListRulesetsOptions {});

/// Options for fetching one ruleset
#[derive(Debug, Clone, Default)]
pub struct GetRulesetOptions {
    pub ruleset_id: Option<String>,
    pub headers: HashMap<String, String>,
}

impl GetRulesetOptions {
    pub fn new(ruleset_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ..Self::default()
        }
    }

    pub fn with_ruleset_id(mut self, ruleset_id: impl Into<String>) -> Self {
        self.ruleset_id = Some(ruleset_id.into());
        self
    }
}

required_fields!(GetRulesetOptions { ruleset_id });

/// Options for replacing a ruleset's definition
#[derive(Debug, Clone, Default)]
pub struct UpdateRulesetOptions {
    pub ruleset_id: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub phase: Option<String>,
    pub rules: Option<Vec<RuleCreate>>,
    pub headers: HashMap<String, String>,
}

impl UpdateRulesetOptions {
    pub fn new(ruleset_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ..Self::default()
        }
    }

    pub fn with_ruleset_id(mut self, ruleset_id: impl Into<String>) -> Self {
        self.ruleset_id = Some(ruleset_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_rules(mut self, rules: Vec<RuleCreate>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn body(&self) -> RulesetBody {
        RulesetBody {
            description: self.description.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            phase: self.phase.clone(),
            rules: self.rules.clone(),
        }
    }
}

required_fields!(UpdateRulesetOptions { ruleset_id });

/// Options for deleting a ruleset
#[derive(Debug, Clone, Default)]
pub struct DeleteRulesetOptions {
    pub ruleset_id: Option<String>,
    pub headers: HashMap<String, String>,
}

impl DeleteRulesetOptions {
    pub fn new(ruleset_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ..Self::default()
        }
    }
}

required_fields!(DeleteRulesetOptions { ruleset_id });

// ==================== Versions ====================

/// Options for listing the version history of a ruleset
#[derive(Debug, Clone, Default)]
pub struct ListRulesetVersionsOptions {
    pub ruleset_id: Option<String>,
    pub headers: HashMap<String, String>,
}

impl ListRulesetVersionsOptions {
    pub fn new(ruleset_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ..Self::default()
        }
    }
}

required_fields!(ListRulesetVersionsOptions { ruleset_id });

/// Options for fetching one version of a ruleset
#[derive(Debug, Clone, Default)]
pub struct GetRulesetVersionOptions {
    pub ruleset_id: Option<String>,
    pub ruleset_version: Option<String>,
    pub headers: HashMap<String, String>,
}

impl GetRulesetVersionOptions {
    pub fn new(ruleset_id: impl Into<String>, ruleset_version: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ruleset_version: Some(ruleset_version.into()),
            ..Self::default()
        }
    }
}

required_fields!(GetRulesetVersionOptions { ruleset_id, ruleset_version });

/// Options for deleting one version of a ruleset
#[derive(Debug, Clone, Default)]
pub struct DeleteRulesetVersionOptions {
    pub ruleset_id: Option<String>,
    pub ruleset_version: Option<String>,
    pub headers: HashMap<String, String>,
}

impl DeleteRulesetVersionOptions {
    pub fn new(ruleset_id: impl Into<String>, ruleset_version: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ruleset_version: Some(ruleset_version.into()),
            ..Self::default()
        }
    }
}

required_fields!(DeleteRulesetVersionOptions { ruleset_id, ruleset_version });

/// Options for fetching the rules of a ruleset version that carry a category tag
#[derive(Debug, Clone, Default)]
pub struct GetRulesetVersionByTagOptions {
    pub ruleset_id: Option<String>,
    pub ruleset_version: Option<String>,
    pub rule_tag: Option<String>,
    pub headers: HashMap<String, String>,
}

impl GetRulesetVersionByTagOptions {
    pub fn new(
        ruleset_id: impl Into<String>,
        ruleset_version: impl Into<String>,
        rule_tag: impl Into<String>,
    ) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ruleset_version: Some(ruleset_version.into()),
            rule_tag: Some(rule_tag.into()),
            ..Self::default()
        }
    }
}

required_fields!(GetRulesetVersionByTagOptions { ruleset_id, ruleset_version, rule_tag });

// ==================== Phase entrypoints ====================

/// Options for fetching the entrypoint ruleset of a phase
#[derive(Debug, Clone, Default)]
pub struct GetEntrypointRulesetOptions {
    pub ruleset_phase: Option<String>,
    pub headers: HashMap<String, String>,
}

impl GetEntrypointRulesetOptions {
    pub fn new(ruleset_phase: impl Into<String>) -> Self {
        Self {
            ruleset_phase: Some(ruleset_phase.into()),
            ..Self::default()
        }
    }
}

required_fields!(GetEntrypointRulesetOptions { ruleset_phase });

/// Options for creating or replacing the entrypoint ruleset of a phase
#[derive(Debug, Clone, Default)]
pub struct UpdateEntrypointRulesetOptions {
    pub ruleset_phase: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub phase: Option<String>,
    pub rules: Option<Vec<RuleCreate>>,
    pub headers: HashMap<String, String>,
}

impl UpdateEntrypointRulesetOptions {
    pub fn new(ruleset_phase: impl Into<String>) -> Self {
        Self {
            ruleset_phase: Some(ruleset_phase.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_rules(mut self, rules: Vec<RuleCreate>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn body(&self) -> RulesetBody {
        RulesetBody {
            description: self.description.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            phase: self.phase.clone(),
            rules: self.rules.clone(),
        }
    }
}

required_fields!(UpdateEntrypointRulesetOptions { ruleset_phase });

/// Options for listing the versions of a phase entrypoint
#[derive(Debug, Clone, Default)]
pub struct ListEntrypointRulesetVersionsOptions {
    pub ruleset_phase: Option<String>,
    pub headers: HashMap<String, String>,
}

impl ListEntrypointRulesetVersionsOptions {
    pub fn new(ruleset_phase: impl Into<String>) -> Self {
        Self {
            ruleset_phase: Some(ruleset_phase.into()),
            ..Self::default()
        }
    }
}

required_fields!(ListEntrypointRulesetVersionsOptions { ruleset_phase });

/// Options for fetching one version of a phase entrypoint
#[derive(Debug, Clone, Default)]
pub struct GetEntrypointRulesetVersionOptions {
    pub ruleset_phase: Option<String>,
    pub ruleset_version: Option<String>,
    pub headers: HashMap<String, String>,
}

impl GetEntrypointRulesetVersionOptions {
    pub fn new(ruleset_phase: impl Into<String>, ruleset_version: impl Into<String>) -> Self {
        Self {
            ruleset_phase: Some(ruleset_phase.into()),
            ruleset_version: Some(ruleset_version.into()),
            ..Self::default()
        }
    }
}

required_fields!(GetEntrypointRulesetVersionOptions { ruleset_phase, ruleset_version });

// ==================== Rules ====================

/// Options for adding a rule to a ruleset
#[derive(Debug, Clone, Default)]
pub struct CreateRulesetRuleOptions {
    pub ruleset_id: Option<String>,
    pub rule: RuleCreate,
    pub headers: HashMap<String, String>,
}

impl CreateRulesetRuleOptions {
    pub fn new(ruleset_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            ..Self::default()
        }
    }

    pub fn with_rule(mut self, rule: RuleCreate) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.rule.action = Some(action.into());
        self
    }

    pub fn with_action_parameters(mut self, action_parameters: ActionParameters) -> Self {
        self.rule.action_parameters = Some(action_parameters);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.rule.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.rule.enabled = Some(enabled);
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.rule.expression = Some(expression.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.rule.id = Some(id.into());
        self
    }

    pub fn with_logging(mut self, logging: Logging) -> Self {
        self.rule.logging = Some(logging);
        self
    }

    pub fn with_ref(mut self, r#ref: impl Into<String>) -> Self {
        self.rule.r#ref = Some(r#ref.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.rule.position = Some(position);
        self
    }
}

required_fields!(CreateRulesetRuleOptions { ruleset_id });

/// Options for changing a rule in place
#[derive(Debug, Clone, Default)]
pub struct UpdateRulesetRuleOptions {
    pub ruleset_id: Option<String>,
    pub rule_id: Option<String>,
    pub rule: RuleCreate,
    pub headers: HashMap<String, String>,
}

impl UpdateRulesetRuleOptions {
    pub fn new(ruleset_id: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            rule_id: Some(rule_id.into()),
            ..Self::default()
        }
    }

    pub fn with_rule(mut self, rule: RuleCreate) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.rule.action = Some(action.into());
        self
    }

    pub fn with_action_parameters(mut self, action_parameters: ActionParameters) -> Self {
        self.rule.action_parameters = Some(action_parameters);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.rule.description = Some(description.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.rule.enabled = Some(enabled);
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.rule.expression = Some(expression.into());
        self
    }

    pub fn with_logging(mut self, logging: Logging) -> Self {
        self.rule.logging = Some(logging);
        self
    }

    pub fn with_ref(mut self, r#ref: impl Into<String>) -> Self {
        self.rule.r#ref = Some(r#ref.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.rule.position = Some(position);
        self
    }
}

required_fields!(UpdateRulesetRuleOptions { ruleset_id, rule_id });

/// Options for removing a rule from a ruleset
#[derive(Debug, Clone, Default)]
pub struct DeleteRulesetRuleOptions {
    pub ruleset_id: Option<String>,
    pub rule_id: Option<String>,
    pub headers: HashMap<String, String>,
}

impl DeleteRulesetRuleOptions {
    pub fn new(ruleset_id: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: Some(ruleset_id.into()),
            rule_id: Some(rule_id.into()),
            ..Self::default()
        }
    }
}

required_fields!(DeleteRulesetRuleOptions { ruleset_id, rule_id });
