//! Rule list editing used by the rule handlers

use rulesets_core::{Position, RuleCreate, RuleDetails, RulesetDetails};
use uuid::Uuid;

use crate::ApiError;

/// 32 hex characters, the id format the service hands out for rulesets and rules
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Turn a request rule into a stored rule; the version is stamped on save.
pub fn rule_from_create(create: RuleCreate) -> RuleDetails {
    RuleDetails {
        id: Some(create.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id)),
        version: None,
        action: create.action,
        action_parameters: create.action_parameters,
        categories: None,
        enabled: Some(create.enabled.unwrap_or(true)),
        description: create.description,
        expression: create.expression,
        r#ref: create.r#ref,
        logging: create.logging,
        last_updated: None,
    }
}

/// Overwrite the fields present in `patch`; the rule gets a new version on save.
pub fn apply_rule_update(rule: &mut RuleDetails, patch: RuleCreate) {
    if patch.action.is_some() {
        rule.action = patch.action;
    }
    if patch.action_parameters.is_some() {
        rule.action_parameters = patch.action_parameters;
    }
    if patch.description.is_some() {
        rule.description = patch.description;
    }
    if patch.enabled.is_some() {
        rule.enabled = patch.enabled;
    }
    if patch.expression.is_some() {
        rule.expression = patch.expression;
    }
    if patch.logging.is_some() {
        rule.logging = patch.logging;
    }
    if patch.r#ref.is_some() {
        rule.r#ref = patch.r#ref;
    }
    rule.version = None;
}

fn index_of(rules: &[RuleDetails], id: &str) -> Option<usize> {
    rules.iter().position(|r| r.id.as_deref() == Some(id))
}

/// Insert `rule` where `position` asks for it, appending by default.
pub fn insert_rule(
    rules: &mut Vec<RuleDetails>,
    rule: RuleDetails,
    position: Option<&Position>,
) -> Result<(), ApiError> {
    let at = match position {
        None => rules.len(),
        Some(position) => resolve_position(rules, position)?,
    };
    rules.insert(at, rule);
    Ok(())
}

fn resolve_position(rules: &[RuleDetails], position: &Position) -> Result<usize, ApiError> {
    let set = [
        position.before.is_some(),
        position.after.is_some(),
        position.index.is_some(),
    ]
    .iter()
    .filter(|s| **s)
    .count();
    if set > 1 {
        return Err(ApiError::BadRequest(
            "only one of 'before', 'after' and 'index' may be set".to_string(),
        ));
    }

    if let Some(before) = &position.before {
        return index_of(rules, before)
            .ok_or_else(|| ApiError::BadRequest(format!("rule {} not found in ruleset", before)));
    }
    if let Some(after) = &position.after {
        return index_of(rules, after)
            .map(|i| i + 1)
            .ok_or_else(|| ApiError::BadRequest(format!("rule {} not found in ruleset", after)));
    }
    match position.index {
        Some(index) if index >= 1 && (index as usize) <= rules.len() + 1 => Ok(index as usize - 1),
        Some(index) => Err(ApiError::BadRequest(format!(
            "index {} is out of range for a ruleset with {} rules",
            index,
            rules.len()
        ))),
        None => Ok(rules.len()),
    }
}

/// Add a new rule to `ruleset`; returns the new rule's id.
pub fn add_rule(ruleset: &mut RulesetDetails, create: RuleCreate) -> Result<String, ApiError> {
    let position = create.position.clone();
    let rule = rule_from_create(create);
    let id = rule.id.clone().unwrap_or_default();

    let rules = ruleset.rules.get_or_insert_with(Vec::new);
    if index_of(rules, &id).is_some() {
        return Err(ApiError::BadRequest(format!("rule {} already exists", id)));
    }
    insert_rule(rules, rule, position.as_ref())?;
    Ok(id)
}

/// Patch rule `rule_id` in place, moving it when the patch carries a position.
pub fn update_rule(
    ruleset: &mut RulesetDetails,
    rule_id: &str,
    mut patch: RuleCreate,
) -> Result<(), ApiError> {
    let rules = ruleset.rules.get_or_insert_with(Vec::new);
    let current = index_of(rules, rule_id)
        .ok_or_else(|| ApiError::NotFound(format!("Rule {} not found", rule_id)))?;

    let position = patch.position.take();
    let mut rule = rules.remove(current);
    apply_rule_update(&mut rule, patch);

    match position {
        Some(position) => {
            if let Err(e) = insert_rule(rules, rule.clone(), Some(&position)) {
                rules.insert(current, rule);
                return Err(e);
            }
        }
        None => rules.insert(current, rule),
    }
    Ok(())
}

/// Remove rule `rule_id`, returning it.
pub fn remove_rule(ruleset: &mut RulesetDetails, rule_id: &str) -> Result<RuleDetails, ApiError> {
    let rules = ruleset.rules.get_or_insert_with(Vec::new);
    let index = index_of(rules, rule_id)
        .ok_or_else(|| ApiError::NotFound(format!("Rule {} not found", rule_id)))?;
    Ok(rules.remove(index))
}

/// Copy of `ruleset` keeping only rules tagged with `tag`
pub fn filter_by_tag(ruleset: &RulesetDetails, tag: &str) -> RulesetDetails {
    let mut filtered = ruleset.clone();
    filtered.rules = Some(
        ruleset
            .rules()
            .iter()
            .filter(|r| {
                r.categories
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .any(|c| c == tag)
            })
            .cloned()
            .collect(),
    );
    filtered
}
