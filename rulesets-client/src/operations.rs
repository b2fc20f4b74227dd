//! Rulesets API operations
//!
//! Every operation exists at account scope (`/v1/{crn}/rulesets`) and, except
//! for the by-tag lookup, at zone scope (`/v1/{crn}/zones/{zone}/rulesets`).
//! Both scopes share one implementation parameterized by [`Scope`].

use reqwest::Method;
use rulesets_core::{
    CreateRulesetRuleOptions, DeleteRulesetOptions, DeleteRulesetRuleOptions,
    DeleteRulesetVersionOptions, GetEntrypointRulesetOptions, GetEntrypointRulesetVersionOptions,
    GetRulesetOptions, GetRulesetVersionByTagOptions, GetRulesetVersionOptions,
    ListEntrypointRulesetVersionsOptions, ListRulesetVersionsOptions, ListRulesetsOptions,
    ListRulesetsResp, RuleResp, RulesetResp, UpdateEntrypointRulesetOptions,
    UpdateRulesetOptions, UpdateRulesetRuleOptions, Validate,
};

use crate::error::Result;
use crate::service::RulesetsV1;
use crate::transport::{DetailedResponse, ServiceRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Account,
    Zone,
}

/// Path parameter that `validate()` has already checked.
fn param(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl RulesetsV1 {
    fn base_path(&self, scope: Scope) -> Vec<String> {
        match scope {
            Scope::Account => self.account_path(),
            Scope::Zone => self.zone_path(),
        }
    }

    // ==================== Scoped implementations ====================

    async fn list_rulesets(
        &self,
        scope: Scope,
        options: &ListRulesetsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(scope))
            .headers(&options.headers);
        self.service.request(request).await
    }

    async fn get_ruleset(
        &self,
        scope: Scope,
        options: &GetRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(scope))
            .path([param(&options.ruleset_id)])
            .headers(&options.headers);
        self.service.request(request).await
    }

    async fn update_ruleset(
        &self,
        scope: Scope,
        options: &UpdateRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::PUT)
            .path(self.base_path(scope))
            .path([param(&options.ruleset_id)])
            .headers(&options.headers)
            .json(&options.body())?;
        self.service.request(request).await
    }

    async fn delete_ruleset(
        &self,
        scope: Scope,
        options: &DeleteRulesetOptions,
    ) -> Result<DetailedResponse<()>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::DELETE)
            .path(self.base_path(scope))
            .path([param(&options.ruleset_id)])
            .headers(&options.headers);
        self.service.request_no_content(request).await
    }

    async fn list_ruleset_versions(
        &self,
        scope: Scope,
        options: &ListRulesetVersionsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(scope))
            .path([param(&options.ruleset_id), "versions".to_string()])
            .headers(&options.headers);
        self.service.request(request).await
    }

    async fn get_ruleset_version(
        &self,
        scope: Scope,
        options: &GetRulesetVersionOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(scope))
            .path([
                param(&options.ruleset_id),
                "versions".to_string(),
                param(&options.ruleset_version),
            ])
            .headers(&options.headers);
        self.service.request(request).await
    }

    async fn delete_ruleset_version(
        &self,
        scope: Scope,
        options: &DeleteRulesetVersionOptions,
    ) -> Result<DetailedResponse<()>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::DELETE)
            .path(self.base_path(scope))
            .path([
                param(&options.ruleset_id),
                "versions".to_string(),
                param(&options.ruleset_version),
            ])
            .headers(&options.headers);
        self.service.request_no_content(request).await
    }

    async fn get_entrypoint_ruleset(
        &self,
        scope: Scope,
        options: &GetEntrypointRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(scope))
            .path([
                "phases".to_string(),
                param(&options.ruleset_phase),
                "entrypoint".to_string(),
            ])
            .headers(&options.headers);
        self.service.request(request).await
    }

    async fn update_entrypoint_ruleset(
        &self,
        scope: Scope,
        options: &UpdateEntrypointRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::PUT)
            .path(self.base_path(scope))
            .path([
                "phases".to_string(),
                param(&options.ruleset_phase),
                "entrypoint".to_string(),
            ])
            .headers(&options.headers)
            .json(&options.body())?;
        self.service.request(request).await
    }

    async fn list_entrypoint_ruleset_versions(
        &self,
        scope: Scope,
        options: &ListEntrypointRulesetVersionsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(scope))
            .path([
                "phases".to_string(),
                param(&options.ruleset_phase),
                "entrypoint".to_string(),
                "versions".to_string(),
            ])
            .headers(&options.headers);
        self.service.request(request).await
    }

    async fn get_entrypoint_ruleset_version(
        &self,
        scope: Scope,
        options: &GetEntrypointRulesetVersionOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(scope))
            .path([
                "phases".to_string(),
                param(&options.ruleset_phase),
                "entrypoint".to_string(),
                "versions".to_string(),
                param(&options.ruleset_version),
            ])
            .headers(&options.headers);
        self.service.request(request).await
    }

    async fn create_ruleset_rule(
        &self,
        scope: Scope,
        options: &CreateRulesetRuleOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::POST)
            .path(self.base_path(scope))
            .path([param(&options.ruleset_id), "rules".to_string()])
            .headers(&options.headers)
            .json(&options.rule)?;
        self.service.request(request).await
    }

    async fn update_ruleset_rule(
        &self,
        scope: Scope,
        options: &UpdateRulesetRuleOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::PATCH)
            .path(self.base_path(scope))
            .path([
                param(&options.ruleset_id),
                "rules".to_string(),
                param(&options.rule_id),
            ])
            .headers(&options.headers)
            .json(&options.rule)?;
        self.service.request(request).await
    }

    async fn delete_ruleset_rule(
        &self,
        scope: Scope,
        options: &DeleteRulesetRuleOptions,
    ) -> Result<DetailedResponse<RuleResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::DELETE)
            .path(self.base_path(scope))
            .path([
                param(&options.ruleset_id),
                "rules".to_string(),
                param(&options.rule_id),
            ])
            .headers(&options.headers);
        self.service.request(request).await
    }

    // ==================== Account rulesets ====================

    /// List all rulesets of the instance
    pub async fn get_account_rulesets(
        &self,
        options: &ListRulesetsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        self.list_rulesets(Scope::Account, options).await
    }

    /// Get one instance ruleset with its rules
    pub async fn get_account_ruleset(
        &self,
        options: &GetRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_ruleset(Scope::Account, options).await
    }

    /// Replace the definition of an instance ruleset
    pub async fn update_account_ruleset(
        &self,
        options: &UpdateRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.update_ruleset(Scope::Account, options).await
    }

    pub async fn delete_account_ruleset(
        &self,
        options: &DeleteRulesetOptions,
    ) -> Result<DetailedResponse<()>> {
        self.delete_ruleset(Scope::Account, options).await
    }

    pub async fn get_account_ruleset_versions(
        &self,
        options: &ListRulesetVersionsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        self.list_ruleset_versions(Scope::Account, options).await
    }

    pub async fn get_account_ruleset_version(
        &self,
        options: &GetRulesetVersionOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_ruleset_version(Scope::Account, options).await
    }

    pub async fn delete_account_ruleset_version(
        &self,
        options: &DeleteRulesetVersionOptions,
    ) -> Result<DetailedResponse<()>> {
        self.delete_ruleset_version(Scope::Account, options).await
    }

    /// Get the rules of a ruleset version that belong to a category tag
    pub async fn get_account_ruleset_version_by_tag(
        &self,
        options: &GetRulesetVersionByTagOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        options.validate()?;
        let request = ServiceRequest::new(Method::GET)
            .path(self.base_path(Scope::Account))
            .path([
                param(&options.ruleset_id),
                "versions".to_string(),
                param(&options.ruleset_version),
                "by_tag".to_string(),
                param(&options.rule_tag),
            ])
            .headers(&options.headers);
        self.service.request(request).await
    }

    // ==================== Account entrypoints ====================

    /// Get the entrypoint ruleset of a phase at instance level
    pub async fn get_account_entrypoint_ruleset(
        &self,
        options: &GetEntrypointRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_entrypoint_ruleset(Scope::Account, options).await
    }

    /// Create or replace the entrypoint ruleset of a phase at instance level
    pub async fn update_account_entrypoint_ruleset(
        &self,
        options: &UpdateEntrypointRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.update_entrypoint_ruleset(Scope::Account, options).await
    }

    pub async fn get_account_entry_point_ruleset_versions(
        &self,
        options: &ListEntrypointRulesetVersionsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        self.list_entrypoint_ruleset_versions(Scope::Account, options)
            .await
    }

    pub async fn get_account_entry_point_ruleset_version(
        &self,
        options: &GetEntrypointRulesetVersionOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_entrypoint_ruleset_version(Scope::Account, options)
            .await
    }

    // ==================== Account rules ====================

    /// Add a rule to an instance ruleset; returns the updated ruleset
    pub async fn create_account_ruleset_rule(
        &self,
        options: &CreateRulesetRuleOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.create_ruleset_rule(Scope::Account, options).await
    }

    pub async fn update_account_ruleset_rule(
        &self,
        options: &UpdateRulesetRuleOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.update_ruleset_rule(Scope::Account, options).await
    }

    pub async fn delete_account_ruleset_rule(
        &self,
        options: &DeleteRulesetRuleOptions,
    ) -> Result<DetailedResponse<RuleResp>> {
        self.delete_ruleset_rule(Scope::Account, options).await
    }

    // ==================== Zone rulesets ====================

    /// List all rulesets of the zone
    pub async fn get_zone_rulesets(
        &self,
        options: &ListRulesetsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        self.list_rulesets(Scope::Zone, options).await
    }

    pub async fn get_zone_ruleset(
        &self,
        options: &GetRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_ruleset(Scope::Zone, options).await
    }

    pub async fn update_zone_ruleset(
        &self,
        options: &UpdateRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.update_ruleset(Scope::Zone, options).await
    }

    pub async fn delete_zone_ruleset(
        &self,
        options: &DeleteRulesetOptions,
    ) -> Result<DetailedResponse<()>> {
        self.delete_ruleset(Scope::Zone, options).await
    }

    pub async fn get_zone_ruleset_versions(
        &self,
        options: &ListRulesetVersionsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        self.list_ruleset_versions(Scope::Zone, options).await
    }

    pub async fn get_zone_ruleset_version(
        &self,
        options: &GetRulesetVersionOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_ruleset_version(Scope::Zone, options).await
    }

    pub async fn delete_zone_ruleset_version(
        &self,
        options: &DeleteRulesetVersionOptions,
    ) -> Result<DetailedResponse<()>> {
        self.delete_ruleset_version(Scope::Zone, options).await
    }

    // ==================== Zone entrypoints ====================

    pub async fn get_zone_entrypoint_ruleset(
        &self,
        options: &GetEntrypointRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_entrypoint_ruleset(Scope::Zone, options).await
    }

    pub async fn update_zone_entrypoint_ruleset(
        &self,
        options: &UpdateEntrypointRulesetOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.update_entrypoint_ruleset(Scope::Zone, options).await
    }

    pub async fn get_zone_entry_point_ruleset_versions(
        &self,
        options: &ListEntrypointRulesetVersionsOptions,
    ) -> Result<DetailedResponse<ListRulesetsResp>> {
        self.list_entrypoint_ruleset_versions(Scope::Zone, options)
            .await
    }

    pub async fn get_zone_entry_point_ruleset_version(
        &self,
        options: &GetEntrypointRulesetVersionOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.get_entrypoint_ruleset_version(Scope::Zone, options)
            .await
    }

    // ==================== Zone rules ====================

    pub async fn create_zone_ruleset_rule(
        &self,
        options: &CreateRulesetRuleOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.create_ruleset_rule(Scope::Zone, options).await
    }

    pub async fn update_zone_ruleset_rule(
        &self,
        options: &UpdateRulesetRuleOptions,
    ) -> Result<DetailedResponse<RulesetResp>> {
        self.update_ruleset_rule(Scope::Zone, options).await
    }

    pub async fn delete_zone_ruleset_rule(
        &self,
        options: &DeleteRulesetRuleOptions,
    ) -> Result<DetailedResponse<RuleResp>> {
        self.delete_ruleset_rule(Scope::Zone, options).await
    }
}
