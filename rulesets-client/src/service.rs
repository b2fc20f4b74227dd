//! Rulesets service client construction and settings

use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::auth::Authenticator;
use crate::config::{authenticator_from_lookup, ServiceProperties};
use crate::error::{Result, RulesetsError};
use crate::transport::{BaseService, RetryPolicy};

/// Base URL of the public API
pub const DEFAULT_SERVICE_URL: &str = "https://api.cis.cloud.ibm.com";

/// Name used to look up `RULESETS_*` configuration properties
pub const DEFAULT_SERVICE_NAME: &str = "rulesets";

/// Construction options for [`RulesetsV1`]
#[derive(Debug, Clone, Default)]
pub struct RulesetsV1Options {
    /// Base URL; defaults to [`DEFAULT_SERVICE_URL`]
    pub url: Option<String>,
    pub authenticator: Option<Arc<dyn Authenticator>>,
    /// Full CRN of the service instance
    pub crn: Option<String>,
    /// Zone identifier used by zone scoped operations
    pub zone_identifier: Option<String>,
}

impl RulesetsV1Options {
    pub fn new(crn: impl Into<String>, zone_identifier: impl Into<String>) -> Self {
        Self {
            crn: Some(crn.into()),
            zone_identifier: Some(zone_identifier.into()),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }
}

/// Client for the rulesets API at account and zone scope
///
/// Cloning is cheap and clones share the underlying connection pool; settings
/// changed on a clone do not affect the original.
#[derive(Debug, Clone)]
pub struct RulesetsV1 {
    pub(crate) service: BaseService,
    crn: String,
    zone_identifier: String,
}

impl RulesetsV1 {
    pub fn new(options: RulesetsV1Options) -> Result<Self> {
        let crn = required_option(options.crn, "crn")?;
        let zone_identifier = required_option(options.zone_identifier, "zone_identifier")?;
        let authenticator = options.authenticator.ok_or_else(|| {
            RulesetsError::Configuration("an authenticator is required".to_string())
        })?;
        let url = options
            .url
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        Ok(Self {
            service: BaseService::new(url, authenticator)?,
            crn,
            zone_identifier,
        })
    }

    /// Build a client from `RULESETS_*` environment variables.
    ///
    /// Values set in `options` take precedence over the environment; the
    /// authenticator is read from the environment only when `options` has none.
    pub fn new_using_external_config(options: RulesetsV1Options) -> Result<Self> {
        Self::new_using_external_config_with(options, DEFAULT_SERVICE_NAME, |key| {
            std::env::var(key).ok()
        })
    }

    /// Same as [`RulesetsV1::new_using_external_config`] with a custom service
    /// name and variable source.
    pub fn new_using_external_config_with<F>(
        mut options: RulesetsV1Options,
        service_name: &str,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if options.authenticator.is_none() {
            options.authenticator = Some(authenticator_from_lookup(service_name, &lookup)?);
        }
        let props = ServiceProperties::from_lookup(service_name, &lookup)?;
        let explicit_url = options.url.is_some();

        let mut client = Self::new(options)?;
        client.configure(&props, explicit_url)?;
        Ok(client)
    }

    fn configure(&mut self, props: &ServiceProperties, explicit_url: bool) -> Result<()> {
        if let (Some(url), false) = (&props.url, explicit_url) {
            self.set_service_url(url.clone())?;
        }
        if props.disable_ssl {
            self.service.set_disable_ssl_verification(true)?;
        }
        if props.enable_gzip {
            self.set_enable_gzip_compression(true);
        }
        if props.enable_retries {
            self.enable_retries(
                props.max_retries.unwrap_or(0),
                props.retry_interval.unwrap_or(Duration::ZERO),
            );
        }
        Ok(())
    }

    /// Regional endpoints are not offered by this service.
    pub fn service_url_for_region(region: &str) -> Result<String> {
        Err(RulesetsError::Configuration(format!(
            "service does not support regional URLs (requested region '{}')",
            region
        )))
    }

    pub fn set_service_url(&mut self, url: impl Into<String>) -> Result<()> {
        self.service.set_service_url(url)
    }

    pub fn service_url(&self) -> &str {
        self.service.service_url()
    }

    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.service.set_default_headers(headers);
    }

    pub fn set_enable_gzip_compression(&mut self, enable: bool) {
        self.service.set_enable_gzip_compression(enable);
    }

    pub fn enable_gzip_compression(&self) -> bool {
        self.service.enable_gzip_compression()
    }

    /// Retry failed requests; zero arguments select the default limits.
    pub fn enable_retries(&mut self, max_retries: u32, max_retry_interval: Duration) {
        self.service
            .enable_retries(RetryPolicy::new(max_retries, max_retry_interval));
    }

    pub fn enable_retries_with_policy(&mut self, policy: RetryPolicy) {
        self.service.enable_retries(policy);
    }

    pub fn disable_retries(&mut self) {
        self.service.disable_retries();
    }

    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.service.retry_policy()
    }

    /// A clone whose calls fail with [`RulesetsError::DeadlineExceeded`] once
    /// `deadline` passes, retries included.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut client = self.clone();
        client.service.set_deadline(Some(deadline));
        client
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn crn(&self) -> &str {
        &self.crn
    }

    pub fn zone_identifier(&self) -> &str {
        &self.zone_identifier
    }

    pub(crate) fn account_path(&self) -> Vec<String> {
        vec!["v1".to_string(), self.crn.clone(), "rulesets".to_string()]
    }

    pub(crate) fn zone_path(&self) -> Vec<String> {
        vec![
            "v1".to_string(),
            self.crn.clone(),
            "zones".to_string(),
            self.zone_identifier.clone(),
            "rulesets".to_string(),
        ]
    }
}

fn required_option(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RulesetsError::Configuration(format!("`{}` is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NoAuthAuthenticator, AUTHTYPE_BEARER_TOKEN};
    use std::collections::HashMap;

    fn options() -> RulesetsV1Options {
        RulesetsV1Options::new("testString", "testZone")
            .with_authenticator(Arc::new(NoAuthAuthenticator))
    }

    #[test]
    fn test_construction_requires_crn_and_zone() {
        let err = RulesetsV1::new(RulesetsV1Options::default()).unwrap_err();
        assert!(err.to_string().contains("crn"));

        let mut opts = options();
        opts.zone_identifier = None;
        assert!(RulesetsV1::new(opts).is_err());

        let mut opts = options();
        opts.authenticator = None;
        assert!(RulesetsV1::new(opts).is_err());
    }

    #[test]
    fn test_defaults() {
        let client = RulesetsV1::new(options()).unwrap();
        assert_eq!(client.service_url(), DEFAULT_SERVICE_URL);
        assert!(!client.enable_gzip_compression());
        assert!(!client.service.disable_ssl_verification());
        assert!(client.retry_policy().is_none());
        assert_eq!(client.crn(), "testString");
        assert_eq!(client.zone_identifier(), "testZone");
    }

    #[test]
    fn test_bad_url_is_rejected_at_construction() {
        let err = RulesetsV1::new(options().with_url("{BAD_URL_STRING")).unwrap_err();
        assert!(matches!(err, RulesetsError::Configuration(_)));
    }

    #[test]
    fn test_settings_are_per_clone() {
        let mut client = RulesetsV1::new(options()).unwrap();
        client.set_enable_gzip_compression(true);
        client.enable_retries(4, Duration::from_secs(30));

        let mut copy = client.clone();
        copy.set_service_url("https://other.example.com").unwrap();
        copy.disable_retries();

        assert_eq!(client.service_url(), DEFAULT_SERVICE_URL);
        assert!(client.retry_policy().is_some());
        assert!(copy.enable_gzip_compression());
        assert!(copy.retry_policy().is_none());
    }

    #[test]
    fn test_regional_urls_are_unsupported() {
        assert!(RulesetsV1::service_url_for_region("us-south").is_err());
    }

    #[test]
    fn test_external_config() {
        let vars: HashMap<&str, &str> = [
            ("RULESETS_URL", "https://rulesetsv1/api"),
            ("RULESETS_AUTH_TYPE", "bearertoken"),
            ("RULESETS_BEARER_TOKEN", "tok"),
            ("RULESETS_ENABLE_GZIP", "true"),
            ("RULESETS_ENABLE_RETRIES", "true"),
            ("RULESETS_MAX_RETRIES", "2"),
            ("RULESETS_DISABLE_SSL", "true"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| vars.get(k).map(|v| v.to_string());

        let client = RulesetsV1::new_using_external_config_with(
            RulesetsV1Options::new("testString", "testZone"),
            DEFAULT_SERVICE_NAME,
            lookup,
        )
        .unwrap();

        assert_eq!(client.service_url(), "https://rulesetsv1/api");
        assert!(client.enable_gzip_compression());
        assert_eq!(client.retry_policy().map(|p| p.max_retries), Some(2));
        assert_eq!(client.service.authenticator().auth_type(), AUTHTYPE_BEARER_TOKEN);
        assert!(client.service.disable_ssl_verification());
    }

    #[test]
    fn test_explicit_url_wins_over_environment() {
        let lookup = |k: &str| match k {
            "RULESETS_URL" => Some("https://from-env".to_string()),
            "RULESETS_AUTH_TYPE" => Some("noauth".to_string()),
            _ => None,
        };
        let client = RulesetsV1::new_using_external_config_with(
            RulesetsV1Options::new("crn", "zone").with_url("https://explicit"),
            DEFAULT_SERVICE_NAME,
            lookup,
        )
        .unwrap();
        assert_eq!(client.service_url(), "https://explicit");
    }

    #[test]
    fn test_paths() {
        let client = RulesetsV1::new(options()).unwrap();
        assert_eq!(client.account_path(), vec!["v1", "testString", "rulesets"]);
        assert_eq!(
            client.zone_path(),
            vec!["v1", "testString", "zones", "testZone", "rulesets"]
        );
    }
}
