//! Service configuration loaded from environment variables
//!
//! Properties are read from `{SERVICE_NAME}_{PROPERTY}` variables, where the
//! service name is upper-cased and `-` becomes `_`. For the default service
//! name `rulesets` that gives `RULESETS_URL`, `RULESETS_AUTH_TYPE`, and so on.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    Authenticator, BasicAuthenticator, BearerTokenAuthenticator, IamAuthenticator,
    NoAuthAuthenticator, AUTHTYPE_BASIC, AUTHTYPE_BEARER_TOKEN, AUTHTYPE_IAM, AUTHTYPE_NOAUTH,
    DEFAULT_IAM_URL,
};
use crate::error::{Result, RulesetsError};

/// Service properties that can be set from the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceProperties {
    pub url: Option<String>,
    pub disable_ssl: bool,
    pub enable_gzip: bool,
    pub enable_retries: bool,
    pub max_retries: Option<u32>,
    pub retry_interval: Option<Duration>,
}

impl ServiceProperties {
    /// Read properties for `service_name` from the process environment
    pub fn from_env(service_name: &str) -> Result<Self> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Read properties through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let props = PropertyReader::new(service_name, lookup);

        Ok(Self {
            url: props.get("URL"),
            disable_ssl: props.get_bool("DISABLE_SSL")?.unwrap_or(false),
            enable_gzip: props.get_bool("ENABLE_GZIP")?.unwrap_or(false),
            enable_retries: props.get_bool("ENABLE_RETRIES")?.unwrap_or(false),
            max_retries: props.get_parsed::<u32>("MAX_RETRIES")?,
            retry_interval: props
                .get_parsed::<u64>("RETRY_INTERVAL")?
                .map(Duration::from_secs),
        })
    }
}

/// Build the authenticator described by `{SERVICE_NAME}_AUTH_TYPE` and friends
pub fn authenticator_from_env(service_name: &str) -> Result<Arc<dyn Authenticator>> {
    authenticator_from_lookup(service_name, |key| std::env::var(key).ok())
}

pub fn authenticator_from_lookup<F>(service_name: &str, lookup: F) -> Result<Arc<dyn Authenticator>>
where
    F: Fn(&str) -> Option<String>,
{
    let props = PropertyReader::new(service_name, lookup);

    let auth_type = match props.get("AUTH_TYPE") {
        Some(t) => t.to_lowercase(),
        None if props.get("APIKEY").is_some() => AUTHTYPE_IAM.to_string(),
        None => {
            return Err(RulesetsError::Configuration(format!(
                "unable to create an authenticator: no credentials found for service '{}'",
                service_name
            )))
        }
    };

    tracing::debug!(service = service_name, auth_type = %auth_type, "Creating authenticator from environment");

    let authenticator: Arc<dyn Authenticator> = match auth_type.as_str() {
        AUTHTYPE_NOAUTH => Arc::new(NoAuthAuthenticator),
        AUTHTYPE_BASIC => Arc::new(BasicAuthenticator::new(
            props.get("USERNAME").unwrap_or_default(),
            props.get("PASSWORD").unwrap_or_default(),
        )?),
        AUTHTYPE_BEARER_TOKEN => Arc::new(BearerTokenAuthenticator::new(
            props.get("BEARER_TOKEN").unwrap_or_default(),
        )?),
        AUTHTYPE_IAM => Arc::new(IamAuthenticator::with_url(
            props.get("APIKEY").unwrap_or_default(),
            props.get("AUTH_URL").unwrap_or_else(|| DEFAULT_IAM_URL.to_string()),
        )?),
        other => {
            return Err(RulesetsError::Configuration(format!(
                "unrecognized authentication type: {}",
                other
            )))
        }
    };

    Ok(authenticator)
}

/// Prefixes property names with the service's variable prefix
struct PropertyReader<F> {
    prefix: String,
    lookup: F,
}

impl<F> PropertyReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(service_name: &str, lookup: F) -> Self {
        Self {
            prefix: service_name.to_uppercase().replace('-', "_"),
            lookup,
        }
    }

    fn key(&self, property: &str) -> String {
        format!("{}_{}", self.prefix, property)
    }

    fn get(&self, property: &str) -> Option<String> {
        (self.lookup)(&self.key(property)).filter(|v| !v.is_empty())
    }

    fn get_bool(&self, property: &str) -> Result<Option<bool>> {
        match self.get(property) {
            None => Ok(None),
            Some(v) => match v.to_lowercase().as_str() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(self.invalid(property, &v)),
            },
        }
    }

    fn get_parsed<T: std::str::FromStr>(&self, property: &str) -> Result<Option<T>> {
        match self.get(property) {
            None => Ok(None),
            Some(v) => v.parse::<T>().map(Some).map_err(|_| self.invalid(property, &v)),
        }
    }

    fn invalid(&self, property: &str, value: &str) -> RulesetsError {
        RulesetsError::Configuration(format!(
            "invalid value '{}' for {}",
            value,
            self.key(property)
        ))
    }
}
