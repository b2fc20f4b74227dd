//! Request authenticators
//!
//! Every request passes through an [`Authenticator`] before it is sent. The
//! service accepts API keys exchanged for IAM access tokens; the other
//! authenticators cover static tokens, basic credentials, and unauthenticated
//! test servers.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{Result, RulesetsError};

pub const AUTHTYPE_NOAUTH: &str = "noauth";
pub const AUTHTYPE_BASIC: &str = "basic";
pub const AUTHTYPE_BEARER_TOKEN: &str = "bearertoken";
pub const AUTHTYPE_IAM: &str = "iam";

/// Default IAM token service
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

const IAM_TOKEN_PATH: &str = "/identity/token";
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Adds credentials to outgoing requests
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Short name used by the `*_AUTH_TYPE` configuration property
    fn auth_type(&self) -> &'static str;

    /// Checks the authenticator's configuration before it is used
    fn validate(&self) -> Result<()>;

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()>;
}

/// Credential values must not be wrapped in braces or quotes; this usually
/// means a template placeholder was left in the configuration.
fn has_bad_first_or_last_char(value: &str) -> bool {
    value.starts_with(['{', '"']) || value.ends_with(['}', '"'])
}

fn check_property(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(RulesetsError::Configuration(format!(
            "the '{}' property is required but was not specified",
            name
        )));
    }
    if has_bad_first_or_last_char(value) {
        return Err(RulesetsError::Configuration(format!(
            "the '{}' property value should not have enclosing braces or quotes",
            name
        )));
    }
    Ok(())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RulesetsError::Authentication(format!("invalid authorization header: {}", e)))
}

// ==================== No auth ====================

/// Sends requests without credentials
#[derive(Debug, Clone, Default)]
pub struct NoAuthAuthenticator;

#[async_trait]
impl Authenticator for NoAuthAuthenticator {
    fn auth_type(&self) -> &'static str {
        AUTHTYPE_NOAUTH
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn authenticate(&self, _headers: &mut HeaderMap) -> Result<()> {
        Ok(())
    }
}

// ==================== Basic ====================

/// HTTP basic authentication
#[derive(Clone)]
pub struct BasicAuthenticator {
    username: String,
    password: String,
}

impl BasicAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let auth = Self {
            username: username.into(),
            password: password.into(),
        };
        auth.validate()?;
        Ok(auth)
    }
}

impl fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    fn auth_type(&self) -> &'static str {
        AUTHTYPE_BASIC
    }

    fn validate(&self) -> Result<()> {
        check_property("Username", &self.username)?;
        check_property("Password", &self.password)
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        headers.insert(AUTHORIZATION, header_value(&format!("Basic {}", encoded))?);
        Ok(())
    }
}

// ==================== Bearer token ====================

/// Sends a caller-managed bearer token
#[derive(Clone)]
pub struct BearerTokenAuthenticator {
    bearer_token: String,
}

impl BearerTokenAuthenticator {
    pub fn new(bearer_token: impl Into<String>) -> Result<Self> {
        let auth = Self {
            bearer_token: bearer_token.into(),
        };
        auth.validate()?;
        Ok(auth)
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    fn auth_type(&self) -> &'static str {
        AUTHTYPE_BEARER_TOKEN
    }

    fn validate(&self) -> Result<()> {
        if self.bearer_token.is_empty() {
            return Err(RulesetsError::Configuration(
                "the 'BearerToken' property is required but was not specified".to_string(),
            ));
        }
        Ok(())
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", self.bearer_token))?,
        );
        Ok(())
    }
}

// ==================== IAM ====================

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    /// Lifetime in seconds
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
    expires_at: Instant,
}

impl CachedToken {
    fn from_response(resp: IamTokenResponse, now: Instant) -> Self {
        let lifetime = Duration::from_secs(resp.expires_in);
        Self {
            access_token: resp.access_token,
            // Refresh once 80% of the lifetime has passed
            refresh_at: now + lifetime.mul_f64(0.8),
            expires_at: now + lifetime,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_at && now < self.expires_at
    }
}

/// Exchanges an API key for IAM access tokens and caches them
pub struct IamAuthenticator {
    apikey: String,
    url: String,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl IamAuthenticator {
    pub fn new(apikey: impl Into<String>) -> Result<Self> {
        Self::with_url(apikey, DEFAULT_IAM_URL)
    }

    /// Use a non-default token service, e.g. a staging IAM endpoint
    pub fn with_url(apikey: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let auth = Self {
            apikey: apikey.into(),
            url: url.into().trim_end_matches('/').to_string(),
            http,
            token: Mutex::new(None),
        };
        auth.validate()?;
        Ok(auth)
    }

    async fn request_token(&self) -> Result<IamTokenResponse> {
        let url = format!("{}{}", self.url, IAM_TOKEN_PATH);
        tracing::debug!(url = %url, "Requesting IAM access token");

        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", self.apikey.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RulesetsError::Authentication(format!(
                "IAM token request failed with status {}: {}",
                status, body
            )));
        }

        resp.json::<IamTokenResponse>()
            .await
            .map_err(|e| RulesetsError::Authentication(format!("invalid IAM token response: {}", e)))
    }

    /// Returns a cached token, fetching a new one when the cached one is stale.
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let resp = self.request_token().await?;
        let token = CachedToken::from_response(resp, Instant::now());
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }
}

impl fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for IamAuthenticator {
    fn auth_type(&self) -> &'static str {
        AUTHTYPE_IAM
    }

    fn validate(&self) -> Result<()> {
        check_property("ApiKey", &self.apikey)?;
        if self.url.is_empty() {
            return Err(RulesetsError::Configuration(
                "the 'URL' property is required but was not specified".to_string(),
            ));
        }
        Ok(())
    }

    async fn authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        let token = self.access_token().await?;
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        Ok(())
    }
}
