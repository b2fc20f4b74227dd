//! Shared request path for every service operation
//!
//! A [`BaseService`] turns a [`ServiceRequest`] into one HTTP exchange:
//! URL construction, headers, authentication, optional gzip of the body,
//! optional retries, and an optional deadline covering the whole call.

use flate2::{write::GzEncoder, Compression};
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_ENCODING, CONTENT_TYPE, RETRY_AFTER,
    USER_AGENT,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use crate::auth::Authenticator;
use crate::error::{Result, RulesetsError};

/// Overall timeout of a single HTTP attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SDK_USER_AGENT: &str = concat!("rulesets-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Retry settings used once retries are enabled
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry
    pub min_retry_interval: Duration,
    /// Upper bound on any single delay, including `Retry-After`
    pub max_retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            min_retry_interval: Duration::from_secs(1),
            max_retry_interval: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given limits; zero values fall back to the defaults.
    pub fn new(max_retries: u32, max_retry_interval: Duration) -> Self {
        let defaults = Self::default();
        Self {
            max_retries: if max_retries == 0 {
                defaults.max_retries
            } else {
                max_retries
            },
            max_retry_interval: if max_retry_interval.is_zero() {
                defaults.max_retry_interval
            } else {
                max_retry_interval
            },
            ..defaults
        }
    }

    /// Exponential backoff with jitter for the given (0-based) retry attempt
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self
            .min_retry_interval
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_retry_interval);
        let jitter_max = (base.as_millis() as u64 / 2).max(1);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..jitter_max));
        (base + jitter).min(self.max_retry_interval)
    }

    /// Delay requested by the server through a numeric `Retry-After` header
    fn retry_after(&self, headers: &HeaderMap) -> Option<Duration> {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(self.max_retry_interval))
    }
}

/// Statuses worth retrying: throttling and server errors other than 501
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// A response whose body was mapped to `T`
#[derive(Debug, Clone)]
pub struct DetailedResponse<T> {
    pub status_code: u16,
    pub headers: HeaderMap,
    /// `None` when the service answered with an empty body
    pub result: Option<T>,
}

/// One operation's HTTP request before it is sent
#[derive(Debug)]
pub struct ServiceRequest {
    method: Method,
    path_segments: Vec<String>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl ServiceRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path_segments: Vec::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Append path segments; each one is percent-encoded on its own.
    pub fn path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_segments.extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn headers(mut self, headers: &HashMap<String, String>) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body).map_err(RulesetsError::Serialization)?);
        Ok(self)
    }
}

/// Transport settings shared by every operation of a service client
#[derive(Debug, Clone)]
pub struct BaseService {
    http: reqwest::Client,
    authenticator: Arc<dyn Authenticator>,
    service_url: String,
    default_headers: HeaderMap,
    enable_gzip: bool,
    disable_ssl_verification: bool,
    retry: Option<RetryPolicy>,
    deadline: Option<Instant>,
}

impl BaseService {
    pub fn new(service_url: impl Into<String>, authenticator: Arc<dyn Authenticator>) -> Result<Self> {
        authenticator.validate()?;
        let mut service = Self {
            http: build_http_client(false)?,
            authenticator,
            service_url: String::new(),
            default_headers: HeaderMap::new(),
            enable_gzip: false,
            disable_ssl_verification: false,
            retry: None,
            deadline: None,
        };
        service.set_service_url(service_url)?;
        Ok(service)
    }

    /// Set the base URL; an empty URL is accepted but every request will fail.
    pub fn set_service_url(&mut self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        if url.starts_with(['{', '"']) || url.ends_with(['}', '"']) {
            return Err(RulesetsError::Configuration(
                "the 'URL' property value should not have enclosing braces or quotes".to_string(),
            ));
        }
        self.service_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.default_headers = headers;
    }

    pub fn set_enable_gzip_compression(&mut self, enable: bool) {
        self.enable_gzip = enable;
    }

    pub fn enable_gzip_compression(&self) -> bool {
        self.enable_gzip
    }

    pub fn enable_retries(&mut self, policy: RetryPolicy) {
        self.retry = Some(policy);
    }

    pub fn disable_retries(&mut self) {
        self.retry = None;
    }

    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// Skip TLS certificate verification (test servers with self-signed certs)
    pub fn set_disable_ssl_verification(&mut self, disable: bool) -> Result<()> {
        self.http = build_http_client(disable)?;
        self.disable_ssl_verification = disable;
        Ok(())
    }

    pub fn disable_ssl_verification(&self) -> bool {
        self.disable_ssl_verification
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Send `request` and map a successful JSON body to `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: ServiceRequest,
    ) -> Result<DetailedResponse<T>> {
        let raw = self.request_raw(request).await?;
        let result = if raw.body.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            let parsed = serde_json::from_slice::<T>(&raw.body).map_err(|source| {
                RulesetsError::ResponseProcessing {
                    status_code: raw.status_code,
                    source,
                }
            })?;
            Some(parsed)
        };

        Ok(DetailedResponse {
            status_code: raw.status_code,
            headers: raw.headers,
            result,
        })
    }

    /// Send `request` for operations that return no result; any body is ignored.
    pub async fn request_no_content(&self, request: ServiceRequest) -> Result<DetailedResponse<()>> {
        let raw = self.request_raw(request).await?;
        Ok(DetailedResponse {
            status_code: raw.status_code,
            headers: raw.headers,
            result: None,
        })
    }

    async fn request_raw(&self, request: ServiceRequest) -> Result<RawResponse> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.execute(request))
                .await
                .map_err(|_| RulesetsError::DeadlineExceeded)?,
            None => self.execute(request).await,
        }
    }

    async fn execute(&self, request: ServiceRequest) -> Result<RawResponse> {
        let url = self.build_url(&request.path_segments)?;
        let (headers, body) = self.prepare(&request).await?;

        let max_attempts = self.retry.as_ref().map_or(1, |p| p.max_retries + 1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                method = %request.method,
                url = %url,
                attempt,
                max_attempts,
                "Sending request"
            );

            let mut builder = self
                .http
                .request(request.method.clone(), url.clone())
                .headers(headers.clone());
            if let Some(body) = &body {
                builder = builder.body(body.clone());
            }

            let delay = match builder.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    match &self.retry {
                        Some(policy) if attempt < max_attempts && is_retryable_status(status) => {
                            policy
                                .retry_after(resp.headers())
                                .unwrap_or_else(|| policy.backoff(attempt - 1))
                        }
                        _ => return read_response(resp).await,
                    }
                }
                Err(err) => match &self.retry {
                    Some(policy) if attempt < max_attempts && (err.is_connect() || err.is_timeout()) => {
                        policy.backoff(attempt - 1)
                    }
                    _ => return Err(RulesetsError::Transport(err)),
                },
            };

            tracing::warn!(
                method = %request.method,
                url = %url,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn build_url(&self, segments: &[String]) -> Result<Url> {
        if self.service_url.is_empty() {
            return Err(RulesetsError::MissingServiceUrl);
        }
        let mut url = Url::parse(&self.service_url)
            .map_err(|e| RulesetsError::InvalidUrl(format!("{}: {}", self.service_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| RulesetsError::InvalidUrl(format!("{}: cannot be a base", self.service_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Final header set and (possibly compressed) body of a request
    async fn prepare(&self, request: &ServiceRequest) -> Result<(HeaderMap, Option<Vec<u8>>)> {
        let mut headers = self.default_headers.clone();
        headers.insert(USER_AGENT, HeaderValue::from_static(SDK_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut body = request.body.clone();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if self.enable_gzip {
            if let Some(raw) = body.take() {
                body = Some(gzip(&raw)?);
                headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            }
        }

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                RulesetsError::Configuration(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                RulesetsError::Configuration(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        self.authenticator.authenticate(&mut headers).await?;
        Ok((headers, body))
    }
}

fn build_http_client(disable_ssl: bool) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .gzip(true)
        .danger_accept_invalid_certs(disable_ssl)
        .build()?;
    Ok(client)
}

fn gzip(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

/// Status, headers, and body of a 2xx response
struct RawResponse {
    status_code: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// Reads the body and turns non-2xx statuses into service errors
async fn read_response(resp: reqwest::Response) -> Result<RawResponse> {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.bytes().await?.to_vec();

    if status.is_success() {
        return Ok(RawResponse {
            status_code: status.as_u16(),
            headers,
            body,
        });
    }

    let json: Option<serde_json::Value> = serde_json::from_slice(&body).ok();
    let message = json
        .as_ref()
        .and_then(error_message)
        .or_else(|| {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string()
        });

    tracing::debug!(status = status.as_u16(), message = %message, "Service returned an error");

    Err(RulesetsError::Service {
        status_code: status.as_u16(),
        message,
        headers,
        body: json,
    })
}

/// First human-readable message in an error body.
///
/// Understands the service's `errors[].message` envelope as well as plain
/// `error`/`message` fields.
fn error_message(body: &serde_json::Value) -> Option<String> {
    if let Some(msg) = body
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|e| e.first())
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(msg.to_string());
    }
    ["error", "message", "errorMessage"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
