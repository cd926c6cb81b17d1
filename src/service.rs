/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::service
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Define the transport seam to the remote patch service and
    provide the HTTPS implementation used in production.

  Security / Safety Notes:
    Credentials travel only as HTTP basic auth over the
    configured base URL and are redacted from Debug output.

  Dependencies:
    reqwest for HTTP, async-trait for the transport trait,
    urlencoding for query composition.

  Operational Scope:
    Wrapped by the remote resolution client, which owns retry
    policy; this layer performs exactly one attempt per call.

  Revision History:
    2026-10-17 COD  Introduced PatchService and HTTP transport.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Failures classified once at the transport boundary
    - Host-resolution failures kept distinct from transients
============================================================*/

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use urlencoding::encode;

use crate::config::RemoteConfig;
use crate::error::{Result, SynpatchError};

/// User id and password for the patch service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Classification of a single failed remote attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The service host name could not be resolved. Never retried.
    HostUnreachable { host: String, detail: String },
    /// The service refused the request (authentication, missing resource). Never retried.
    Rejected { status: u16, detail: String },
    /// Anything else: connection resets, timeouts, 5xx, unparseable bodies.
    Transient(String),
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::HostUnreachable { host, detail } => {
                write!(f, "host {host} unreachable: {detail}")
            }
            RemoteFailure::Rejected { status, detail } => {
                write!(f, "rejected with status {status}: {detail}")
            }
            RemoteFailure::Transient(detail) => f.write_str(detail),
        }
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteFailure>;

/// One-shot remote operations offered by the patch service.
#[async_trait]
pub trait PatchService: Send + Sync {
    /// Full catalog of product releases.
    async fn release_catalog(&self, credentials: Option<&Credentials>) -> RemoteResult<String>;

    /// Recommended patches published for a product release.
    async fn recommended_patches(
        &self,
        product_code: &str,
        release_id: &str,
        credentials: Option<&Credentials>,
    ) -> RemoteResult<String>;

    /// Every published variant of a bug number.
    async fn search_patches(
        &self,
        bug: &str,
        credentials: Option<&Credentials>,
    ) -> RemoteResult<String>;

    /// Resolve a raw inventory dump into unique patch ids.
    async fn resolve_inventory(
        &self,
        inventory: &str,
        credentials: &Credentials,
    ) -> RemoteResult<String>;

    /// Submit a conflict-check request document.
    async fn check_conflicts(
        &self,
        request: &str,
        credentials: &Credentials,
    ) -> RemoteResult<String>;

    /// Whether the service accepts the credential pair.
    async fn validate_credentials(&self, credentials: &Credentials) -> RemoteResult<bool>;

    /// Host name used in diagnostics.
    fn host(&self) -> &str;
}

/// HTTPS implementation of [`PatchService`].
#[derive(Clone)]
pub struct HttpPatchService {
    client: reqwest::Client,
    base_url: String,
    host: String,
}

impl HttpPatchService {
    /// Construct a new transport from configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| SynpatchError::Network(format!("Failed to build HTTP client: {err}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let host = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| base_url.clone());

        Ok(Self {
            client,
            base_url,
            host,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/Orion/Services/{path}", self.base_url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        credentials: Option<&Credentials>,
    ) -> RemoteResult<String> {
        let request = match credentials {
            Some(credentials) => request.basic_auth(&credentials.user, Some(credentials.password())),
            None => request,
        };
        let response = request.send().await.map_err(|err| self.classify(err))?;
        let status = response.status();
        if let Some(failure) = classify_status(status) {
            return Err(failure);
        }
        response
            .text()
            .await
            .map_err(|err| RemoteFailure::Transient(format!("Failed to read response body: {err}")))
    }

    fn classify(&self, err: reqwest::Error) -> RemoteFailure {
        if err.is_connect() && is_dns_failure(&err) {
            RemoteFailure::HostUnreachable {
                host: self.host.clone(),
                detail: err.to_string(),
            }
        } else {
            RemoteFailure::Transient(format!("Request to {} failed: {err}", self.host))
        }
    }
}

fn classify_status(status: StatusCode) -> Option<RemoteFailure> {
    if status.is_success() {
        return None;
    }
    let failure = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
            RemoteFailure::Rejected {
                status: status.as_u16(),
                detail: status.canonical_reason().unwrap_or("rejected").to_string(),
            }
        }
        other => RemoteFailure::Transient(format!("Patch service responded with status {other}")),
    };
    Some(failure)
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut source = Some(err as &(dyn std::error::Error + 'static));
    while let Some(current) = source {
        let text = current.to_string().to_ascii_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
        {
            return true;
        }
        source = current.source();
    }
    false
}

#[async_trait]
impl PatchService for HttpPatchService {
    async fn release_catalog(&self, credentials: Option<&Credentials>) -> RemoteResult<String> {
        let url = format!("{}?table=aru_releases", self.url("metadata"));
        self.send(self.client.get(url), credentials).await
    }

    async fn recommended_patches(
        &self,
        product_code: &str,
        release_id: &str,
        credentials: Option<&Credentials>,
    ) -> RemoteResult<String> {
        let url = format!(
            "{}?product={}&release={}&patch_type=all&life_cycle=Recommended",
            self.url("search"),
            encode(product_code),
            encode(release_id)
        );
        self.send(self.client.get(url), credentials).await
    }

    async fn search_patches(
        &self,
        bug: &str,
        credentials: Option<&Credentials>,
    ) -> RemoteResult<String> {
        let url = format!("{}?bug={}", self.url("search"), encode(bug));
        self.send(self.client.get(url), credentials).await
    }

    async fn resolve_inventory(
        &self,
        inventory: &str,
        credentials: &Credentials,
    ) -> RemoteResult<String> {
        let request = self
            .client
            .post(self.url("inventory"))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(inventory.to_string());
        self.send(request, Some(credentials)).await
    }

    async fn check_conflicts(
        &self,
        request: &str,
        credentials: &Credentials,
    ) -> RemoteResult<String> {
        let request = self
            .client
            .post(self.url("conflict_checks"))
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(request.to_string());
        self.send(request, Some(credentials)).await
    }

    async fn validate_credentials(&self, credentials: &Credentials) -> RemoteResult<bool> {
        match self.send(self.client.get(self.url("validate")), Some(credentials)).await {
            Ok(_) => Ok(true),
            Err(RemoteFailure::Rejected { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }

    fn host(&self) -> &str {
        &self.host
    }
}
