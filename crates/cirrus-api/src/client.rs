//! Asynchronous clients for the cloud-management API.
//!
//! Both generations share the same session machinery: a reqwest client, a
//! base URL, a generation version header, and an OAuth access token minted
//! lazily from the environment's refresh token. The typed methods are thin
//! wrappers over a generic JSON GET path.

use cirrus_core::types::{Instance, LegacyInstance, Server, ServerArray, View};
use cirrus_core::{Error, Result};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("cirrus-api/", env!("CARGO_PKG_VERSION"));

/// Version header value for the modern API generation.
pub const MODERN_API_VERSION: &str = "1.5";

/// Version header value for the legacy API generation.
pub const LEGACY_API_VERSION: &str = "1.6";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 30;

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
}

/// Shared session state: HTTP client, endpoint, and cached access token.
struct ApiSession {
    http: reqwest::Client,
    base_url: Url,
    api_version: &'static str,
    refresh_token: SecretString,
    access_token: RwLock<Option<String>>,
}

impl ApiSession {
    fn new(
        base_url: Url,
        api_version: &'static str,
        refresh_token: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| Error::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            api_version,
            refresh_token,
            access_token: RwLock::new(None),
        })
    }

    /// Exchange the refresh token for an access token, caching the result
    /// for the session's lifetime.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.access_token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut slot = self.access_token.write().await;
        // Another caller may have won the race while we waited.
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let url = self
            .base_url
            .join("/api/oauth2")
            .map_err(|err| Error::Auth(err.to_string()))?;

        debug!(%url, version = self.api_version, "exchanging refresh token");

        let response = self
            .http
            .post(url)
            .header("X-Api-Version", self.api_version)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": self.refresh_token.expose_secret(),
            }))
            .send()
            .await
            .map_err(|err| Error::Auth(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token exchange returned {status}: {text}"
            )));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|err| Error::Auth(format!("malformed token grant: {err}")))?;

        *slot = Some(grant.access_token.clone());
        Ok(grant.access_token)
    }

    async fn get_json<T>(&self, href: &str, query: &[(&'static str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let token = self.access_token().await?;
        let url = self
            .base_url
            .join(href)
            .map_err(|err| Error::Http(format!("invalid href {href}: {err}")))?;

        debug!(%url, version = self.api_version, "GET");

        let response = self
            .http
            .get(url)
            .query(query)
            .header("X-Api-Version", self.api_version)
            .header("Accept", "application/json")
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|err| Error::Http(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status_to_error(status, text));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| Error::Parse(format!("{href}: {err}")))
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("API authentication failed: {text}"))
        }
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::Unavailable(format!("API temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::Unavailable(format!("API server error {status}: {text}"))
        }
        _ => Error::Http(format!("API error {status}: {text}")),
    }
}

/// Client for the modern API generation (resources by href).
pub struct CmClient {
    session: ApiSession,
}

impl CmClient {
    /// Create a client for the endpoint, authenticating with the refresh
    /// token on first use.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(base_url: Url, refresh_token: SecretString) -> Result<Self> {
        Self::with_timeout(base_url, refresh_token, Duration::from_secs(DEFAULT_TIMEOUT))
    }

    /// Same as [`CmClient::new`] with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn with_timeout(
        base_url: Url,
        refresh_token: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            session: ApiSession::new(base_url, MODERN_API_VERSION, refresh_token, timeout)?,
        })
    }

    /// The endpoint this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.session.base_url
    }

    /// Fetch a single instance by href, in the requested view.
    pub async fn show_instance(&self, href: &str, view: View) -> Result<Instance> {
        self.session.get_json(href, &view.query()).await
    }

    /// Fetch an instance collection by href, in the requested view.
    pub async fn list_instances(&self, href: &str, view: View) -> Result<Vec<Instance>> {
        self.session.get_json(href, &view.query()).await
    }

    /// Fetch a server by href.
    pub async fn show_server(&self, href: &str) -> Result<Server> {
        self.session.get_json(href, &[]).await
    }

    /// Fetch a server array by href.
    pub async fn show_server_array(&self, href: &str) -> Result<ServerArray> {
        self.session.get_json(href, &[]).await
    }
}

/// Client for the legacy API generation (collections with legacy ids).
pub struct LegacyClient {
    session: ApiSession,
}

impl LegacyClient {
    /// Create a legacy-generation client.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(base_url: Url, refresh_token: SecretString) -> Result<Self> {
        Ok(Self {
            session: ApiSession::new(
                base_url,
                LEGACY_API_VERSION,
                refresh_token,
                Duration::from_secs(DEFAULT_TIMEOUT),
            )?,
        })
    }

    /// Fetch an instance collection, with each entry carrying its legacy id.
    pub async fn list_instances(&self, href: &str) -> Result<Vec<LegacyInstance>> {
        self.session.get_json(href, &[]).await
    }
}
