//! Environments: one account/endpoint pair and its cached API sessions.
//!
//! An [`Environment`] lazily builds one client per API generation and keeps
//! it for the process lifetime; all handles resolved under the same account
//! share the same clients. [`Environments`] is the configured set, used to
//! recover the owning environment from a console page's account and host.

use crate::client::{CmClient, LegacyClient};
use cirrus_core::config::{Config, EnvironmentConfig};
use cirrus_core::{Error, Result};
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// One account/endpoint pair with lazily created API sessions.
pub struct Environment {
    account: u64,
    base_url: Url,
    authority: String,
    refresh_token: SecretString,
    modern: Mutex<Option<Arc<CmClient>>>,
    legacy: Mutex<Option<Arc<LegacyClient>>>,
}

impl Environment {
    /// Build an environment from its configuration entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the configured host is not a valid
    /// endpoint.
    pub fn new(config: &EnvironmentConfig) -> Result<Self> {
        let base_url = endpoint_url(&config.host)?;
        let authority = authority_of(&base_url);

        Ok(Self {
            account: config.account,
            base_url,
            authority,
            refresh_token: config.refresh_token.clone(),
            modern: Mutex::new(None),
            legacy: Mutex::new(None),
        })
    }

    /// The account number this environment authenticates as.
    #[must_use]
    pub fn account(&self) -> u64 {
        self.account
    }

    /// The endpoint URL API requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `host[:port]` this environment serves, as it appears in console
    /// page URLs.
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The modern-generation client, created on first use and cached.
    ///
    /// Two calls on the same environment return the identical client.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built.
    pub fn client(&self) -> Result<Arc<CmClient>> {
        let mut slot = self.modern.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(CmClient::new(
            self.base_url.clone(),
            self.refresh_token.clone(),
        )?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// The legacy-generation client, created on first use and cached.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built.
    pub fn legacy_client(&self) -> Result<Arc<LegacyClient>> {
        let mut slot = self.legacy.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(LegacyClient::new(
            self.base_url.clone(),
            self.refresh_token.clone(),
        )?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("account", &self.account)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn endpoint_url(host: &str) -> Result<Url> {
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    Url::parse(&raw).map_err(|err| Error::Config(format!("invalid API host {host}: {err}")))
}

fn authority_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// The configured set of environments.
pub struct Environments {
    default_name: String,
    environments: HashMap<String, Arc<Environment>>,
}

impl Environments {
    /// Build all environments from a parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when any configured host is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let environments = config
            .environments()
            .iter()
            .map(|(name, entry)| Ok((name.clone(), Arc::new(Environment::new(entry)?))))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self {
            default_name: config.default_environment_name().to_string(),
            environments,
        })
    }

    /// The default environment selected by the configuration.
    ///
    /// # Panics
    ///
    /// Never in practice: config parsing verifies the default entry exists.
    #[must_use]
    pub fn default_environment(&self) -> Arc<Environment> {
        Arc::clone(&self.environments[&self.default_name])
    }

    /// Recover the environment a console page belongs to from its account
    /// number and host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoEnvironment`] when no configured entry matches.
    pub fn for_account(&self, account: u64, host: &str) -> Result<Arc<Environment>> {
        self.environments
            .values()
            .find(|env| env.account() == account && env.authority() == host)
            .map(Arc::clone)
            .ok_or_else(|| Error::NoEnvironment {
                account,
                host: host.to_string(),
            })
    }
}
