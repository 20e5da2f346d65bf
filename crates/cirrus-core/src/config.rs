//! Login configuration.
//!
//! The configuration file is YAML, keyed under `login`:
//!
//! ```yaml
//! login:
//!   default_environment: production
//!   environments:
//!     production:
//!       account: 12345
//!       host: us-3.example.com
//!       refresh_token: "abcdef..."
//! ```
//!
//! Refresh tokens are held as [`SecretString`] and never logged or written
//! back out.

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the home directory.
pub const CONFIG_FILE_NAME: &str = ".cirrus-rdp.yml";

/// One configured account/endpoint pair.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Account number the credentials belong to.
    pub account: u64,
    /// API endpoint host, e.g. `us-3.example.com`. A full URL with scheme
    /// is also accepted (useful against local test servers).
    pub host: String,
    /// OAuth refresh token used to mint API sessions.
    pub refresh_token: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
struct LoginConfig {
    default_environment: String,
    #[serde(default)]
    environments: HashMap<String, EnvironmentConfig>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    login: LoginConfig,
}

impl Config {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file cannot be read or parsed and
    /// [`Error::NoDefaultEnvironment`] when `default_environment` names a
    /// missing entry.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        Self::parse(&raw)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Config::load`], minus the file read.
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(raw).map_err(|err| Error::Config(err.to_string()))?;

        if !config
            .login
            .environments
            .contains_key(&config.login.default_environment)
        {
            return Err(Error::NoDefaultEnvironment(
                config.login.default_environment.clone(),
            ));
        }

        Ok(config)
    }

    /// The default configuration file path (`~/.cirrus-rdp.yml`), falling
    /// back to the bare file name when no home directory is known.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(CONFIG_FILE_NAME)
    }

    /// Name of the default environment.
    #[must_use]
    pub fn default_environment_name(&self) -> &str {
        &self.login.default_environment
    }

    /// The default environment's settings.
    ///
    /// # Panics
    ///
    /// Never in practice: parsing verifies the default entry exists.
    #[must_use]
    pub fn default_environment(&self) -> &EnvironmentConfig {
        &self.login.environments[&self.login.default_environment]
    }

    /// All configured environments, keyed by name.
    #[must_use]
    pub fn environments(&self) -> &HashMap<String, EnvironmentConfig> {
        &self.login.environments
    }
}
