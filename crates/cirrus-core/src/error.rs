//! Error types for the resolution and launch pipeline.
//!
//! One error enum covers the whole workspace: input errors (bad URLs),
//! lookup errors (API failures, missing links, bad indices), convergence
//! errors (readiness timeout), and configuration errors. Every variant
//! carries the identifier it failed on.

use std::time::Duration;
use thiserror::Error;

/// Main error type for cirrus-rdp operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The input string could not be parsed as a URL
    #[error("error parsing URL: {url}: {source}")]
    UrlParse {
        /// The offending input
        url: String,
        /// The underlying parse failure
        #[source]
        source: url::ParseError,
    },

    /// The URL parsed but matched none of the known console shapes
    #[error("error parsing URL: {0}: unsupported URL format")]
    UnsupportedUrl(String),

    /// A redirect page carried an unknown `resource_type` query value
    #[error("unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// An API lookup failed; wraps the transport error with the resource
    /// kind and href being fetched
    #[error("error retrieving {what}: {href}: {source}")]
    Lookup {
        /// Resource kind ("instance", "server", "array", "array instances")
        what: &'static str,
        /// The href that was being fetched
        href: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// A server resource carried no `current_instance` link
    #[error("error retrieving server: {0}: server has no current instance")]
    NoCurrentInstance(String),

    /// A server resource carried no `next_instance` link
    #[error("error retrieving server: {0}: server has no next instance")]
    NoNextInstance(String),

    /// A legacy-id scan of an instance collection found no match
    #[error("could not find instance with legacy ID: {0}")]
    LegacyIdNotFound(u64),

    /// No configured environment matches a console page's account and host
    #[error("no environment configured for account {account} on host {host}")]
    NoEnvironment {
        /// The account number recovered from the page path
        account: u64,
        /// The host the page belongs to
        host: String,
    },

    /// The requested interface index does not exist on the instance
    #[error("interface index out of bounds: {index}: instance {href} {addresses:?}")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// The instance's self href
        href: String,
        /// The full address list the index was applied to
        addresses: Vec<String>,
    },

    /// Readiness was not reached before the timeout fired
    #[error("timeout waiting for IP address and/or Administrator password: {timeout:?}: {href}")]
    Timeout {
        /// The configured timeout
        timeout: Duration,
        /// The instance's self href
        href: String,
    },

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// The configured default environment name has no entry
    #[error("could not find default environment: {0}")]
    NoDefaultEnvironment(String),

    /// OAuth token exchange failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API returned 404 for the requested resource
    #[error("not found: {0}")]
    NotFound(String),

    /// The API is temporarily unavailable (429/5xx)
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Any other HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The API response body could not be deserialized
    #[error("failed to parse API response: {0}")]
    Parse(String),

    /// The remote desktop client could not be launched
    #[error("error launching remote desktop client: {0}")]
    Launch(String),
}

/// Specialized result type for cirrus-rdp operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a lookup failure with the resource kind and href it was for.
    #[must_use]
    pub fn lookup(what: &'static str, href: impl Into<String>, source: Error) -> Self {
        Self::Lookup {
            what,
            href: href.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_wraps_source_with_context() {
        let err = Error::lookup(
            "server",
            "/api/servers/42",
            Error::NotFound("gone".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "error retrieving server: /api/servers/42: not found: gone"
        );
    }

    #[test]
    fn missing_current_instance_message() {
        let err = Error::NoCurrentInstance("/api/servers/42".to_string());
        assert!(err.to_string().contains("server has no current instance"));
    }

    #[test]
    fn out_of_bounds_carries_index_and_addresses() {
        let err = Error::IndexOutOfBounds {
            index: 2,
            href: "/api/clouds/6/instances/ABC".to_string(),
            addresses: vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("interface index out of bounds: 2"));
        assert!(message.contains("/api/clouds/6/instances/ABC"));
        assert!(message.contains("10.0.0.2"));
    }

    #[test]
    fn legacy_id_message() {
        let err = Error::LegacyIdNotFound(55);
        assert_eq!(err.to_string(), "could not find instance with legacy ID: 55");
    }
}
