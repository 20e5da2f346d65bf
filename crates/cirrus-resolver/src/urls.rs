//! Console URL classification.
//!
//! An input URL is matched against a fixed, mutually-exclusive set of
//! shapes, tried in priority order. The first three are direct API resource
//! paths (host ignored); the rest are web-console pages whose account
//! segment and host identify the owning environment.

use cirrus_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static INSTANCE_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/clouds/(\d+)/instances/[^/]+$").unwrap());
static SERVER_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/(?:deployments/\d+/)?servers/\d+$").unwrap());
static SERVER_ARRAY_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/(?:deployments/\d+/)?server_arrays/\d+$").unwrap());
static INSTANCE_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/acct/(\d+)/clouds/(\d+)/instances/(\d+)$").unwrap());
static SERVER_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/acct/(\d+)/servers/(\d+)$").unwrap());
static SERVER_ARRAY_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/acct/(\d+)/server_arrays/(\d+)$").unwrap());
static REDIRECT_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/acct/(\d+)/redirect_to$").unwrap());

// Console URLs are often pasted as bare paths; parse those against a
// placeholder base and record an empty host.
static RELATIVE_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("https://unspecified.invalid/").unwrap());

/// What a classified URL identifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A direct instance resource path.
    InstanceHref(String),
    /// A server resource path; resolves to its current instance.
    ServerHref(String),
    /// A server-array resource path; resolves to its current instances.
    ServerArrayHref(String),
    /// A legacy console instance page.
    InstancePage {
        /// Page host, used to recover the owning environment.
        host: String,
        /// Account segment.
        account: u64,
        /// Cloud segment.
        cloud: u64,
        /// Legacy numeric instance id.
        legacy_id: u64,
    },
    /// A legacy console server page.
    ServerPage {
        /// Page host.
        host: String,
        /// Account segment.
        account: u64,
        /// Numeric server id.
        server_id: u64,
        /// Optional `instance_id` query parameter; when present the target
        /// is the server's next instance, not its current one.
        instance_id: Option<u64>,
    },
    /// A legacy console server-array page.
    ServerArrayPage {
        /// Page host.
        host: String,
        /// Account segment.
        account: u64,
        /// Numeric array id.
        array_id: u64,
    },
    /// A generic redirect page carrying the target in its query string.
    RedirectPage {
        /// Page host.
        host: String,
        /// Account segment.
        account: u64,
        /// One of `instance`, `server`, `server_array`.
        resource_type: String,
        /// The target resource path.
        resource_uri: String,
    },
}

/// Classify a console URL into a resolution target.
///
/// # Errors
///
/// Returns [`Error::UrlParse`] when the input is not a URL at all and
/// [`Error::UnsupportedUrl`] when it matches none of the known shapes.
pub fn classify(url: &str) -> Result<Target> {
    let (host, path, query) = split_url(url)?;

    if INSTANCE_HREF.is_match(&path) {
        return Ok(Target::InstanceHref(path));
    }
    if SERVER_HREF.is_match(&path) {
        return Ok(Target::ServerHref(path));
    }
    if SERVER_ARRAY_HREF.is_match(&path) {
        return Ok(Target::ServerArrayHref(path));
    }
    if let Some(captures) = INSTANCE_PAGE.captures(&path) {
        return Ok(Target::InstancePage {
            host,
            account: capture_u64(&captures, 1, url)?,
            cloud: capture_u64(&captures, 2, url)?,
            legacy_id: capture_u64(&captures, 3, url)?,
        });
    }
    if let Some(captures) = SERVER_PAGE.captures(&path) {
        let instance_id = match query_value(&query, "instance_id") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| Error::UnsupportedUrl(url.to_string()))?,
            ),
            None => None,
        };
        return Ok(Target::ServerPage {
            host,
            account: capture_u64(&captures, 1, url)?,
            server_id: capture_u64(&captures, 2, url)?,
            instance_id,
        });
    }
    if let Some(captures) = SERVER_ARRAY_PAGE.captures(&path) {
        return Ok(Target::ServerArrayPage {
            host,
            account: capture_u64(&captures, 1, url)?,
            array_id: capture_u64(&captures, 2, url)?,
        });
    }
    if let Some(captures) = REDIRECT_PAGE.captures(&path) {
        let (Some(resource_type), Some(resource_uri)) = (
            query_value(&query, "resource_type"),
            query_value(&query, "resource_uri"),
        ) else {
            return Err(Error::UnsupportedUrl(url.to_string()));
        };
        return Ok(Target::RedirectPage {
            host,
            account: capture_u64(&captures, 1, url)?,
            resource_type: resource_type.to_string(),
            resource_uri: resource_uri.to_string(),
        });
    }

    Err(Error::UnsupportedUrl(url.to_string()))
}

/// The cloud id embedded in a direct instance href, when the href has that
/// shape.
#[must_use]
pub fn cloud_of_instance_href(href: &str) -> Option<u64> {
    INSTANCE_HREF
        .captures(href)
        .and_then(|captures| captures.get(1))
        .and_then(|cloud| cloud.as_str().parse().ok())
}

type QueryPairs = Vec<(String, String)>;

fn split_url(url: &str) -> Result<(String, String, QueryPairs)> {
    match Url::parse(url) {
        Ok(parsed) => Ok((authority_of(&parsed), parsed.path().to_string(), pairs(&parsed))),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let parsed = RELATIVE_BASE.join(url).map_err(|source| Error::UrlParse {
                url: url.to_string(),
                source,
            })?;
            Ok((String::new(), parsed.path().to_string(), pairs(&parsed)))
        }
        Err(source) => Err(Error::UrlParse {
            url: url.to_string(),
            source,
        }),
    }
}

fn authority_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

fn pairs(url: &Url) -> QueryPairs {
    url.query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

fn query_value<'a>(query: &'a QueryPairs, key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

fn capture_u64(captures: &regex::Captures<'_>, index: usize, url: &str) -> Result<u64> {
    captures
        .get(index)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| Error::UnsupportedUrl(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_instance_href() {
        let target = classify("/api/clouds/6/instances/ABC123").unwrap();
        assert_eq!(
            target,
            Target::InstanceHref("/api/clouds/6/instances/ABC123".to_string())
        );
    }

    #[test]
    fn classifies_server_href_with_and_without_deployment() {
        assert_eq!(
            classify("https://us-3.example.com/api/servers/200").unwrap(),
            Target::ServerHref("/api/servers/200".to_string())
        );
        assert_eq!(
            classify("/api/deployments/9/servers/200").unwrap(),
            Target::ServerHref("/api/deployments/9/servers/200".to_string())
        );
    }

    #[test]
    fn classifies_server_array_href() {
        assert_eq!(
            classify("/api/server_arrays/300").unwrap(),
            Target::ServerArrayHref("/api/server_arrays/300".to_string())
        );
    }

    #[test]
    fn classifies_instance_page_with_host() {
        let target = classify("https://us-3.example.com/acct/100/clouds/6/instances/55").unwrap();
        assert_eq!(
            target,
            Target::InstancePage {
                host: "us-3.example.com".to_string(),
                account: 100,
                cloud: 6,
                legacy_id: 55,
            }
        );
    }

    #[test]
    fn classifies_server_page_with_instance_id_query() {
        let target =
            classify("https://us-3.example.com/acct/100/servers/200?instance_id=55").unwrap();
        assert_eq!(
            target,
            Target::ServerPage {
                host: "us-3.example.com".to_string(),
                account: 100,
                server_id: 200,
                instance_id: Some(55),
            }
        );
    }

    #[test]
    fn server_page_without_query_has_no_instance_id() {
        let target = classify("https://us-3.example.com/acct/100/servers/200").unwrap();
        assert_eq!(
            target,
            Target::ServerPage {
                host: "us-3.example.com".to_string(),
                account: 100,
                server_id: 200,
                instance_id: None,
            }
        );
    }

    #[test]
    fn classifies_server_array_page() {
        let target = classify("https://us-3.example.com/acct/100/server_arrays/300").unwrap();
        assert_eq!(
            target,
            Target::ServerArrayPage {
                host: "us-3.example.com".to_string(),
                account: 100,
                array_id: 300,
            }
        );
    }

    #[test]
    fn classifies_redirect_page() {
        let target = classify(
            "https://us-3.example.com/acct/100/redirect_to?resource_type=server_array&resource_uri=/api/server_arrays/300",
        )
        .unwrap();
        assert_eq!(
            target,
            Target::RedirectPage {
                host: "us-3.example.com".to_string(),
                account: 100,
                resource_type: "server_array".to_string(),
                resource_uri: "/api/server_arrays/300".to_string(),
            }
        );
    }

    #[test]
    fn redirect_page_without_queries_is_unsupported() {
        let err = classify("https://us-3.example.com/acct/100/redirect_to").unwrap_err();
        assert!(matches!(err, Error::UnsupportedUrl(_)));
    }

    #[test]
    fn unknown_shape_is_unsupported() {
        let err = classify("https://us-3.example.com/acct/100/volumes/7").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing URL: https://us-3.example.com/acct/100/volumes/7: unsupported URL format"
        );
    }

    #[test]
    fn unparseable_url_fails_fast() {
        let err = classify("https://").unwrap_err();
        assert!(matches!(err, Error::UrlParse { .. }));
    }

    #[test]
    fn host_includes_port() {
        let target = classify("http://127.0.0.1:8080/acct/100/servers/200").unwrap();
        assert_eq!(
            target,
            Target::ServerPage {
                host: "127.0.0.1:8080".to_string(),
                account: 100,
                server_id: 200,
                instance_id: None,
            }
        );
    }

    #[test]
    fn extracts_cloud_from_instance_href() {
        assert_eq!(cloud_of_instance_href("/api/clouds/6/instances/XYZ"), Some(6));
        assert_eq!(cloud_of_instance_href("/api/servers/1"), None);
    }
}
