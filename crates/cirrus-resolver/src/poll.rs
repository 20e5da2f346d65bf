//! Readiness polling.
//!
//! Drives an instance handle through repeated refresh until it has a usable
//! network address and, unless a login prompt will be shown, an initial
//! credential. The whole loop races a single timeout armed at entry; when
//! the timer wins, the in-flight refresh future is dropped rather than
//! abandoned.

use crate::handle::Handle;
use crate::resolve::instance_by_href;
use cirrus_core::types::AddressKind;
use cirrus_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Parameters for one readiness wait.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Which address family to probe.
    pub kind: AddressKind,
    /// Interface index within the selected address list.
    pub index: usize,
    /// Whether a login prompt will be shown (when true the credential is
    /// not waited for).
    pub prompt: bool,
    /// Overall deadline for reaching readiness.
    pub timeout: Duration,
    /// Delay between refresh attempts.
    pub interval: Duration,
}

enum Readiness {
    Ready,
    NotReady,
}

fn check(handle: &Handle, opts: &WaitOptions) -> Result<Readiness> {
    let addresses = handle.instance().addresses(opts.kind);

    // An empty list means the cloud has not assigned addresses yet; a
    // non-empty list that the index misses can never become valid by
    // waiting.
    if addresses.is_empty() {
        return Ok(Readiness::NotReady);
    }
    if opts.index >= addresses.len() {
        return Err(Error::IndexOutOfBounds {
            index: opts.index,
            href: handle.href().to_string(),
            addresses: addresses.to_vec(),
        });
    }

    if opts.prompt || handle.admin_password().is_some() {
        return Ok(Readiness::Ready);
    }
    Ok(Readiness::NotReady)
}

/// Poll the handle until it is ready, refreshing it in place between
/// attempts, bounded by the timeout in `opts`.
///
/// Refresh attempts for one handle are strictly sequential; the timeout
/// timer runs concurrently and whichever finishes first determines the
/// outcome.
///
/// # Errors
///
/// [`Error::IndexOutOfBounds`] immediately for an index that can never
/// become valid, [`Error::Timeout`] when the deadline fires first, or any
/// refresh error, propagated.
pub async fn wait_ready(handle: &mut Handle, opts: &WaitOptions) -> Result<()> {
    let href = handle.href().to_string();
    let environment = Arc::clone(handle.environment());

    let deadline = sleep(opts.timeout);
    tokio::pin!(deadline);

    loop {
        match check(handle, opts)? {
            Readiness::Ready => return Ok(()),
            Readiness::NotReady => {}
        }

        info!(
            instance = %href,
            interval = ?opts.interval,
            "waiting for IP address and/or Administrator password"
        );

        tokio::select! {
            () = &mut deadline => {
                return Err(Error::Timeout { timeout: opts.timeout, href: href.clone() });
            }
            () = sleep(opts.interval) => {}
        }

        tokio::select! {
            () = &mut deadline => {
                return Err(Error::Timeout { timeout: opts.timeout, href: href.clone() });
            }
            fresh = instance_by_href(&environment, &href, opts.prompt) => {
                handle.replace(fresh?.into_instance());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_api::{Environment, Environments};
    use cirrus_core::config::{Config, EnvironmentConfig};
    use cirrus_core::types::{Instance, Link, LinkTable};
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HREF: &str = "/api/clouds/6/instances/ABC";

    fn offline_environment() -> Arc<Environment> {
        // Points at a closed port: any refresh attempt would error out.
        Arc::new(
            Environment::new(&EnvironmentConfig {
                account: 100,
                host: "http://127.0.0.1:1".to_string(),
                refresh_token: SecretString::from("token".to_string()),
            })
            .unwrap(),
        )
    }

    fn mock_environment(server: &MockServer) -> Arc<Environment> {
        let config = Config::parse(&format!(
            r"
login:
  default_environment: testing
  environments:
    testing:
      account: 100
      host: {}
      refresh_token: refresh-abc
",
            server.uri()
        ))
        .unwrap();
        Environments::from_config(&config).unwrap().default_environment()
    }

    fn test_instance(addresses: &[&str], password: Option<&str>) -> Instance {
        Instance {
            links: LinkTable(vec![Link {
                rel: "self".to_string(),
                href: HREF.to_string(),
            }]),
            public_ip_addresses: addresses.iter().map(ToString::to_string).collect(),
            admin_password: password.map(ToString::to_string),
            ..Instance::default()
        }
    }

    fn options(prompt: bool, timeout_ms: u64, interval_ms: u64) -> WaitOptions {
        WaitOptions {
            kind: AddressKind::Public,
            index: 0,
            prompt,
            timeout: Duration::from_millis(timeout_ms),
            interval: Duration::from_millis(interval_ms),
        }
    }

    #[tokio::test]
    async fn ready_at_construction_never_refreshes() {
        let mut handle = Handle::new(test_instance(&["203.0.113.7"], None), offline_environment());

        // prompt=true: an address alone is enough; any refresh would fail
        // against the offline environment.
        wait_ready(&mut handle, &options(true, 1_000, 10)).await.unwrap();
    }

    #[tokio::test]
    async fn ready_with_password_and_no_prompt() {
        let mut handle = Handle::new(
            test_instance(&["203.0.113.7"], Some("hunter2")),
            offline_environment(),
        );
        wait_ready(&mut handle, &options(false, 1_000, 10)).await.unwrap();
    }

    #[tokio::test]
    async fn times_out_when_no_address_appears() {
        let mut handle = Handle::new(test_instance(&[], None), offline_environment());

        let started = Instant::now();
        // Timeout shorter than the interval: the deadline must win during
        // the first sleep, never before the timeout itself.
        let err = wait_ready(&mut handle, &options(true, 60, 400)).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, Error::Timeout { .. }));
        assert!(err.to_string().contains(HREF));
        assert!(elapsed >= Duration::from_millis(60), "timed out early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "waited a full interval: {elapsed:?}");
    }

    #[tokio::test]
    async fn out_of_bounds_index_fails_immediately() {
        let mut handle = Handle::new(
            test_instance(&["203.0.113.1", "203.0.113.2"], None),
            offline_environment(),
        );

        let mut opts = options(true, 60_000, 30_000);
        opts.index = 2;

        let started = Instant::now();
        let err = wait_ready(&mut handle, &opts).await.unwrap_err();

        assert!(matches!(err, Error::IndexOutOfBounds { index: 2, .. }));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn refreshes_until_password_appears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "token"})),
            )
            .mount(&server)
            .await;

        // First refresh still has no password; the one after does.
        Mock::given(method("GET"))
            .and(path(HREF))
            .and(query_param("view", "sensitive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "links": [{"rel": "self", "href": HREF}],
                "public_ip_addresses": ["203.0.113.7"],
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(HREF))
            .and(query_param("view", "sensitive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "links": [{"rel": "self", "href": HREF}],
                "public_ip_addresses": ["203.0.113.7"],
                "admin_password": "hunter2",
            })))
            .mount(&server)
            .await;

        let environment = mock_environment(&server);
        let mut handle = Handle::new(test_instance(&["203.0.113.7"], None), Arc::clone(&environment));

        wait_ready(&mut handle, &options(false, 5_000, 10)).await.unwrap();

        assert_eq!(handle.admin_password(), Some("hunter2"));
        assert!(Arc::ptr_eq(handle.environment(), &environment));
    }

    #[tokio::test]
    async fn refresh_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "token"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(HREF))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let environment = mock_environment(&server);
        let mut handle = Handle::new(test_instance(&[], None), environment);

        let err = wait_ready(&mut handle, &options(false, 5_000, 10)).await.unwrap_err();
        assert!(matches!(err, Error::Lookup { what: "instance", .. }));
    }
}
