//! Batch orchestration: poll and launch every resolved handle concurrently.
//!
//! One independent task per handle; a failing task never cancels its
//! siblings, and every failure is collected into the report. Completion
//! order across handles is unspecified.

use crate::handle::Handle;
use crate::poll::{wait_ready, WaitOptions};
use async_trait::async_trait;
use cirrus_core::types::AddressKind;
use cirrus_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Shared parameters for the poll-and-launch pipeline.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Which address family to connect to.
    pub kind: AddressKind,
    /// Interface index within the selected address list.
    pub index: usize,
    /// Extra arguments for the remote desktop command.
    pub arguments: Vec<String>,
    /// Display a login prompt instead of embedding the credential.
    pub prompt: bool,
    /// Login username.
    pub username: String,
    /// Readiness timeout per handle.
    pub timeout: Duration,
    /// Polling interval between refreshes.
    pub interval: Duration,
}

impl LaunchOptions {
    /// The readiness-wait parameters implied by these options.
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            kind: self.kind,
            index: self.index,
            prompt: self.prompt,
            timeout: self.timeout,
            interval: self.interval,
        }
    }
}

/// The launch action run once per handle after readiness.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Drive the remote desktop client against a ready handle.
    async fn launch(&self, handle: &Handle, options: &LaunchOptions) -> Result<()>;
}

/// One handle's failed pipeline.
#[derive(Debug)]
pub struct LaunchFailure {
    /// The handle's self href (or a placeholder when the task itself died).
    pub href: String,
    /// What went wrong.
    pub error: Error,
}

/// Aggregated outcome of a batch launch.
#[derive(Debug, Default)]
pub struct LaunchReport {
    /// Number of handles that reached readiness and launched.
    pub launched: usize,
    /// Every failed handle, in completion order (unspecified).
    pub failures: Vec<LaunchFailure>,
}

impl LaunchReport {
    /// True when every handle's pipeline succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run poll-then-launch concurrently for every handle and collect every
/// outcome before reporting.
pub async fn launch_all(
    handles: Vec<Handle>,
    launcher: Arc<dyn Launcher>,
    options: LaunchOptions,
) -> LaunchReport {
    let mut tasks = JoinSet::new();

    for mut handle in handles {
        let launcher = Arc::clone(&launcher);
        let options = options.clone();
        tasks.spawn(async move {
            let href = handle.href().to_string();
            let result = async {
                wait_ready(&mut handle, &options.wait_options()).await?;
                launcher.launch(&handle, &options).await
            }
            .await;
            (href, result)
        });
    }

    let mut report = LaunchReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((href, Ok(()))) => {
                info!(instance = %href, "remote desktop launched");
                report.launched += 1;
            }
            Ok((href, Err(err))) => {
                error!(instance = %href, %err, "pipeline failed");
                report.failures.push(LaunchFailure { href, error: err });
            }
            Err(join_error) => {
                error!(%join_error, "pipeline task died");
                report.failures.push(LaunchFailure {
                    href: "<unknown>".to_string(),
                    error: Error::Launch(join_error.to_string()),
                });
            }
        }
    }
    report
}
