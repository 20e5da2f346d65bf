//! Native remote-desktop client invocation.

use crate::rdp_file::create_rdp_file;
use async_trait::async_trait;
use cirrus_core::{Error, Result};
use cirrus_resolver::{Handle, LaunchOptions, Launcher};
use tokio::process::Command;
use tracing::info;

fn default_command() -> &'static str {
    if cfg!(windows) {
        "mstsc.exe"
    } else {
        "xfreerdp"
    }
}

/// Launches the platform's remote desktop client on a staged `.rdp` file.
pub struct NativeLauncher {
    command: String,
}

impl NativeLauncher {
    /// Launcher using the platform default client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            command: default_command().to_string(),
        }
    }

    /// Launcher using an explicit client command.
    #[must_use]
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for NativeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Launcher for NativeLauncher {
    async fn launch(&self, handle: &Handle, options: &LaunchOptions) -> Result<()> {
        let file = create_rdp_file(handle, options)?;
        info!(
            instance = %handle.href(),
            command = %self.command,
            file = %file.display(),
            "launching remote desktop client"
        );

        // The client is left running on its own; supervising it is not
        // this tool's job.
        Command::new(&self.command)
            .args(&options.arguments)
            .arg(&file)
            .spawn()
            .map_err(|err| Error::Launch(format!("{}: {err}", self.command)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_api::Environment;
    use cirrus_core::config::EnvironmentConfig;
    use cirrus_core::types::{AddressKind, Instance, Link, LinkTable};
    use secrecy::SecretString;
    use std::sync::Arc;
    use std::time::Duration;

    fn ready_handle() -> Handle {
        let environment = Arc::new(
            Environment::new(&EnvironmentConfig {
                account: 100,
                host: "us-3.example.com".to_string(),
                refresh_token: SecretString::from("token".to_string()),
            })
            .unwrap(),
        );
        Handle::new(
            Instance {
                links: LinkTable(vec![Link {
                    rel: "self".to_string(),
                    href: "/api/clouds/6/instances/ABC".to_string(),
                }]),
                public_ip_addresses: vec!["203.0.113.7".to_string()],
                ..Instance::default()
            },
            environment,
        )
    }

    #[tokio::test]
    async fn missing_client_command_is_a_launch_error() {
        let launcher = NativeLauncher::with_command("/nonexistent/remote-desktop-client");
        let options = LaunchOptions {
            kind: AddressKind::Public,
            index: 0,
            arguments: Vec::new(),
            prompt: true,
            username: "Administrator".to_string(),
            timeout: Duration::from_secs(1),
            interval: Duration::from_secs(1),
        };

        let err = launcher.launch(&ready_handle(), &options).await.unwrap_err();
        assert!(matches!(err, Error::Launch(_)));
        assert!(err.to_string().contains("/nonexistent/remote-desktop-client"));
    }
}
