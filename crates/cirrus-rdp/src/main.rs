//! cirrus-rdp: launch Windows Remote Desktop for cloud console URLs.

mod launch;
mod rdp_file;

use anyhow::Context;
use cirrus_api::Environments;
use cirrus_core::config::Config;
use cirrus_core::types::AddressKind;
use cirrus_resolver::{launch_all, resolve_urls, LaunchOptions};
use clap::Parser;
use launch::NativeLauncher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cirrus-rdp",
    version,
    about = "Launch Windows Remote Desktop for a cloud server, server array, or instance"
)]
struct Cli {
    /// Config file path (defaults to ~/.cirrus-rdp.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Connect over the private interface instead of the public one
    #[arg(short, long)]
    private: bool,

    /// Connect using the indexed public/private interface
    #[arg(short, long, default_value_t = 0)]
    index: usize,

    /// Argument for the remote desktop command (repeat for multiple)
    #[arg(short = 'A', long = "argument")]
    arguments: Vec<String>,

    /// Show the login prompt instead of embedding the initial credential
    #[arg(long)]
    prompt: bool,

    /// Login username
    #[arg(short, long, default_value = "Administrator")]
    username: String,

    /// Readiness timeout in seconds
    #[arg(short, long, default_value_t = 300)]
    timeout: u64,

    /// Polling interval in seconds
    #[arg(long, default_value_t = 10)]
    interval: u64,

    /// Console URLs identifying servers, server arrays, or instances
    #[arg(required = true)]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let path = cli.config.unwrap_or_else(Config::default_path);
    let config =
        Config::load(&path).with_context(|| format!("reading config file {}", path.display()))?;
    let environments = Environments::from_config(&config)?;

    let handles = resolve_urls(&environments, &cli.urls, cli.prompt).await?;

    let options = LaunchOptions {
        kind: AddressKind::from_private(cli.private),
        index: cli.index,
        arguments: cli.arguments,
        prompt: cli.prompt,
        username: cli.username,
        timeout: Duration::from_secs(cli.timeout),
        interval: Duration::from_secs(cli.interval),
    };

    let report = launch_all(handles, Arc::new(NativeLauncher::new()), options).await;
    for failure in &report.failures {
        eprintln!("{}: {}", failure.href, failure.error);
    }
    Ok(report.is_success())
}
