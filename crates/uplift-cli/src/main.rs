#![forbid(unsafe_code)]

mod config;
mod console;

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use uplift_core::{SelectedFile, UploadController, UploadOutcome};
use uplift_reqwest::{ReqwestNegotiator, ReqwestTransfer};

use crate::config::Cli;
use crate::console::ConsoleWidget;

// Tracing target constants
pub const TRACING_TARGET_RUN: &str = "uplift_cli::run";
pub const TRACING_TARGET_CONFIG: &str = "uplift_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_RUN,
            error = %error,
            "upload terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;
    tracing::debug!(
        target: TRACING_TARGET_CONFIG,
        file = %cli.file.display(),
        endpoint = %cli.endpoint,
        directory = %cli.directory,
        "parsed configuration"
    );

    let file = load_selected_file(&cli)?;
    let widget = ConsoleWidget::new(Some(file), cli.directory.clone(), cli.allowed_extensions.clone());

    let negotiator = ReqwestNegotiator::new(cli.endpoint.clone(), cli.http.clone())
        .context("failed to create negotiation client")?;
    let transfer =
        ReqwestTransfer::new(cli.http.clone()).context("failed to create transfer client")?;

    let controller = UploadController::new(negotiator, transfer, widget);
    match controller.begin_upload(&cli.submit_label).await {
        UploadOutcome::Submitted(metadata) => {
            tracing::info!(
                target: TRACING_TARGET_RUN,
                file_name = %metadata.file_name,
                size = metadata.size,
                "upload submitted"
            );
            Ok(())
        }
        UploadOutcome::Rejected(error) => {
            Err(anyhow::Error::new(error).context("upload attempt rejected"))
        }
        UploadOutcome::RolledBack(error) => {
            Err(anyhow::Error::new(error).context("upload attempt failed"))
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// The log level can be configured via the `RUST_LOG` environment
/// variable; if not set, defaults to `info`.
fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

/// Reads the file to upload into a [`SelectedFile`].
fn load_selected_file(cli: &Cli) -> anyhow::Result<SelectedFile> {
    let name = cli
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("file path carries no usable name: {}", cli.file.display()))?
        .to_string();
    let content_type: mime::Mime = cli
        .content_type
        .parse()
        .with_context(|| format!("invalid content type: {}", cli.content_type))?;
    let contents = std::fs::read(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    Ok(SelectedFile::new(name, content_type, contents))
}
