//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use uplift_reqwest::ReqwestConfig;

/// Uploads a file directly to object storage through a temporary write
/// URL negotiated with a content-management backend, then reports the
/// finalized form submission.
#[derive(Debug, Parser)]
#[command(name = "uplift", version, about)]
pub struct Cli {
    /// File to upload
    pub file: PathBuf,

    /// Base URL of the content-management backend
    #[arg(long, env = "UPLIFT_ENDPOINT")]
    pub endpoint: Url,

    /// Destination directory within the storage container
    #[arg(long, env = "UPLIFT_DIRECTORY", default_value = "")]
    pub directory: String,

    /// Extension allow-list forwarded to the backend for validation
    #[arg(long = "extensions", env = "UPLIFT_EXTENSIONS", default_value = "")]
    pub allowed_extensions: String,

    /// Submit label reasserted when the form is finalized
    #[arg(long, env = "UPLIFT_SUBMIT_LABEL", default_value = "Save")]
    pub submit_label: String,

    /// MIME type of the file
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,

    #[command(flatten)]
    pub http: ReqwestConfig,
}
