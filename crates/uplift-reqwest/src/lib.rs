//! Reqwest-based implementations of the uplift trait seams.
//!
//! This crate provides the two network collaborators of the upload
//! lifecycle: [`ReqwestNegotiator`] for temporary write URL negotiation
//! against a content-management backend, and [`ReqwestTransfer`] for the
//! direct-to-storage PUT with progress reporting.
//!
//! # Example
//!
//! ```rust,ignore
//! use uplift_reqwest::{ReqwestConfig, ReqwestNegotiator, ReqwestTransfer};
//! use url::Url;
//!
//! let config = ReqwestConfig::default();
//! let base = Url::parse("https://cms.example")?;
//!
//! let negotiator = ReqwestNegotiator::new(base, config.clone())?;
//! let transfer = ReqwestTransfer::new(config)?;
//! let controller = UploadController::new(negotiator, transfer, widget);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod negotiator;
mod transfer;

pub use crate::config::{DEFAULT_TIMEOUT_SECS, ReqwestConfig};
pub use crate::negotiator::ReqwestNegotiator;
pub use crate::transfer::ReqwestTransfer;

/// Tracing target for negotiation operations.
pub const TRACING_TARGET_NEGOTIATOR: &str = "uplift_reqwest::negotiator";

/// Tracing target for transfer operations.
pub const TRACING_TARGET_TRANSFER: &str = "uplift_reqwest::transfer";
