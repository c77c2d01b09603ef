//! Upload lifecycle state machine for direct-to-storage form uploads.
//!
//! This crate owns the full lifecycle of a single file-upload attempt for
//! one form field: it validates preconditions, swaps the widget's UI
//! affordances, negotiates a temporary write URL from the backend, drives
//! the cross-origin PUT, and on completion finalizes the hosting form (or
//! restores it on failure).
//!
//! External collaborators are reached only through trait seams:
//! [`EndpointNegotiator`] for the backend, [`StorageTransfer`] for object
//! storage, and [`UploadWidget`] for the hosting form. See `uplift-reqwest`
//! for the HTTP implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use uplift_core::UploadController;
//! use uplift_reqwest::{ReqwestConfig, ReqwestNegotiator, ReqwestTransfer};
//!
//! let config = ReqwestConfig::default();
//! let negotiator = ReqwestNegotiator::new(base_url, config.clone())?;
//! let transfer = ReqwestTransfer::new(config)?;
//!
//! let controller = UploadController::new(negotiator, transfer, widget);
//! let outcome = controller.begin_upload("Save").await;
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod controller;
mod endpoint;
mod error;
mod file;
mod progress;
mod widget;

pub use crate::controller::{UploadController, UploadOutcome, UploadState};
pub use crate::endpoint::{
    EndpointReply, EndpointRequest, EndpointResponse, TemporaryWriteUrl,
};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::file::{FileMetadata, SelectedFile};
pub use crate::progress::{ProgressSink, TransferProgress};
pub use crate::widget::UploadWidget;

/// Core trait for temporary write URL negotiation.
///
/// Implement this trait to ask a content-management backend for a
/// single-use write URL. Transport failures and malformed replies are
/// `Err`; an explicit backend refusal is `Ok(EndpointResponse::Denied)`.
#[async_trait::async_trait]
pub trait EndpointNegotiator: Send + Sync {
    /// Requests a temporary write URL for the given attempt.
    async fn negotiate(&self, request: &EndpointRequest) -> Result<EndpointResponse>;
}

/// Core trait for the direct-to-storage transfer.
///
/// Implementations must deliver the file bytes unmodified in a single PUT,
/// with caching disabled and no implicit content-type negotiation, and
/// should report [`TransferProgress`] samples through the sink as bytes
/// leave the wire.
#[async_trait::async_trait]
pub trait StorageTransfer: Send + Sync {
    /// PUTs the raw file bytes to the temporary write URL.
    async fn put(
        &self,
        url: &TemporaryWriteUrl,
        file: &SelectedFile,
        progress: ProgressSink<'_>,
    ) -> Result<()>;

    /// Whether this transfer backend is usable at all.
    ///
    /// Checked as a precondition before any UI mutation; an unsupported
    /// backend aborts the attempt with a user-facing message and no
    /// fallback transfer.
    fn is_supported(&self) -> bool {
        true
    }
}
