//! Endpoint negotiation request and response types.
//!
//! The backend is asked for a temporary write URL via a path-segment
//! encoded request keyed by file name, extension, destination directory,
//! and the operator's extension allow-list. It answers with exactly one of
//! two JSON variants: `{"success": url}` or `{"error": message}`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::file::SelectedFile;

/// Leading path segments of the negotiation endpoint.
pub const ENDPOINT_PREFIX: [&str; 1] = ["endpoint"];

/// A request for a temporary write URL.
///
/// Built once per attempt, immediately before the first network call, and
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    /// File name without its extension.
    pub base_name: String,
    /// File extension, empty when the name carries none.
    pub extension: String,
    /// Operator-supplied destination directory, possibly nested.
    pub upload_directory: String,
    /// Operator-supplied extension allow-list, verbatim.
    pub allowed_extensions: String,
}

impl EndpointRequest {
    /// Creates a new endpoint request.
    pub fn new(
        base_name: impl Into<String>,
        extension: impl Into<String>,
        upload_directory: impl Into<String>,
        allowed_extensions: impl Into<String>,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            extension: extension.into(),
            upload_directory: upload_directory.into(),
            allowed_extensions: allowed_extensions.into(),
        }
    }

    /// Builds the request for a selected file and the widget's operator
    /// fields.
    pub fn for_file(
        file: &SelectedFile,
        upload_directory: impl Into<String>,
        allowed_extensions: impl Into<String>,
    ) -> Self {
        let (base, ext) = file.split_name();
        Self::new(base, ext, upload_directory, allowed_extensions)
    }

    /// The ordered path segments identifying this request:
    /// `endpoint/filename/{base}/type/{ext}/{dir...}/{extensions}`.
    ///
    /// Nested directories contribute one segment per component so each
    /// piece is percent-encoded on its own.
    #[must_use]
    pub fn path_segments(&self) -> Vec<&str> {
        let mut segments = Vec::with_capacity(6);
        segments.extend(ENDPOINT_PREFIX);
        segments.push("filename");
        segments.push(self.base_name.as_str());
        segments.push("type");
        segments.push(self.extension.as_str());
        segments.extend(self.upload_directory.split('/').filter(|s| !s.is_empty()));
        segments.push(self.allowed_extensions.as_str());
        segments
    }
}

/// Wire shape of the backend's negotiation reply.
///
/// Mirrors the JSON exactly; use [`EndpointResponse::try_from`] to get the
/// validated domain variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointReply {
    /// Temporary write URL, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    /// Human-readable refusal, present on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single-use, time-limited URL authorizing one direct write to object
/// storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryWriteUrl(Url);

impl TemporaryWriteUrl {
    /// Wraps an already-parsed URL.
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    /// Parses a raw URL string, failing with a protocol violation when the
    /// backend granted something unusable.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|err| {
            Error::protocol_violation()
                .with_message(format!("unusable write URL in success reply: {raw}"))
                .with_source(err)
        })?;
        Ok(Self(url))
    }

    /// The underlying URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl std::fmt::Display for TemporaryWriteUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The two defined outcomes of endpoint negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointResponse {
    /// The backend issued a temporary write URL.
    Granted(TemporaryWriteUrl),
    /// The backend refused, with a human-readable message.
    Denied(String),
}

impl TryFrom<EndpointReply> for EndpointResponse {
    type Error = Error;

    fn try_from(reply: EndpointReply) -> Result<Self> {
        match (reply.success, reply.error) {
            (Some(url), None) => Ok(Self::Granted(TemporaryWriteUrl::parse(&url)?)),
            (None, Some(message)) => Ok(Self::Denied(message)),
            (Some(_), Some(_)) => Err(Error::protocol_violation()
                .with_message("endpoint reply carried both success and error")),
            (None, None) => Err(Error::protocol_violation()
                .with_message("endpoint reply carried neither success nor error")),
        }
    }
}
