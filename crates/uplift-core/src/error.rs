//! Common error type definitions.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur during an upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A precondition failed before any work started (no file selected,
    /// transfer backend unsupported, attempt already in flight).
    Precondition,
    /// The backend explicitly refused to issue a temporary write URL.
    Negotiation,
    /// The storage PUT failed (network, expired authorization, rejection).
    Transfer,
    /// The backend reply did not match either defined response variant,
    /// or a granted URL proved unusable.
    ProtocolViolation,
    /// Network-related error occurred.
    NetworkError,
    /// Timeout occurred.
    Timeout,
    /// Configuration error.
    Configuration,
    /// Serialization/deserialization error.
    Serialization,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Whether a failure of this kind happens after the widget UI has been
    /// mutated, and therefore requires a full rollback to the pre-attempt
    /// presentation.
    #[must_use]
    pub const fn requires_rollback(&self) -> bool {
        !matches!(self, Self::Precondition | Self::Configuration)
    }
}

/// A structured error type for upload operations.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates a precondition error.
    pub fn precondition() -> Self {
        Self::new(ErrorKind::Precondition)
    }

    /// Creates a negotiation error.
    pub fn negotiation() -> Self {
        Self::new(ErrorKind::Negotiation)
    }

    /// Creates a transfer error.
    pub fn transfer() -> Self {
        Self::new(ErrorKind::Transfer)
    }

    /// Creates a protocol violation error.
    pub fn protocol_violation() -> Self {
        Self::new(ErrorKind::ProtocolViolation)
    }

    /// Creates a network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The text surfaced to the user for this error.
    ///
    /// Alert dialogs carry the raw message when one is present, falling
    /// back to the kind name. No structured error code surface exists.
    #[must_use]
    pub fn alert_text(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.kind.to_string(),
        }
    }

    /// Whether this error requires a UI rollback.
    #[must_use]
    pub const fn requires_rollback(&self) -> bool {
        self.kind.requires_rollback()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Unknown)
            .with_message(err.to_string())
            .with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialization)
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::negotiation().with_message("Extension not allowed");
        assert_eq!(err.to_string(), "[negotiation]: Extension not allowed");
        assert_eq!(err.alert_text(), "Extension not allowed");
    }

    #[test]
    fn test_alert_text_falls_back_to_kind() {
        let err = Error::protocol_violation();
        assert_eq!(err.alert_text(), "protocol_violation");
    }

    #[test]
    fn test_rollback_classification() {
        assert!(!ErrorKind::Precondition.requires_rollback());
        assert!(!ErrorKind::Configuration.requires_rollback());
        assert!(ErrorKind::Negotiation.requires_rollback());
        assert!(ErrorKind::Transfer.requires_rollback());
        assert!(ErrorKind::ProtocolViolation.requires_rollback());
        assert!(ErrorKind::NetworkError.requires_rollback());
    }
}
