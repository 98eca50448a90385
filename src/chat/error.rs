//! Error type shared by all `ChatApi` implementations.
//!
//! Expected platform conditions (missing permission, deleted message,
//! incapable destination) are ordinary values here, not exceptions: the
//! guard sequences in the pipeline branch on [`ChatErrorKind`] and decide
//! locally whether to skip, fall back, or abort.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Categorizes a platform failure so callers can branch without inspecting
/// backend-specific error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatErrorKind {
    /// A message or thread could not be created.
    Send,

    /// The platform denied the operation (missing permission or role).
    Permission,

    /// The referenced channel, message, or member does not exist.
    NotFound,

    /// The destination cannot perform the requested operation, e.g. thread
    /// creation on a channel that is not thread-capable.
    Unsupported,

    /// Transport, gateway, or any other uncategorized failure.
    Other,
}

impl fmt::Display for ChatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChatErrorKind::Send => "send",
            ChatErrorKind::Permission => "permission",
            ChatErrorKind::NotFound => "not_found",
            ChatErrorKind::Unsupported => "unsupported",
            ChatErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// A failure reported by the messaging platform.
#[derive(Debug, Error)]
#[error("chat platform error ({kind}): {message}")]
pub struct ChatError {
    /// Category used by the pipeline's guard sequences.
    pub kind: ChatErrorKind,

    /// HTTP status from the platform, when the failure came from a REST call.
    pub status: Option<u16>,

    /// Human-readable description.
    pub message: String,

    /// The underlying backend error, when available.
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ChatError {
    /// Creates an error with the given kind and message.
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        ChatError {
            kind,
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the HTTP status the platform returned.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the underlying backend error.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// True if the platform denied the operation.
    pub fn is_permission(&self) -> bool {
        self.kind == ChatErrorKind::Permission
    }

    /// True if the referenced entity is gone or never existed.
    pub fn is_not_found(&self) -> bool {
        self.kind == ChatErrorKind::NotFound
    }

    /// True if the destination cannot perform the operation at all.
    pub fn is_unsupported(&self) -> bool {
        self.kind == ChatErrorKind::Unsupported
    }
}
