//! Error types and handling
//!
//! This module provides the error taxonomy used throughout the Valet engine.
//! Capability faults (timeouts, transport failures, auth problems) are kept
//! distinct from engine faults (bad configuration, unreadable directory
//! files, pattern-table compile errors), because they propagate differently:
//! capability faults are recoverable per request and surface as failed
//! responses, engine faults abort startup.
//!
//! All errors implement the `ErrorHint` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.

use thiserror::Error;

/// Trait for Valet error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information.
pub trait ErrorHint {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets, file paths, or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require configuration changes or a restart.
    fn is_recoverable(&self) -> bool;
}

/// Fault reported by an external collaborator (calendar, notifier, search).
///
/// Every capability call is wrapped in a bounded timeout at the handler
/// boundary; whatever goes wrong must arrive here as a value, never as an
/// unhandled fault crossing into the conversation layer.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("capability call timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl ErrorHint for CapabilityError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Timeout => "The service took too long to respond. Try again",
            Self::Transport(_) => "Network operation failed. Check your connection",
            Self::Auth(_) => "Service authentication failed. Check your credentials",
            Self::InvalidRequest(_) => "The request was rejected by the service",
            Self::NotFound(_) => "The requested item no longer exists",
            Self::Unavailable(_) => "Service unavailable. Try again later",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Auth(_))
    }
}

/// Main engine error type
///
/// Represents faults in the engine itself, as opposed to faults reported by
/// external collaborators. Conversation-level failures (unparseable query,
/// missing fields, no options found) are NOT errors; they are response
/// values produced by the orchestrator.
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Directory source errors
    #[error("Directory error: {0}")]
    Directory(String),

    // Pattern table compile errors
    #[error("Pattern error: {0}")]
    Pattern(String),

    // Capability faults bubbled to startup paths
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorHint for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Directory(_) => "Check the directory source files",
            Self::Pattern(_) => "Internal pattern table failed to compile",
            Self::Capability(e) => e.user_hint(),
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Pattern(_) => false,
            Self::Capability(e) => e.is_recoverable(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_hints() {
        let err = CapabilityError::Timeout;
        assert!(err.is_recoverable());
        assert!(err.user_hint().contains("too long"));

        let auth = CapabilityError::Auth("expired token".to_string());
        assert!(!auth.is_recoverable());
    }

    #[test]
    fn test_engine_error_wraps_capability_error() {
        let err: EngineError = CapabilityError::Transport("connection reset".to_string()).into();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_pattern_error_not_recoverable() {
        let err = EngineError::Pattern("bad regex".to_string());
        assert!(!err.is_recoverable());
    }
}
