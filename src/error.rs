//! Error handling for the WondasTeach data-access layer
//!
//! Every error carries a discriminated [`ErrorKind`]. Callers branch on the
//! kind, never on the message text.

use std::fmt;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid input, rejected before any state changed
    Validation,
    /// Sign-up with an email that already has an account
    DuplicateEmail,
    /// Wrong user type (or owner) for a restricted operation
    PermissionDenied,
    /// Lookup miss on an entity that must exist (e.g. a job)
    NotFound,
    /// Sign-in with an email that has no account
    AccountNotFound,
    /// Sign-in with a wrong password
    InvalidCredentials,
    /// Sign-in before the email address was confirmed
    EmailNotConfirmed,
    /// Operation requires a signed-in user
    NotAuthenticated,
    /// Backend unreachable; eligible for fallback
    Connectivity,
    /// Anything unexpected
    Internal,
}

impl ErrorKind {
    /// Whether the Facade may retry the operation against the mock backend
    pub fn is_connectivity(self) -> bool {
        matches!(self, ErrorKind::Connectivity)
    }

    /// Business-rule rejections that must reach the caller unchanged
    pub fn is_domain(self) -> bool {
        !matches!(self, ErrorKind::Connectivity | ErrorKind::Internal)
    }
}

/// Unified error type for the data-access layer
#[derive(Error, Debug)]
pub enum Error {
    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// The email address is already registered
    #[error("A user with the email address {0} has already been registered")]
    DuplicateEmail(String),

    /// The requester may not perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A required entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// No account exists for the email address
    #[error("No account found with email \"{0}\"")]
    AccountNotFound(String),

    /// Wrong email/password combination
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Email address awaiting confirmation
    #[error("Email not confirmed")]
    EmailNotConfirmed,

    /// No signed-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Network or service unavailability
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Local filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// General errors
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new permission error
    pub fn permission_denied<T: fmt::Display>(msg: T) -> Self {
        Error::PermissionDenied(msg.to_string())
    }

    /// Create a new not-found error for the named entity
    pub fn not_found<T: fmt::Display>(what: T) -> Self {
        Error::NotFound(what.to_string())
    }

    /// Create a new connectivity error
    pub fn connectivity<T: fmt::Display>(msg: T) -> Self {
        Error::Connectivity(msg.to_string())
    }

    /// Create a new internal error
    pub fn internal<T: fmt::Display>(msg: T) -> Self {
        Error::Internal(msg.to_string())
    }

    /// The discriminated kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::DuplicateEmail(_) => ErrorKind::DuplicateEmail,
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AccountNotFound(_) => ErrorKind::AccountNotFound,
            Error::InvalidCredentials => ErrorKind::InvalidCredentials,
            Error::EmailNotConfirmed => ErrorKind::EmailNotConfirmed,
            Error::NotAuthenticated => ErrorKind::NotAuthenticated,
            Error::Connectivity(_) => ErrorKind::Connectivity,
            Error::Http(err) => {
                if err.is_connect() || err.is_timeout() || err.is_request() {
                    ErrorKind::Connectivity
                } else {
                    ErrorKind::Internal
                }
            }
            Error::Json(_) | Error::Url(_) | Error::Io(_) | Error::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Shorthand for `self.kind().is_connectivity()`
    pub fn is_connectivity(&self) -> bool {
        self.kind().is_connectivity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(Error::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(
            Error::DuplicateEmail("a@b.c".into()).kind(),
            ErrorKind::DuplicateEmail
        );
        assert_eq!(Error::not_found("Job").kind(), ErrorKind::NotFound);
        assert_eq!(Error::InvalidCredentials.kind(), ErrorKind::InvalidCredentials);
        assert_eq!(Error::connectivity("down").kind(), ErrorKind::Connectivity);
        assert_eq!(Error::internal("boom").kind(), ErrorKind::Internal);
    }

    #[test]
    fn only_connectivity_allows_fallback() {
        assert!(Error::connectivity("timeout").is_connectivity());
        assert!(!Error::DuplicateEmail("a@b.c".into()).is_connectivity());
        assert!(!Error::permission_denied("teachers only").is_connectivity());
        assert!(!Error::internal("bad json").is_connectivity());
    }

    #[test]
    fn domain_kinds() {
        assert!(ErrorKind::DuplicateEmail.is_domain());
        assert!(ErrorKind::NotFound.is_domain());
        assert!(!ErrorKind::Connectivity.is_domain());
        assert!(!ErrorKind::Internal.is_domain());
    }

    #[test]
    fn io_errors_are_internal() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
