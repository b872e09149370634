//! Error types produced by the archive client.
//!
//! | Error | Stage | Meaning |
//! |-------|-------|---------|
//! | [`Connect`](ArchiveError::Connect) | connect | Host unresolvable, refused, or timed out |
//! | [`Auth`](ArchiveError::Auth) | login | Credentials rejected |
//! | [`NotFound`](ArchiveError::NotFound) | retrieve | The archive has no such blob |
//! | [`Transfer`](ArchiveError::Transfer) | retrieve | Session or data channel broke |
//!
//! Only `NotFound` means the document does not exist. Every other variant
//! means the archive could not be consulted.

use thiserror::Error;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("cannot connect to archive {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("archive {endpoint} rejected login for {user}: {reason}")]
    Auth {
        endpoint: String,
        user: String,
        reason: String,
    },

    #[error("blob {blob} not found in archive")]
    NotFound { blob: String },

    #[error("transfer of {blob} failed: {reason}")]
    Transfer { blob: String, reason: String },
}

impl ArchiveError {
    /// True when the archive answered and the blob genuinely does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. })
    }

    /// Short stage label for structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            ArchiveError::Connect { .. } => "connect",
            ArchiveError::Auth { .. } => "login",
            ArchiveError::NotFound { .. } | ArchiveError::Transfer { .. } => "retrieve",
        }
    }
}
