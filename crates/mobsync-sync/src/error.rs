use std::fmt;

use mobsync_core::LinkError;
use mobsync_db::DbError;
use mobsync_upstream::UpstreamError;
use serde::Serialize;
use thiserror::Error;

/// Stable, machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidIdentifier,
    InvalidDomain,
    UpstreamUnavailable,
    UpstreamRejected,
    UpstreamMalformed,
    PersistenceFailure,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "invalid_identifier",
            Self::InvalidDomain => "invalid_domain",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UpstreamRejected => "upstream_rejected",
            Self::UpstreamMalformed => "upstream_malformed",
            Self::PersistenceFailure => "persistence_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step of a synchronization at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    Fetch,
    ExistenceCheck,
    Persistence,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extraction => "extraction",
            Self::Fetch => "fetch",
            Self::ExistenceCheck => "existence_check",
            Self::Persistence => "persistence",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Blank link or no identifier token in it.
    #[error("invalid link: {0}")]
    InvalidIdentifier(LinkError),

    #[error("link does not belong to the {marker} domain")]
    InvalidDomain { marker: String },

    /// Network failure or timeout talking to the provider.
    #[error("provider unavailable: {0}")]
    UpstreamUnavailable(#[source] UpstreamError),

    #[error("provider rejected the request with HTTP {status}")]
    UpstreamRejected { status: u16, body: String },

    /// The provider answered 200 with a body that is not a usable document.
    #[error("provider returned an unusable document: {0}")]
    UpstreamMalformed(#[source] UpstreamError),

    #[error("existence check failed: {0}")]
    ExistenceCheck(#[source] DbError),

    /// A write failed; every write of this synchronization was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(#[source] DbError),
}

impl SyncError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::InvalidDomain { .. } => ErrorKind::InvalidDomain,
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::UpstreamRejected { .. } => ErrorKind::UpstreamRejected,
            Self::UpstreamMalformed(_) => ErrorKind::UpstreamMalformed,
            Self::ExistenceCheck(_) | Self::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidIdentifier(_) | Self::InvalidDomain { .. } => Stage::Extraction,
            Self::UpstreamUnavailable(_)
            | Self::UpstreamRejected { .. }
            | Self::UpstreamMalformed(_) => Stage::Fetch,
            Self::ExistenceCheck(_) => Stage::ExistenceCheck,
            Self::Persistence(_) => Stage::Persistence,
        }
    }

    /// Message safe to show to callers: no driver errors, SQL, or
    /// provider response bodies.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidIdentifier(e) => e.to_string(),
            Self::InvalidDomain { marker } => format!("link must belong to the {marker} domain"),
            Self::UpstreamUnavailable(_) => "provider did not respond".to_string(),
            Self::UpstreamRejected { status, .. } => {
                format!("provider rejected the request (HTTP {status})")
            }
            Self::UpstreamMalformed(_) => "provider returned an unusable document".to_string(),
            Self::ExistenceCheck(_) => "failed to check for an existing offer".to_string(),
            Self::Persistence(_) => "failed to store the offer".to_string(),
        }
    }
}

impl From<LinkError> for SyncError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::InvalidDomain { marker } => Self::InvalidDomain { marker },
            other => Self::InvalidIdentifier(other),
        }
    }
}

impl From<UpstreamError> for SyncError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Rejected { status, body, .. } => Self::UpstreamRejected { status, body },
            UpstreamError::Deserialize { .. }
            | UpstreamError::EmptyDocument { .. }
            | UpstreamError::BodyTooLarge { .. } => {
                Self::UpstreamMalformed(err)
            }
            UpstreamError::Http(_) | UpstreamError::InvalidBaseUrl { .. } => {
                Self::UpstreamUnavailable(err)
            }
        }
    }
}
