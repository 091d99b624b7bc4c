//! Provider link parsing.
//!
//! Mobgran share links carry the offer identifier as an 8-4-4-4-12 hex token
//! somewhere in the query string, e.g.
//! `https://www.mobgran.com/app/conferencia/?p=link&o=cae15fe7-86a3-4a7b-9a4d-5ed91ae6d568/`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid identifier regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("link must not be empty")]
    Empty,

    #[error("link must belong to the {marker} domain")]
    InvalidDomain { marker: String },

    #[error("no offer identifier found in link")]
    MissingIdentifier,
}

/// The provider's offer identifier, always stored lower-case.
///
/// Two links that differ only in hex-digit case resolve to the same offer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for CanonicalId {
    type Err = LinkError;

    /// Parses a bare identifier. Surrounding text is not allowed here; use
    /// [`extract_identifier`] for full links.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = s.trim();
        match IDENTIFIER_RE.find(candidate) {
            Some(m) if m.start() == 0 && m.end() == candidate.len() => {
                Ok(Self(candidate.to_ascii_lowercase()))
            }
            _ => Err(LinkError::MissingIdentifier),
        }
    }
}

/// Extracts the first identifier token found anywhere in `input`.
///
/// Does not check the domain; see [`validate_link`].
///
/// # Errors
///
/// Returns [`LinkError::MissingIdentifier`] when no token is present.
pub fn extract_identifier(input: &str) -> Result<CanonicalId, LinkError> {
    IDENTIFIER_RE
        .find(input)
        .map(|m| CanonicalId(m.as_str().to_ascii_lowercase()))
        .ok_or(LinkError::MissingIdentifier)
}

/// Validates a provider link and returns its identifier.
///
/// The link must be non-blank, contain `domain_marker` (case-insensitive), and
/// carry an identifier token.
///
/// # Errors
///
/// [`LinkError::Empty`], [`LinkError::InvalidDomain`] or
/// [`LinkError::MissingIdentifier`], checked in that order.
pub fn validate_link(input: &str, domain_marker: &str) -> Result<CanonicalId, LinkError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LinkError::Empty);
    }

    if !trimmed
        .to_ascii_lowercase()
        .contains(&domain_marker.to_ascii_lowercase())
    {
        return Err(LinkError::InvalidDomain {
            marker: domain_marker.to_owned(),
        });
    }

    extract_identifier(trimmed)
}
