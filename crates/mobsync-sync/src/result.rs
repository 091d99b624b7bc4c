use mobsync_core::CanonicalId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorKind, SyncError};

/// A request to mirror one provider offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(alias = "url")]
    pub link: String,
    /// Overwrite an offer that is already stored. When `false`, an existing
    /// offer is left untouched and the provider is not contacted.
    #[serde(default, alias = "atualizar_existente")]
    pub replace_if_existing: bool,
}

impl SyncRequest {
    #[must_use]
    pub fn new(link: impl Into<String>, replace_if_existing: bool) -> Self {
        Self {
            link: link.into(),
            replace_if_existing,
        }
    }
}

/// What a create or replace wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub offer_id: Uuid,
    pub canonical_id: CanonicalId,
    pub cavaletes: usize,
    pub items: usize,
    /// Cavaletes deleted before reinserting; always zero on create.
    pub removed_cavaletes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created(SyncReport),
    Replaced(SyncReport),
    /// The offer was already stored and replacement was not requested.
    AlreadyExists {
        offer_id: Uuid,
        canonical_id: CanonicalId,
    },
}

impl SyncOutcome {
    #[must_use]
    pub fn offer_id(&self) -> Uuid {
        match self {
            Self::Created(r) | Self::Replaced(r) => r.offer_id,
            Self::AlreadyExists { offer_id, .. } => *offer_id,
        }
    }

    #[must_use]
    pub fn canonical_id(&self) -> &CanonicalId {
        match self {
            Self::Created(r) | Self::Replaced(r) => &r.canonical_id,
            Self::AlreadyExists { canonical_id, .. } => canonical_id,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Created(_) => Outcome::Created,
            Self::Replaced(_) => Outcome::Replaced,
            Self::AlreadyExists { .. } => Outcome::AlreadyExists,
        }
    }

    #[must_use]
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Created(r) | Self::Replaced(r) => Some(r),
            Self::AlreadyExists { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Replaced,
    AlreadyExists,
}

/// Caller-facing summary of a synchronization, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub succeeded: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_internal_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<CanonicalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cavaletes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl SyncResult {
    #[must_use]
    pub fn from_outcome(outcome: &SyncOutcome) -> Self {
        let message = match outcome {
            SyncOutcome::Created(r) => format!(
                "offer imported: {} cavaletes, {} items",
                r.cavaletes, r.items
            ),
            SyncOutcome::Replaced(r) => format!(
                "offer replaced: {} cavaletes, {} items",
                r.cavaletes, r.items
            ),
            SyncOutcome::AlreadyExists { .. } => {
                "offer already exists; replacement not requested".to_string()
            }
        };
        Self {
            succeeded: true,
            message,
            offer_internal_id: Some(outcome.offer_id()),
            canonical_id: Some(outcome.canonical_id().clone()),
            outcome: Some(outcome.outcome()),
            cavaletes: outcome.report().map(|r| r.cavaletes),
            items: outcome.report().map(|r| r.items),
            error_kind: None,
        }
    }

    #[must_use]
    pub fn from_error(err: &SyncError) -> Self {
        Self {
            succeeded: false,
            message: err.public_message(),
            offer_internal_id: None,
            canonical_id: None,
            outcome: None,
            cavaletes: None,
            items: None,
            error_kind: Some(err.kind()),
        }
    }
}

impl From<&Result<SyncOutcome, SyncError>> for SyncResult {
    fn from(result: &Result<SyncOutcome, SyncError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(err) => Self::from_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use mobsync_core::LinkError;

    use super::*;

    fn id() -> CanonicalId {
        "cae15fe7-86a3-4a7b-9a4d-5ed91ae6d568".parse().unwrap()
    }

    #[test]
    fn request_accepts_legacy_field_names() {
        let req: SyncRequest = serde_json::from_value(serde_json::json!({
            "url": "https://www.mobgran.com/?o=x",
            "atualizar_existente": true
        }))
        .unwrap();
        assert_eq!(req, SyncRequest::new("https://www.mobgran.com/?o=x", true));
    }

    #[test]
    fn replace_defaults_to_false() {
        let req: SyncRequest =
            serde_json::from_value(serde_json::json!({"link": "https://www.mobgran.com/"}))
                .unwrap();
        assert!(!req.replace_if_existing);
    }

    #[test]
    fn already_exists_is_a_success() {
        let offer_id = Uuid::new_v4();
        let result = SyncResult::from_outcome(&SyncOutcome::AlreadyExists {
            offer_id,
            canonical_id: id(),
        });
        assert!(result.succeeded);
        assert_eq!(result.offer_internal_id, Some(offer_id));
        assert_eq!(result.outcome, Some(Outcome::AlreadyExists));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "already_exists");
        assert!(json.get("error_kind").is_none());
        assert!(json.get("cavaletes").is_none());
    }

    #[test]
    fn created_carries_counts() {
        let result = SyncResult::from_outcome(&SyncOutcome::Created(SyncReport {
            offer_id: Uuid::new_v4(),
            canonical_id: id(),
            cavaletes: 2,
            items: 4,
            removed_cavaletes: 0,
        }));
        assert_eq!(result.cavaletes, Some(2));
        assert_eq!(result.items, Some(4));
        assert_eq!(result.message, "offer imported: 2 cavaletes, 4 items");
    }

    #[test]
    fn failure_carries_kind_and_no_ids() {
        let failed: Result<SyncOutcome, SyncError> =
            Err(SyncError::from(LinkError::MissingIdentifier));
        let result = SyncResult::from(&failed);
        assert!(!result.succeeded);
        assert_eq!(result.error_kind, Some(ErrorKind::InvalidIdentifier));
        assert_eq!(result.offer_internal_id, None);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error_kind"], "invalid_identifier");
    }
}
