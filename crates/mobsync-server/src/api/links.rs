use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use mobsync_core::{extract_identifier, validate_link as check_link, CanonicalId};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct LinkBody {
    #[serde(alias = "link")]
    pub url: String,
}

fn parse_body(
    req_id: &RequestId,
    body: Result<Json<LinkBody>, JsonRejection>,
) -> Result<LinkBody, ApiError> {
    body.map(|Json(body)| body).map_err(|e| {
        tracing::debug!(error = %e, "rejected link body");
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            "body must be JSON with a `url` string",
        )
    })
}

#[derive(Debug, Serialize)]
pub(super) struct LinkValidation {
    valid: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_id: Option<CanonicalId>,
}

#[derive(Debug, Serialize)]
pub(super) struct ExtractedIdentifier {
    canonical_id: CanonicalId,
}

/// Checks a link against the provider domain without fetching anything.
/// An invalid link is still a 200; `valid` carries the verdict.
pub(super) async fn validate_link(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<LinkBody>, JsonRejection>,
) -> Result<Json<ApiResponse<LinkValidation>>, ApiError> {
    let body = parse_body(&req_id, body)?;
    let data = match check_link(&body.url, state.synchronizer.domain_marker()) {
        Ok(id) => LinkValidation {
            valid: true,
            message: "link is valid".to_string(),
            canonical_id: Some(id),
        },
        Err(e) => LinkValidation {
            valid: false,
            message: e.to_string(),
            canonical_id: None,
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn extract_link(
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<LinkBody>, JsonRejection>,
) -> Result<Json<ApiResponse<ExtractedIdentifier>>, ApiError> {
    let body = parse_body(&req_id, body)?;
    let canonical_id = extract_identifier(&body.url)
        .map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.to_string()))?;

    Ok(Json(ApiResponse {
        data: ExtractedIdentifier { canonical_id },
        meta: ResponseMeta::new(req_id.0),
    }))
}
