use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use mobsync_db::{OfferSummaryRow, OfferTree};
use mobsync_sync::{ErrorKind, SyncRequest, SyncResult};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct OfferListQuery {
    pub limit: Option<i64>,
}

/// HTTP status for a synchronization result. Successful results, including
/// "already exists", are 200.
fn sync_status(result: &SyncResult) -> StatusCode {
    match result.error_kind {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidIdentifier | ErrorKind::InvalidDomain) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::UpstreamRejected | ErrorKind::UpstreamMalformed) => StatusCode::BAD_GATEWAY,
        Some(ErrorKind::UpstreamUnavailable) => StatusCode::GATEWAY_TIMEOUT,
        Some(ErrorKind::PersistenceFailure) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(super) async fn import_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SyncResult>>), ApiError> {
    let Json(request) = body.map_err(|e| {
        tracing::debug!(error = %e, "rejected import body");
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            "body must be JSON with a `link` string",
        )
    })?;

    let result = SyncResult::from(&state.synchronizer.synchronize(&request).await);

    Ok((
        sync_status(&result),
        Json(ApiResponse {
            data: result,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn list_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OfferListQuery>,
) -> Result<Json<ApiResponse<Vec<OfferSummaryRow>>>, ApiError> {
    let rows = mobsync_db::list_offers(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<ApiResponse<OfferTree>>, ApiError> {
    let tree = mobsync_db::get_offer_tree(&state.pool, offer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("offer {offer_id} not found"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: tree,
        meta: ResponseMeta::new(req_id.0),
    }))
}
