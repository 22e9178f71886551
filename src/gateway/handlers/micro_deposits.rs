//! Micro-deposit handlers
//!
//! Initiate and confirm are mounted on the public router. The listing handler
//! returns the true amounts and is only ever mounted on the admin router.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, CallerContext};
use crate::depository::DepositoryId;
use crate::micro_deposit::{ConfirmRequest, LedgerStatus, MicroDepositView};

/// Initiation response; `{}` unless the ledger fell behind
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct InitiateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_warning: Option<String>,
}

/// Empty JSON object
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct EmptyResponse {}

/// Start micro-deposit verification
///
/// POST /depositories/{id}/micro-deposits
#[utoipa::path(
    post,
    path = "/depositories/{id}/micro-deposits",
    params(("id" = String, Path, description = "Depository id")),
    responses(
        (status = 201, description = "Micro-deposits initiated", body = InitiateResponse),
        (status = 404, description = "Depository not found"),
        (status = 409, description = "Already initiated or not unverified"),
        (status = 502, description = "Upstream failure")
    ),
    tag = "MicroDeposits"
)]
pub async fn initiate_micro_deposits(
    State(state): State<Arc<AppState>>,
    CallerContext(ctx): CallerContext,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<InitiateResponse>)> {
    let id = DepositoryId::new(id);
    let outcome = state.workflow.initiate(&ctx, &id).await.map_err(|e| {
        tracing::warn!(
            request_id = %ctx.request_id,
            user_id = %ctx.user_id,
            depository_id = %id,
            "initiate failed: {}",
            e
        );
        ApiError::from(e)
    })?;

    let ledger_warning = match outcome.ledger {
        LedgerStatus::Degraded { message } => Some(message),
        LedgerStatus::Disabled | LedgerStatus::Posted { .. } => None,
    };
    Ok((StatusCode::CREATED, Json(InitiateResponse { ledger_warning })))
}

/// Confirm micro-deposit amounts
///
/// POST /depositories/{id}/micro-deposits/confirm
#[utoipa::path(
    post,
    path = "/depositories/{id}/micro-deposits/confirm",
    params(("id" = String, Path, description = "Depository id")),
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Depository verified", body = EmptyResponse),
        (status = 400, description = "No valid amounts or incorrect guesses"),
        (status = 404, description = "Depository not found")
    ),
    tag = "MicroDeposits"
)]
pub async fn confirm_micro_deposits(
    State(state): State<Arc<AppState>>,
    CallerContext(ctx): CallerContext,
    Path(id): Path<String>,
    body: Result<Json<ConfirmRequest>, JsonRejection>,
) -> ApiResult<Json<EmptyResponse>> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let id = DepositoryId::new(id);
    state
        .workflow
        .confirm(&ctx, &id, &req.amounts)
        .await
        .map_err(|e| {
            tracing::warn!(
            request_id = %ctx.request_id,
            user_id = %ctx.user_id,
            depository_id = %id,
            "confirm failed: {}",
            e
        );
            ApiError::from(e)
        })?;
    Ok(Json(EmptyResponse {}))
}

/// List a depository's micro-deposits (admin only)
///
/// GET /depositories/{id}/micro-deposits
#[utoipa::path(
    get,
    path = "/depositories/{id}/micro-deposits",
    params(("id" = String, Path, description = "Depository id")),
    responses(
        (status = 200, description = "Stored micro-deposits", body = Vec<MicroDepositView>)
    ),
    tag = "Admin"
)]
pub async fn list_micro_deposits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<MicroDepositView>>> {
    let id = DepositoryId::new(id);
    let deposits = state.store.list_for_admin(&id).await.map_err(|e| {
        tracing::error!(depository_id = %id, "admin: problem reading micro-deposits: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(deposits.iter().map(MicroDepositView::from).collect()))
}
