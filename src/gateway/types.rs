//! API response and error types
//!
//! - `ApiResponse<T>`: `{code, msg, data}` wrapper used for health and errors
//! - `ApiError`: error response carrying an HTTP status
//! - `CallerContext`: caller identity taken from request headers

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::micro_deposit::{MicroDepositError, RequestContext};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unified API response wrapper
///
/// - code: `"OK"` on success, a stable error code otherwise
/// - msg: short message description
/// - data: payload on success
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = "OK")]
    pub code: String,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: "OK".to_string(),
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: impl Into<String>, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code: code.into(),
            msg: msg.into(),
            data: None,
        }
    }
}

/// Error response: status plus `{code, msg}` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_PARAMETER", msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "MISSING_AUTH", msg)
    }
}

impl From<MicroDepositError> for ApiError {
    fn from(e: MicroDepositError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.code(), e.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Caller identity. A missing request id is replaced with a fresh one.
#[derive(Debug, Clone)]
pub struct CallerContext(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for CallerContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("missing X-User-ID header"))?;
        let request_id =
            header(REQUEST_ID_HEADER).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(CallerContext(RequestContext::new(request_id, user_id)))
    }
}
