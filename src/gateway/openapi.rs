//! OpenAPI documentation
//!
//! Served as JSON at `/api-docs/openapi.json` on each listener.

use utoipa::OpenApi;

use crate::gateway::handlers::{EmptyResponse, HealthResponse, InitiateResponse};
use crate::micro_deposit::{ConfirmRequest, MicroDepositView};

/// Public (verification-facing) API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "paygate micro-deposit API",
        version = "1.0.0",
        description = "Bank account verification through micro-deposits."
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::micro_deposits::initiate_micro_deposits,
        crate::gateway::handlers::micro_deposits::confirm_micro_deposits,
    ),
    components(schemas(HealthResponse, InitiateResponse, EmptyResponse, ConfirmRequest)),
    tags(
        (name = "System", description = "Service health"),
        (name = "MicroDeposits", description = "Depository verification")
    )
)]
pub struct PublicApiDoc;

/// Privileged admin API
#[derive(OpenApi)]
#[openapi(
    info(title = "paygate admin API", version = "1.0.0"),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::micro_deposits::list_micro_deposits,
    ),
    components(schemas(HealthResponse, MicroDepositView)),
    tags((name = "Admin", description = "Operator-only endpoints"))
)]
pub struct AdminApiDoc;
