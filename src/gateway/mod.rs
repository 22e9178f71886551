//! HTTP surfaces
//!
//! Two routers over one [`AppState`]:
//! - public: initiate / confirm micro-deposits, health
//! - admin: micro-deposit listing, health
//!
//! The admin router must be bound to its own listener. Its listing exposes
//! the amounts a user is supposed to prove knowledge of.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;

pub use state::AppState;

/// Verification-facing routes
pub fn public_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/depositories/{id}/micro-deposits",
            post(handlers::initiate_micro_deposits),
        )
        .route(
            "/depositories/{id}/micro-deposits/confirm",
            post(handlers::confirm_micro_deposits),
        )
        .with_state(state)
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::PublicApiDoc::openapi()) }),
        )
}

/// Operator-only routes
pub fn admin_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/depositories/{id}/micro-deposits",
            get(handlers::list_micro_deposits),
        )
        .with_state(state)
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::AdminApiDoc::openapi()) }),
        )
}

/// Bind and serve until the server stops
pub async fn serve(name: &'static str, addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("{} listener failed to bind {}: {}", name, addr, e))?;
    tracing::info!("{} listening on http://{}", name, addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ach::mock::MockAchClient;
    use crate::config::OdfiConfig;
    use crate::depository::AccountType;
    use crate::depository::repository::mock::{MockDepositoryRepository, unverified_depository};
    use crate::events::mock::MockEventRepository;
    use crate::micro_deposit::repository::mock::MockMicroDepositRepository;
    use crate::micro_deposit::{MicroDepositStore, OdfiAccount, VerificationWorkflow};
    use serde_json::{Value, json};

    struct Servers {
        public: String,
        admin: String,
        client: reqwest::Client,
    }

    async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{}", addr)
    }

    async fn servers() -> Servers {
        let odfi = OdfiConfig {
            account_number: "9999".to_string(),
            routing_number: "987654320".to_string(),
            account_type: AccountType::Checking,
            identification: "001".to_string(),
            holder: "Operator".to_string(),
            bank_name: "Operator Bank".to_string(),
        };
        let workflow = VerificationWorkflow::new(
            Arc::new(MockDepositoryRepository::with(unverified_depository("dep-1", "user"))),
            MicroDepositStore::new(Arc::new(MockMicroDepositRepository::new())),
            Arc::new(MockAchClient::new()),
            Arc::new(MockEventRepository::new()),
            Arc::new(OdfiAccount::new(&odfi, None)),
            None,
        );
        let state = Arc::new(AppState::new(Arc::new(workflow), None));
        Servers {
            public: spawn(public_router(state.clone())).await,
            admin: spawn(admin_router(state)).await,
            client: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn test_initiate_list_confirm_over_http() {
        let s = servers().await;
        let url = format!("{}/depositories/dep-1/micro-deposits", s.public);

        let resp = s
            .client
            .post(&url)
            .header("X-User-ID", "user")
            .header("X-Request-ID", "req-1")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        assert_eq!(resp.json::<Value>().await.unwrap(), json!({}));

        let resp = s.client.post(&url).header("X-User-ID", "user").send().await.unwrap();
        assert_eq!(resp.status(), 409);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "ALREADY_INITIATED");

        let listed: Vec<Value> = s
            .client
            .get(format!("{}/depositories/dep-1/micro-deposits", s.admin))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);
        let amounts: Vec<String> = listed
            .iter()
            .map(|v| v["amount"].as_str().unwrap().to_string())
            .collect();
        assert!(amounts.iter().all(|a| a.starts_with("USD 0.")));

        let resp = s
            .client
            .post(format!("{}/confirm", url))
            .header("X-User-ID", "user")
            .json(&json!({"amounts": ["0.50", "0.50", "1.00"]}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = s
            .client
            .post(format!("{}/confirm", url))
            .header("X-User-ID", "user")
            .json(&json!({ "amounts": amounts }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.json::<Value>().await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_listing_not_on_public_listener() {
        let s = servers().await;
        let resp = s
            .client
            .get(format!("{}/depositories/dep-1/micro-deposits", s.public))
            .header("X-User-ID", "user")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 405);
    }

    #[tokio::test]
    async fn test_not_found_and_missing_user() {
        let s = servers().await;
        let resp = s
            .client
            .post(format!("{}/depositories/nope/micro-deposits", s.public))
            .header("X-User-ID", "user")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = s
            .client
            .post(format!("{}/depositories/dep-1/micro-deposits", s.public))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn test_confirm_rejects_bad_json() {
        let s = servers().await;
        let resp = s
            .client
            .post(format!("{}/depositories/dep-1/micro-deposits/confirm", s.public))
            .header("X-User-ID", "user")
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_PARAMETER");
    }
}
