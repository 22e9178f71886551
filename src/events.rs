//! Audit events for created transfers

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::ach::TransferRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventType {
    TransferEvent,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TransferEvent => "TransferEvent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: String,
    pub topic: String,
    pub message: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
}

impl Event {
    /// Event recording the creation of a transfer
    pub fn transfer_created(req: &TransferRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: format!("{} transfer to {}", req.transfer_type.as_str(), req.description),
            message: format!(
                "{} transfer of {} from {} to {}",
                req.transfer_type.as_str(),
                req.amount,
                req.originator,
                req.receiver
            ),
            event_type: EventType::TransferEvent,
        }
    }
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn write_event(&self, user_id: &str, event: &Event) -> Result<(), sqlx::Error>;
}

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn write_event(&self, user_id: &str, event: &Event) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO events (event_id, user_id, topic, message, type, created_at)
               VALUES ($1, $2, $3, $4, $5, NOW())"#,
        )
        .bind(&event.id)
        .bind(user_id)
        .bind(&event.topic)
        .bind(&event.message)
        .bind(event.event_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory event sink for tests
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockEventRepository {
        events: Mutex<Vec<(String, Event)>>,
        fail: Mutex<bool>,
    }

    impl MockEventRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        pub fn events(&self) -> Vec<(String, Event)> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventRepository for MockEventRepository {
        async fn write_event(&self, user_id: &str, event: &Event) -> Result<(), sqlx::Error> {
            if *self.fail.lock().unwrap() {
                return Err(sqlx::Error::PoolClosed);
            }
            self.events
                .lock()
                .unwrap()
                .push((user_id.to_string(), event.clone()));
            Ok(())
        }
    }
}
