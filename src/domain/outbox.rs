use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::errors::DomainError;
use super::events::OrderEvent;

#[derive(Debug, Clone)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub event_type: String,
    pub payload: Value,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl OutboxMessage {
    pub fn decode(&self) -> Result<OrderEvent, DomainError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::Internal(format!("undecodable outbox payload {}: {}", self.id, e))
        })
    }
}
