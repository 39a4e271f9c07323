//! Event model - groups users and financial activity within a tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Event entity. The anchor for role scoping: memberships and event
/// tokens are always bound to one event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub event_id: Uuid,
    pub event_label: String,
    pub description: Option<String>,
    pub bank_account_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

impl Event {
    /// Create a new event.
    pub fn new(event_label: String, description: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_label,
            description,
            bank_account_id: None,
            created_utc: Utc::now(),
        }
    }
}

/// Request to create an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub event_label: String,
    pub description: Option<String>,
    pub bank_account_id: Option<Uuid>,
}

/// Request to update an event.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub event_label: Option<String>,
    pub description: Option<String>,
    pub bank_account_id: Option<Uuid>,
}
