//! Category model - groups items within an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Category entity, owned by one event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: Uuid,
    pub event_id: Uuid,
    pub category_label: String,
    pub created_utc: DateTime<Utc>,
}

impl Category {
    pub fn new(event_id: Uuid, category_label: String) -> Self {
        Self {
            category_id: Uuid::new_v4(),
            event_id,
            category_label,
            created_utc: Utc::now(),
        }
    }
}

/// Request to create a category under an event.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub category_label: String,
}

/// Request to update a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub category_label: String,
}
