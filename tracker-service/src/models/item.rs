//! Item model - a single financial entry within a category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Item entity, owned by one category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub item_id: Uuid,
    pub category_id: Uuid,
    pub item_label: String,
    pub amount_cents: i64,
    pub created_utc: DateTime<Utc>,
}

impl Item {
    pub fn new(category_id: Uuid, item_label: String, amount_cents: i64) -> Self {
        Self {
            item_id: Uuid::new_v4(),
            category_id,
            item_label,
            amount_cents,
            created_utc: Utc::now(),
        }
    }
}

/// Request to create an item under a category.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub item_label: String,
    pub amount_cents: i64,
}

/// Request to update an item.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub item_label: Option<String>,
    pub amount_cents: Option<i64>,
}
