//! Bank account model.
//!
//! A bank account is linked to zero or more events. Who "manages" an
//! account is never stored: it is derived at query time as the union of
//! users holding the manager role on any linked event, because role
//! grants change independently of the account record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Bank account entity (tenant-scoped).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BankAccount {
    pub account_id: Uuid,
    pub account_label: String,
    pub iban: Option<String>,
    pub balance_cents: i64,
    pub created_utc: DateTime<Utc>,
}

impl BankAccount {
    /// Create a new bank account with a zero balance.
    pub fn new(account_label: String, iban: Option<String>) -> Self {
        Self {
            account_id: Uuid::new_v4(),
            account_label,
            iban,
            balance_cents: 0,
            created_utc: Utc::now(),
        }
    }
}

/// Request to create a bank account.
#[derive(Debug, Deserialize)]
pub struct CreateBankAccountRequest {
    pub account_label: String,
    pub iban: Option<String>,
}

/// Request to update a bank account.
#[derive(Debug, Deserialize)]
pub struct UpdateBankAccountRequest {
    pub account_label: Option<String>,
    pub iban: Option<String>,
    pub balance_cents: Option<i64>,
}
