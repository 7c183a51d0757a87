//! Line item model for timebill-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One billable line on an invoice.
///
/// `amount_cents` arrives from the caller already rounded (quantity x
/// rate); it is summed into the invoice total as-is.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    pub quantity: f64,
    pub rate_cents: i64,
    pub amount_cents: i64,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a line item.
#[derive(Debug, Clone)]
pub struct CreateLineItem {
    pub description: String,
    pub quantity: f64,
    pub rate_cents: i64,
    pub amount_cents: i64,
}
