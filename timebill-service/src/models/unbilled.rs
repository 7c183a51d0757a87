//! Unbilled aggregation types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// An unbilled time entry joined with its project's billing fields.
///
/// The store guarantees `invoiced_at IS NULL` on these rows; the
/// aggregation does not re-check it. Project fields are null when the
/// owning project row is gone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UnbilledEntry {
    pub time_entry_id: Uuid,
    pub project_id: Uuid,
    pub entry_date: NaiveDate,
    pub minutes: Option<i32>,
    pub phase_code: Option<String>,
    pub notes: Option<String>,
    pub project_name: Option<String>,
    pub client_name: Option<String>,
    pub default_rate_cents: Option<i64>,
    pub phase_rates_cents: Option<Json<HashMap<String, i64>>>,
}

/// One contributing entry inside an unbilled group, with its resolved
/// hours, rate and rounded amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbilledLine {
    pub time_entry_id: Uuid,
    pub entry_date: NaiveDate,
    pub minutes: i32,
    pub phase_code: Option<String>,
    pub notes: Option<String>,
    pub hours: f64,
    pub rate_cents: i64,
    pub amount_cents: i64,
}

/// Per-project aggregation of unbilled work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbilledGroup {
    pub project_id: Uuid,
    pub project_name: String,
    pub client_name: String,
    pub total_hours: f64,
    pub total_amount_cents: i64,
    pub entries: Vec<UnbilledLine>,
}
