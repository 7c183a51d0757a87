//! Time entry model for timebill-service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recorded span of billable work.
///
/// `invoiced_at` and `invoice_number` are either both null (unbilled) or
/// both set; every write path updates the pair in a single statement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeEntry {
    pub time_entry_id: Uuid,
    pub project_id: Uuid,
    pub entry_date: NaiveDate,
    pub minutes: Option<i32>,
    pub phase_code: Option<String>,
    pub notes: Option<String>,
    pub invoiced_at: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording a time entry.
#[derive(Debug, Clone)]
pub struct CreateTimeEntry {
    pub project_id: Uuid,
    pub entry_date: NaiveDate,
    pub minutes: Option<i32>,
    pub phase_code: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a time entry.
#[derive(Debug, Clone, Default)]
pub struct UpdateTimeEntry {
    pub entry_date: Option<NaiveDate>,
    pub minutes: Option<i32>,
    pub phase_code: Option<String>,
    pub notes: Option<String>,
}

/// Filter parameters for listing time entries.
#[derive(Debug, Clone, Default)]
pub struct ListTimeEntriesFilter {
    pub project_id: Option<Uuid>,
    pub billed: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
