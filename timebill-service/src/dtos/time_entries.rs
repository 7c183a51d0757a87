use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Body for `POST /time-entries`.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTimeEntryRequest {
    pub project_id: Uuid,
    pub entry_date: NaiveDate,
    #[serde(default)]
    #[validate(range(min = 0, message = "Minutes must not be negative"))]
    pub minutes: Option<i32>,
    #[serde(default)]
    pub phase_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body for `PUT /time-entries/:id`.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTimeEntryRequest {
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Minutes must not be negative"))]
    pub minutes: Option<i32>,
    #[serde(default)]
    pub phase_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters for `GET /time-entries`.
#[derive(Debug, Deserialize, Default)]
pub struct TimeEntryListParams {
    pub project_id: Option<Uuid>,
    pub billed: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
