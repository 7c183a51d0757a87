//! Project model for timebill-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Billing context for time entries.
///
/// Projects are owned by the project-management side of the suite; this
/// service reads them only, to resolve names and billing rates.
/// `phase_rates_cents` maps phase codes to override rates and need not
/// cover every phase.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub project_id: Uuid,
    pub name: String,
    pub client_name: String,
    pub default_rate_cents: i64,
    pub phase_rates_cents: Option<Json<HashMap<String, i64>>>,
    pub created_utc: DateTime<Utc>,
}
