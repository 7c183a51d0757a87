use axum::{extract::State, response::IntoResponse, Json};
use suite_core::error::AppError;

use crate::services::billing::aggregate_unbilled;
use crate::startup::AppState;

/// Unbilled time grouped by project, with per-entry resolved rates and
/// amounts ready to prefill invoice line items.
pub async fn list_unbilled(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let entries = state.store.fetch_unbilled_entries().await?;
    let groups = aggregate_unbilled(entries);
    Ok(Json(groups))
}
