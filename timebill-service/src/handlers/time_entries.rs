use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use suite_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{CreateTimeEntryRequest, TimeEntryListParams, UpdateTimeEntryRequest};
use crate::models::{CreateTimeEntry, ListTimeEntriesFilter, UpdateTimeEntry};
use crate::startup::AppState;

pub async fn list_time_entries(
    State(state): State<AppState>,
    Query(params): Query<TimeEntryListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ListTimeEntriesFilter {
        project_id: params.project_id,
        billed: params.billed,
        start_date: params.start_date,
        end_date: params.end_date,
    };
    let entries = state.store.list_time_entries(&filter).await?;
    Ok(Json(entries))
}

pub async fn create_time_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateTimeEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let input = CreateTimeEntry {
        project_id: payload.project_id,
        entry_date: payload.entry_date,
        minutes: payload.minutes,
        phase_code: payload.phase_code,
        notes: payload.notes,
    };
    let entry = state.store.create_time_entry(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_time_entry(
    State(state): State<AppState>,
    Path(time_entry_id): Path<Uuid>,
    Json(payload): Json<UpdateTimeEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let input = UpdateTimeEntry {
        entry_date: payload.entry_date,
        minutes: payload.minutes,
        phase_code: payload.phase_code,
        notes: payload.notes,
    };
    let entry = state
        .store
        .update_time_entry(time_entry_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Time entry not found")))?;
    Ok(Json(entry))
}

pub async fn delete_time_entry(
    State(state): State<AppState>,
    Path(time_entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete_time_entry(time_entry_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Time entry not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Clear both billed fields, returning the entry to the unbilled pool.
pub async fn uninvoice_time_entry(
    State(state): State<AppState>,
    Path(time_entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state
        .store
        .clear_billed_entry(time_entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Time entry not found")))?;
    Ok(Json(entry))
}
