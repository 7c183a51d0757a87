use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use suite_core::error::AppError;
use uuid::Uuid;

use crate::startup::AppState;

pub async fn list_projects(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let projects = state.store.list_projects().await?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let project = state
        .store
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Project not found")))?;
    Ok(Json(project))
}
