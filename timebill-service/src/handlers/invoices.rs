use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use suite_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{CreateInvoiceRequest, InvoiceListParams, UpdateInvoiceRequest};
use crate::models::{CreateLineItem, InvoiceStatus, ListInvoicesFilter, UpdateInvoice};
use crate::services::billing::InvoiceDraft;
use crate::startup::AppState;

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let header = InvoiceDraft {
        invoice_number: payload.invoice_number,
        project_id: payload.project_id,
        invoice_date: payload.invoice_date,
        due_date: payload.due_date,
        status: payload.status,
        vat_percent: payload.vat_percent,
        notes: payload.notes,
    };
    let items: Vec<CreateLineItem> = payload
        .items
        .into_iter()
        .map(|item| CreateLineItem {
            description: item.description,
            quantity: item.quantity,
            rate_cents: item.rate_cents,
            amount_cents: item.amount_cents,
        })
        .collect();

    let outcome = state
        .billing
        .compose(header, items, payload.time_entry_ids)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ListInvoicesFilter {
        status: params.status.as_deref().map(InvoiceStatus::from_string),
        project_id: params.project_id,
    };
    let invoices = state.store.list_invoices(&filter).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .store
        .get_invoice_with_items(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    Ok(Json(detail))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = UpdateInvoice {
        due_date: payload.due_date,
        status: payload.status,
        vat_percent: payload.vat_percent,
        notes: payload.notes,
    };
    let invoice = state
        .store
        .update_invoice(invoice_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    Ok(Json(invoice))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.billing.delete(invoice_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state
        .billing
        .send(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    Ok(Json(invoice))
}

pub async fn create_credit_note(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let today = chrono::Utc::now().date_naive();
    let detail = state
        .billing
        .credit_note(invoice_id, today)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    Ok((StatusCode::CREATED, Json(detail)))
}
