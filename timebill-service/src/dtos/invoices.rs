use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::InvoiceStatus;

/// Body for `POST /invoices`.
///
/// Line item amounts are caller-priced and trusted as-is; the invoice
/// total is their sum. `time_entry_ids` may be empty for invoices not
/// originating from time tracking.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    pub project_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub vat_percent: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub time_entry_ids: Vec<Uuid>,
}

/// One line item in a create-invoice body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItemRequest {
    pub description: String,
    pub quantity: f64,
    pub rate_cents: i64,
    pub amount_cents: i64,
}

/// Body for `PUT /invoices/:id`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInvoiceRequest {
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub vat_percent: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters for `GET /invoices`.
#[derive(Debug, Deserialize, Default)]
pub struct InvoiceListParams {
    pub status: Option<String>,
    pub project_id: Option<Uuid>,
}
