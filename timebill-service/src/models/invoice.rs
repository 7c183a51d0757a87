//! Invoice model for timebill-service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::LineItem;

/// Invoice status.
///
/// The service performs the draft -> sent transition itself; the other
/// transitions are driven by the external payment workflow through
/// invoice updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Overdue,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => InvoiceStatus::Sent,
            "overdue" => InvoiceStatus::Overdue,
            "paid" => InvoiceStatus::Paid,
            "void" => InvoiceStatus::Void,
            _ => InvoiceStatus::Draft,
        }
    }
}

/// Billing document.
///
/// `amount_cents` is fixed at creation as the sum of the line item
/// amounts and is never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    // Serialized as plain "id" for frontend compatibility; the column
    // keeps the explicit name.
    #[serde(rename = "id")]
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub project_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    pub status: String,
    pub vat_percent: Option<f64>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Invoice enriched with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<LineItem>,
}

/// Input for creating an invoice header.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub invoice_number: String,
    pub project_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    pub vat_percent: Option<f64>,
    pub notes: Option<String>,
}

/// Input for updating an invoice.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub vat_percent: Option<f64>,
    pub notes: Option<String>,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub project_id: Option<Uuid>,
}
