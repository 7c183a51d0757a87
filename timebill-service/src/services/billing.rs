//! Unbilled aggregation and invoice composition.

use crate::models::{
    CreateInvoice, CreateLineItem, Invoice, InvoiceDetail, InvoiceStatus, UnbilledEntry,
    UnbilledGroup, UnbilledLine,
};
use crate::services::metrics::{
    BILLING_PARTIAL_FAILURES_TOTAL, INVOICES_TOTAL, TIME_ENTRIES_BILLED_TOTAL,
};
use crate::services::store::Store;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use suite_core::error::AppError;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Sentinel project/client name for entries whose project row is gone.
const UNKNOWN: &str = "Unknown";

/// Resolve the billing rate for one entry: phase override first, then the
/// project default, then zero.
fn resolve_rate_cents(entry: &UnbilledEntry) -> i64 {
    if let (Some(code), Some(rates)) =
        (entry.phase_code.as_deref(), entry.phase_rates_cents.as_ref())
    {
        if let Some(rate) = rates.get(code) {
            return *rate;
        }
    }
    entry.default_rate_cents.unwrap_or(0)
}

/// Amount for `hours` of work at `rate_cents`, rounded half away from
/// zero on the fractional cent (1.5 h at 6667 c is 10001 c).
fn line_amount_cents(hours: f64, rate_cents: i64) -> i64 {
    (hours * rate_cents as f64).round() as i64
}

/// Group unbilled entries by project, preserving first-seen project order.
///
/// Per entry: hours = minutes / 60 (zero when minutes is null), rate per
/// `resolve_rate_cents`, amount rounded per entry before summing into the
/// group total. Pure; empty input yields an empty list.
pub fn aggregate_unbilled(entries: Vec<UnbilledEntry>) -> Vec<UnbilledGroup> {
    let mut groups: Vec<UnbilledGroup> = Vec::new();

    for entry in entries {
        let minutes = entry.minutes.unwrap_or(0);
        let hours = f64::from(minutes) / 60.0;
        let rate_cents = resolve_rate_cents(&entry);
        let amount_cents = line_amount_cents(hours, rate_cents);

        let idx = match groups.iter().position(|g| g.project_id == entry.project_id) {
            Some(idx) => idx,
            None => {
                groups.push(UnbilledGroup {
                    project_id: entry.project_id,
                    project_name: entry
                        .project_name
                        .clone()
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    client_name: entry
                        .client_name
                        .clone()
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    total_hours: 0.0,
                    total_amount_cents: 0,
                    entries: Vec::new(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.total_hours += hours;
        group.total_amount_cents += amount_cents;
        group.entries.push(UnbilledLine {
            time_entry_id: entry.time_entry_id,
            entry_date: entry.entry_date,
            minutes,
            phase_code: entry.phase_code,
            notes: entry.notes,
            hours,
            rate_cents,
            amount_cents,
        });
    }

    groups
}

/// Header fields for composing an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub invoice_number: String,
    pub project_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: Option<InvoiceStatus>,
    pub vat_percent: Option<f64>,
    pub notes: Option<String>,
}

/// Result of composing an invoice.
///
/// `billing_warning` is set when the invoice was created but marking the
/// source time entries billed did not fully succeed.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeOutcome {
    #[serde(flatten)]
    pub invoice: InvoiceDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_warning: Option<String>,
}

/// Invoice composition workflows over an explicit store handle.
#[derive(Clone)]
pub struct Billing {
    store: Arc<dyn Store>,
}

impl Billing {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an invoice from header fields, caller-priced line items and
    /// the time entries it bills.
    ///
    /// The header and its items are one store transaction; a failure
    /// there aborts the whole request. Marking time entries billed is
    /// deliberately weaker: a short count or a store error leaves the
    /// invoice standing and is reported through `billing_warning`, the
    /// warn log and the partial-failure counter.
    #[instrument(skip(self, header, items, time_entry_ids), fields(invoice_number = %header.invoice_number))]
    pub async fn compose(
        &self,
        header: InvoiceDraft,
        items: Vec<CreateLineItem>,
        time_entry_ids: Vec<Uuid>,
    ) -> Result<ComposeOutcome, AppError> {
        let amount_cents: i64 = items.iter().map(|item| item.amount_cents).sum();

        let create = CreateInvoice {
            invoice_number: header.invoice_number,
            project_id: header.project_id,
            invoice_date: header.invoice_date,
            due_date: header.due_date,
            amount_cents,
            status: header.status.unwrap_or(InvoiceStatus::Draft),
            vat_percent: header.vat_percent,
            notes: header.notes,
        };

        let detail = self.store.insert_invoice(&create, &items).await?;
        INVOICES_TOTAL
            .with_label_values(&[detail.invoice.status.as_str()])
            .inc();

        info!(
            invoice_id = %detail.invoice.invoice_id,
            amount_cents,
            items = detail.items.len(),
            "Invoice created"
        );

        let billing_warning = if time_entry_ids.is_empty() {
            None
        } else {
            self.mark_billed(&detail.invoice, &time_entry_ids).await
        };

        Ok(ComposeOutcome {
            invoice: detail,
            billing_warning,
        })
    }

    /// Step 4 of composition: best-effort, never fails the request.
    async fn mark_billed(&self, invoice: &Invoice, time_entry_ids: &[Uuid]) -> Option<String> {
        match self
            .store
            .mark_entries_billed(time_entry_ids, &invoice.invoice_number, invoice.invoice_date)
            .await
        {
            Ok(marked) if marked == time_entry_ids.len() as u64 => {
                TIME_ENTRIES_BILLED_TOTAL.inc_by(marked as f64);
                None
            }
            Ok(marked) => {
                TIME_ENTRIES_BILLED_TOTAL.inc_by(marked as f64);
                BILLING_PARTIAL_FAILURES_TOTAL.inc();
                let message = format!(
                    "marked {} of {} time entries billed; the rest were already invoiced",
                    marked,
                    time_entry_ids.len()
                );
                warn!(invoice_id = %invoice.invoice_id, %message, "Partial billing mark");
                Some(message)
            }
            Err(e) => {
                BILLING_PARTIAL_FAILURES_TOTAL.inc();
                let message =
                    format!("invoice created but time entries were not marked billed: {}", e);
                warn!(invoice_id = %invoice.invoice_id, error = %e, "Billing mark failed");
                Some(message)
            }
        }
    }

    /// Delete an invoice, releasing any time entries that carry its
    /// number first. Returns false when the invoice does not exist.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn delete(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let invoice = match self.store.get_invoice(invoice_id).await? {
            Some(invoice) => invoice,
            None => return Ok(false),
        };

        let released = self
            .store
            .clear_billed_by_invoice_number(&invoice.invoice_number)
            .await?;
        if released > 0 {
            info!(
                invoice_number = %invoice.invoice_number,
                released,
                "Time entries un-invoiced"
            );
        }

        self.store.delete_invoice(invoice_id).await
    }

    /// Produce a reversing draft invoice for an existing one: number
    /// prefixed with "CN-", dated today, amount and every line item
    /// quantity/amount negated. No time-entry interaction.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn credit_note(
        &self,
        invoice_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<InvoiceDetail>, AppError> {
        let original = match self.store.get_invoice_with_items(invoice_id).await? {
            Some(detail) => detail,
            None => return Ok(None),
        };

        let header = CreateInvoice {
            invoice_number: format!("CN-{}", original.invoice.invoice_number),
            project_id: original.invoice.project_id,
            invoice_date: today,
            due_date: today,
            amount_cents: -original.invoice.amount_cents,
            status: InvoiceStatus::Draft,
            vat_percent: original.invoice.vat_percent,
            notes: Some(format!(
                "Credit note for invoice {}",
                original.invoice.invoice_number
            )),
        };
        let items: Vec<CreateLineItem> = original
            .items
            .iter()
            .map(|item| CreateLineItem {
                description: item.description.clone(),
                quantity: -item.quantity,
                rate_cents: item.rate_cents,
                amount_cents: -item.amount_cents,
            })
            .collect();

        let detail = self.store.insert_invoice(&header, &items).await?;
        INVOICES_TOTAL
            .with_label_values(&[detail.invoice.status.as_str()])
            .inc();

        info!(
            credit_note_id = %detail.invoice.invoice_id,
            invoice_number = %detail.invoice.invoice_number,
            "Credit note created"
        );

        Ok(Some(detail))
    }

    /// Mark an invoice sent. The one status transition this service owns.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn send(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = self
            .store
            .set_invoice_status(invoice_id, InvoiceStatus::Sent)
            .await?;
        if let Some(ref inv) = invoice {
            info!(invoice_number = %inv.invoice_number, "Invoice sent");
        }
        Ok(invoice)
    }
}
