//! Store capability consumed by the billing core and the handlers.

use crate::models::{
    CreateInvoice, CreateLineItem, CreateTimeEntry, Invoice, InvoiceDetail, InvoiceStatus,
    ListInvoicesFilter, ListTimeEntriesFilter, Project, TimeEntry, UnbilledEntry, UpdateInvoice,
    UpdateTimeEntry,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use suite_core::error::AppError;
use uuid::Uuid;

/// Persistence operations this service depends on.
///
/// `PgStore` is the production implementation; tests substitute an
/// in-memory fake so the billing workflows can be exercised without a
/// database.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Time entries

    /// Unbilled entries joined with their project's billing fields,
    /// newest first.
    async fn fetch_unbilled_entries(&self) -> Result<Vec<UnbilledEntry>, AppError>;

    async fn list_time_entries(
        &self,
        filter: &ListTimeEntriesFilter,
    ) -> Result<Vec<TimeEntry>, AppError>;

    async fn create_time_entry(&self, input: &CreateTimeEntry) -> Result<TimeEntry, AppError>;

    async fn update_time_entry(
        &self,
        time_entry_id: Uuid,
        input: &UpdateTimeEntry,
    ) -> Result<Option<TimeEntry>, AppError>;

    async fn delete_time_entry(&self, time_entry_id: Uuid) -> Result<bool, AppError>;

    /// Mark entries billed, but only those still unbilled. Returns the
    /// number of rows actually updated; a short count means some entries
    /// were already carrying an invoice.
    async fn mark_entries_billed(
        &self,
        time_entry_ids: &[Uuid],
        invoice_number: &str,
        invoiced_at: NaiveDate,
    ) -> Result<u64, AppError>;

    /// Clear both billed fields on a single entry.
    async fn clear_billed_entry(&self, time_entry_id: Uuid)
        -> Result<Option<TimeEntry>, AppError>;

    /// Clear both billed fields on every entry carrying the given invoice
    /// number. Returns the number of entries released.
    async fn clear_billed_by_invoice_number(&self, invoice_number: &str)
        -> Result<u64, AppError>;

    // Projects (read-only to this service)

    async fn list_projects(&self) -> Result<Vec<Project>, AppError>;

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError>;

    // Invoices

    /// Insert the header and all line items as one unit of work,
    /// preserving item order.
    async fn insert_invoice(
        &self,
        header: &CreateInvoice,
        items: &[CreateLineItem],
    ) -> Result<InvoiceDetail, AppError>;

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;

    async fn get_invoice_with_items(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceDetail>, AppError>;

    async fn list_invoices(&self, filter: &ListInvoicesFilter)
        -> Result<Vec<Invoice>, AppError>;

    async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: &UpdateInvoice,
    ) -> Result<Option<Invoice>, AppError>;

    async fn set_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Option<Invoice>, AppError>;

    /// Delete the invoice and its line items. Returns false when the
    /// invoice does not exist.
    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError>;
}
