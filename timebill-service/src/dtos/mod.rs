//! Request/response DTOs for timebill-service.

mod invoices;
mod time_entries;

pub use invoices::{
    CreateInvoiceRequest, InvoiceListParams, LineItemRequest, UpdateInvoiceRequest,
};
pub use time_entries::{CreateTimeEntryRequest, TimeEntryListParams, UpdateTimeEntryRequest};
