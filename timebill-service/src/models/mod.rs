//! Domain models for timebill-service.

mod invoice;
mod line_item;
mod project;
mod time_entry;
mod unbilled;

pub use invoice::{
    CreateInvoice, Invoice, InvoiceDetail, InvoiceStatus, ListInvoicesFilter, UpdateInvoice,
};
pub use line_item::{CreateLineItem, LineItem};
pub use project::Project;
pub use time_entry::{CreateTimeEntry, ListTimeEntriesFilter, TimeEntry, UpdateTimeEntry};
pub use unbilled::{UnbilledEntry, UnbilledGroup, UnbilledLine};
