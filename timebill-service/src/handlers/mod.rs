//! HTTP handlers for timebill-service.

mod health;
mod invoices;
mod projects;
mod time_entries;
mod unbilled;

pub use health::{health_check, metrics_endpoint};
pub use invoices::{
    create_credit_note, create_invoice, delete_invoice, get_invoice, list_invoices, send_invoice,
    update_invoice,
};
pub use projects::{get_project, list_projects};
pub use time_entries::{
    create_time_entry, delete_time_entry, list_time_entries, uninvoice_time_entry,
    update_time_entry,
};
pub use unbilled::list_unbilled;
