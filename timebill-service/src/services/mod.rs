//! Services for timebill-service.

pub mod billing;
pub mod database;
pub mod metrics;
pub mod store;

pub use billing::{aggregate_unbilled, Billing, ComposeOutcome, InvoiceDraft};
pub use database::PgStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::Store;
