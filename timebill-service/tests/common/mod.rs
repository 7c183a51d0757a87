//! Shared test harness: an in-memory [`Store`] fake and a `TestApp` that
//! runs the real router against it.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use suite_core::config::Config as CoreConfig;
use suite_core::error::AppError;
use timebill_service::config::{AuthConfig, DatabaseConfig, TimebillConfig};
use timebill_service::models::{
    CreateInvoice, CreateLineItem, CreateTimeEntry, Invoice, InvoiceDetail, InvoiceStatus,
    LineItem, ListInvoicesFilter, ListTimeEntriesFilter, Project, TimeEntry, UnbilledEntry,
    UpdateInvoice, UpdateTimeEntry,
};
use timebill_service::services::{init_metrics, Store};
use timebill_service::startup::Application;
use uuid::Uuid;

pub const TEST_TOKEN: &str = "test-token";

#[derive(Default)]
struct Inner {
    projects: Vec<Project>,
    time_entries: Vec<TimeEntry>,
    invoices: Vec<Invoice>,
    line_items: Vec<LineItem>,
}

/// In-memory store with the same operation set as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_billing_mark: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `mark_entries_billed` calls fail, to exercise the
    /// invoice-created-but-not-marked path.
    pub fn fail_billing_mark(&self, fail: bool) {
        self.fail_billing_mark.store(fail, Ordering::SeqCst);
    }

    pub fn insert_project(&self, project: Project) {
        self.inner.lock().unwrap().projects.push(project);
    }

    pub fn insert_time_entry(&self, entry: TimeEntry) {
        self.inner.lock().unwrap().time_entries.push(entry);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn fetch_unbilled_entries(&self) -> Result<Vec<UnbilledEntry>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<&TimeEntry> = inner
            .time_entries
            .iter()
            .filter(|e| e.invoiced_at.is_none())
            .collect();
        entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));

        Ok(entries
            .into_iter()
            .map(|e| {
                let project = inner
                    .projects
                    .iter()
                    .find(|p| p.project_id == e.project_id);
                UnbilledEntry {
                    time_entry_id: e.time_entry_id,
                    project_id: e.project_id,
                    entry_date: e.entry_date,
                    minutes: e.minutes,
                    phase_code: e.phase_code.clone(),
                    notes: e.notes.clone(),
                    project_name: project.map(|p| p.name.clone()),
                    client_name: project.map(|p| p.client_name.clone()),
                    default_rate_cents: project.map(|p| p.default_rate_cents),
                    phase_rates_cents: project.and_then(|p| p.phase_rates_cents.clone()),
                }
            })
            .collect())
    }

    async fn list_time_entries(
        &self,
        filter: &ListTimeEntriesFilter,
    ) -> Result<Vec<TimeEntry>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<TimeEntry> = inner
            .time_entries
            .iter()
            .filter(|e| filter.project_id.map_or(true, |id| e.project_id == id))
            .filter(|e| {
                filter
                    .billed
                    .map_or(true, |billed| e.invoiced_at.is_some() == billed)
            })
            .filter(|e| filter.start_date.map_or(true, |d| e.entry_date >= d))
            .filter(|e| filter.end_date.map_or(true, |d| e.entry_date <= d))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        Ok(entries)
    }

    async fn create_time_entry(&self, input: &CreateTimeEntry) -> Result<TimeEntry, AppError> {
        let entry = TimeEntry {
            time_entry_id: Uuid::new_v4(),
            project_id: input.project_id,
            entry_date: input.entry_date,
            minutes: input.minutes,
            phase_code: input.phase_code.clone(),
            notes: input.notes.clone(),
            invoiced_at: None,
            invoice_number: None,
            created_utc: Utc::now(),
        };
        self.inner.lock().unwrap().time_entries.push(entry.clone());
        Ok(entry)
    }

    async fn update_time_entry(
        &self,
        time_entry_id: Uuid,
        input: &UpdateTimeEntry,
    ) -> Result<Option<TimeEntry>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .time_entries
            .iter_mut()
            .find(|e| e.time_entry_id == time_entry_id);
        Ok(entry.map(|e| {
            if let Some(date) = input.entry_date {
                e.entry_date = date;
            }
            if let Some(minutes) = input.minutes {
                e.minutes = Some(minutes);
            }
            if let Some(ref phase_code) = input.phase_code {
                e.phase_code = Some(phase_code.clone());
            }
            if let Some(ref notes) = input.notes {
                e.notes = Some(notes.clone());
            }
            e.clone()
        }))
    }

    async fn delete_time_entry(&self, time_entry_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.time_entries.len();
        inner
            .time_entries
            .retain(|e| e.time_entry_id != time_entry_id);
        Ok(inner.time_entries.len() < before)
    }

    async fn mark_entries_billed(
        &self,
        time_entry_ids: &[Uuid],
        invoice_number: &str,
        invoiced_at: NaiveDate,
    ) -> Result<u64, AppError> {
        if self.fail_billing_mark.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "simulated store failure"
            )));
        }

        let mut inner = self.inner.lock().unwrap();
        let mut marked = 0;
        for entry in inner.time_entries.iter_mut() {
            if time_entry_ids.contains(&entry.time_entry_id) && entry.invoiced_at.is_none() {
                entry.invoiced_at = Some(invoiced_at);
                entry.invoice_number = Some(invoice_number.to_string());
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn clear_billed_entry(
        &self,
        time_entry_id: Uuid,
    ) -> Result<Option<TimeEntry>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .time_entries
            .iter_mut()
            .find(|e| e.time_entry_id == time_entry_id);
        Ok(entry.map(|e| {
            e.invoiced_at = None;
            e.invoice_number = None;
            e.clone()
        }))
    }

    async fn clear_billed_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let mut released = 0;
        for entry in inner.time_entries.iter_mut() {
            if entry.invoice_number.as_deref() == Some(invoice_number) {
                entry.invoiced_at = None;
                entry.invoice_number = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let mut projects = self.inner.lock().unwrap().projects.clone();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .projects
            .iter()
            .find(|p| p.project_id == project_id)
            .cloned())
    }

    async fn insert_invoice(
        &self,
        header: &CreateInvoice,
        items: &[CreateLineItem],
    ) -> Result<InvoiceDetail, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .invoices
            .iter()
            .any(|i| i.invoice_number == header.invoice_number)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number '{}' already exists",
                header.invoice_number
            )));
        }

        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            invoice_number: header.invoice_number.clone(),
            project_id: header.project_id,
            invoice_date: header.invoice_date,
            due_date: header.due_date,
            amount_cents: header.amount_cents,
            status: header.status.as_str().to_string(),
            vat_percent: header.vat_percent,
            notes: header.notes.clone(),
            created_utc: Utc::now(),
        };
        inner.invoices.push(invoice.clone());

        let mut line_items = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let line_item = LineItem {
                line_item_id: Uuid::new_v4(),
                invoice_id: invoice.invoice_id,
                description: item.description.clone(),
                quantity: item.quantity,
                rate_cents: item.rate_cents,
                amount_cents: item.amount_cents,
                sort_order: idx as i32,
                created_utc: Utc::now(),
            };
            inner.line_items.push(line_item.clone());
            line_items.push(line_item);
        }

        Ok(InvoiceDetail {
            invoice,
            items: line_items,
        })
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .invoices
            .iter()
            .find(|i| i.invoice_id == invoice_id)
            .cloned())
    }

    async fn get_invoice_with_items(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceDetail>, AppError> {
        let inner = self.inner.lock().unwrap();
        let invoice = match inner.invoices.iter().find(|i| i.invoice_id == invoice_id) {
            Some(invoice) => invoice.clone(),
            None => return Ok(None),
        };
        let mut items: Vec<LineItem> = inner
            .line_items
            .iter()
            .filter(|li| li.invoice_id == invoice_id)
            .cloned()
            .collect();
        items.sort_by_key(|li| li.sort_order);
        Ok(Some(InvoiceDetail { invoice, items }))
    }

    async fn list_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut invoices: Vec<Invoice> = inner
            .invoices
            .iter()
            .filter(|i| {
                filter
                    .status
                    .map_or(true, |status| i.status == status.as_str())
            })
            .filter(|i| filter.project_id.map_or(true, |id| i.project_id == id))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.invoice_date.cmp(&a.invoice_date));
        Ok(invoices)
    }

    async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: &UpdateInvoice,
    ) -> Result<Option<Invoice>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let invoice = inner
            .invoices
            .iter_mut()
            .find(|i| i.invoice_id == invoice_id);
        Ok(invoice.map(|i| {
            if let Some(due_date) = input.due_date {
                i.due_date = due_date;
            }
            if let Some(status) = input.status {
                i.status = status.as_str().to_string();
            }
            if let Some(vat_percent) = input.vat_percent {
                i.vat_percent = Some(vat_percent);
            }
            if let Some(ref notes) = input.notes {
                i.notes = Some(notes.clone());
            }
            i.clone()
        }))
    }

    async fn set_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Option<Invoice>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let invoice = inner
            .invoices
            .iter_mut()
            .find(|i| i.invoice_id == invoice_id);
        Ok(invoice.map(|i| {
            i.status = status.as_str().to_string();
            i.clone()
        }))
    }

    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.invoices.len();
        inner.invoices.retain(|i| i.invoice_id != invoice_id);
        inner.line_items.retain(|li| li.invoice_id != invoice_id);
        Ok(inner.invoices.len() < before)
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_metrics();

        let config = TimebillConfig {
            common: CoreConfig {
                port: 0,
                log_level: "info".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://unused".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            auth: AuthConfig {
                api_token: TEST_TOKEN.to_string(),
            },
        };

        let store = Arc::new(MemoryStore::new());
        let app = Application::build(config, store.clone())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address,
            client: reqwest::Client::new(),
            store,
        }
    }

    pub fn seed_project(
        &self,
        name: &str,
        client_name: &str,
        default_rate_cents: i64,
        phase_rates: Option<HashMap<String, i64>>,
    ) -> Uuid {
        let project_id = Uuid::new_v4();
        self.store.insert_project(Project {
            project_id,
            name: name.to_string(),
            client_name: client_name.to_string(),
            default_rate_cents,
            phase_rates_cents: phase_rates.map(sqlx::types::Json),
            created_utc: Utc::now(),
        });
        project_id
    }

    pub fn seed_time_entry(
        &self,
        project_id: Uuid,
        entry_date: NaiveDate,
        minutes: i32,
        phase_code: Option<&str>,
    ) -> Uuid {
        let time_entry_id = Uuid::new_v4();
        self.store.insert_time_entry(TimeEntry {
            time_entry_id,
            project_id,
            entry_date,
            minutes: Some(minutes),
            phase_code: phase_code.map(String::from),
            notes: None,
            invoiced_at: None,
            invoice_number: None,
            created_utc: Utc::now(),
        });
        time_entry_id
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .bearer_auth(TEST_TOKEN)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .bearer_auth(TEST_TOKEN)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_empty(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .bearer_auth(TEST_TOKEN)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(TEST_TOKEN)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(TEST_TOKEN)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
