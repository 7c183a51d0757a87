//! PostgreSQL store for timebill-service.

use crate::models::{
    CreateInvoice, CreateLineItem, CreateTimeEntry, Invoice, InvoiceDetail, InvoiceStatus,
    LineItem, ListInvoicesFilter, ListTimeEntriesFilter, Project, TimeEntry, UnbilledEntry,
    UpdateInvoice, UpdateTimeEntry,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::Store;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use suite_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper implementing [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "timebill-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Time Entry Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn fetch_unbilled_entries(&self) -> Result<Vec<UnbilledEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["fetch_unbilled_entries"])
            .start_timer();

        let entries = sqlx::query_as::<_, UnbilledEntry>(
            r#"
            SELECT t.time_entry_id, t.project_id, t.entry_date, t.minutes, t.phase_code, t.notes,
                p.name AS project_name, p.client_name, p.default_rate_cents, p.phase_rates_cents
            FROM time_entries t
            LEFT JOIN projects p ON p.project_id = t.project_id
            WHERE t.invoiced_at IS NULL
            ORDER BY t.entry_date DESC, t.created_utc DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch unbilled entries: {}", e))
        })?;

        timer.observe_duration();

        Ok(entries)
    }

    #[instrument(skip(self, filter))]
    async fn list_time_entries(
        &self,
        filter: &ListTimeEntriesFilter,
    ) -> Result<Vec<TimeEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_time_entries"])
            .start_timer();

        let entries = sqlx::query_as::<_, TimeEntry>(
            r#"
            SELECT time_entry_id, project_id, entry_date, minutes, phase_code, notes,
                invoiced_at, invoice_number, created_utc
            FROM time_entries
            WHERE ($1::uuid IS NULL OR project_id = $1)
              AND ($2::bool IS NULL OR (invoiced_at IS NOT NULL) = $2)
              AND ($3::date IS NULL OR entry_date >= $3)
              AND ($4::date IS NULL OR entry_date <= $4)
            ORDER BY entry_date DESC, created_utc DESC
            "#,
        )
        .bind(filter.project_id)
        .bind(filter.billed)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list time entries: {}", e))
        })?;

        timer.observe_duration();

        Ok(entries)
    }

    #[instrument(skip(self, input), fields(project_id = %input.project_id))]
    async fn create_time_entry(&self, input: &CreateTimeEntry) -> Result<TimeEntry, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_time_entry"])
            .start_timer();

        let time_entry_id = Uuid::new_v4();
        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            INSERT INTO time_entries (time_entry_id, project_id, entry_date, minutes, phase_code, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING time_entry_id, project_id, entry_date, minutes, phase_code, notes,
                invoiced_at, invoice_number, created_utc
            "#,
        )
        .bind(time_entry_id)
        .bind(input.project_id)
        .bind(input.entry_date)
        .bind(input.minutes)
        .bind(&input.phase_code)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create time entry: {}", e))
        })?;

        timer.observe_duration();

        info!(time_entry_id = %entry.time_entry_id, "Time entry created");

        Ok(entry)
    }

    #[instrument(skip(self, input), fields(time_entry_id = %time_entry_id))]
    async fn update_time_entry(
        &self,
        time_entry_id: Uuid,
        input: &UpdateTimeEntry,
    ) -> Result<Option<TimeEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_time_entry"])
            .start_timer();

        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            UPDATE time_entries
            SET entry_date = COALESCE($2, entry_date),
                minutes = COALESCE($3, minutes),
                phase_code = COALESCE($4, phase_code),
                notes = COALESCE($5, notes)
            WHERE time_entry_id = $1
            RETURNING time_entry_id, project_id, entry_date, minutes, phase_code, notes,
                invoiced_at, invoice_number, created_utc
            "#,
        )
        .bind(time_entry_id)
        .bind(input.entry_date)
        .bind(input.minutes)
        .bind(&input.phase_code)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update time entry: {}", e))
        })?;

        timer.observe_duration();

        Ok(entry)
    }

    #[instrument(skip(self), fields(time_entry_id = %time_entry_id))]
    async fn delete_time_entry(&self, time_entry_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_time_entry"])
            .start_timer();

        let result = sqlx::query(
            r#"
            DELETE FROM time_entries
            WHERE time_entry_id = $1
            "#,
        )
        .bind(time_entry_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete time entry: {}", e))
        })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    /// The condition on `invoiced_at IS NULL` is what makes concurrent
    /// composes over overlapping entries safe: each entry is claimed by
    /// at most one invoice.
    #[instrument(skip(self, time_entry_ids), fields(invoice_number = %invoice_number))]
    async fn mark_entries_billed(
        &self,
        time_entry_ids: &[Uuid],
        invoice_number: &str,
        invoiced_at: NaiveDate,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_entries_billed"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE time_entries
            SET invoiced_at = $2, invoice_number = $3
            WHERE time_entry_id = ANY($1) AND invoiced_at IS NULL
            "#,
        )
        .bind(time_entry_ids)
        .bind(invoiced_at)
        .bind(invoice_number)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to mark entries billed: {}", e))
        })?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(time_entry_id = %time_entry_id))]
    async fn clear_billed_entry(
        &self,
        time_entry_id: Uuid,
    ) -> Result<Option<TimeEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["clear_billed_entry"])
            .start_timer();

        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            UPDATE time_entries
            SET invoiced_at = NULL, invoice_number = NULL
            WHERE time_entry_id = $1
            RETURNING time_entry_id, project_id, entry_date, minutes, phase_code, notes,
                invoiced_at, invoice_number, created_utc
            "#,
        )
        .bind(time_entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to clear billed entry: {}", e))
        })?;

        timer.observe_duration();

        Ok(entry)
    }

    #[instrument(skip(self), fields(invoice_number = %invoice_number))]
    async fn clear_billed_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["clear_billed_by_invoice_number"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE time_entries
            SET invoiced_at = NULL, invoice_number = NULL
            WHERE invoice_number = $1
            "#,
        )
        .bind(invoice_number)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to clear billed entries: {}", e))
        })?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    // -------------------------------------------------------------------------
    // Project Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_projects"])
            .start_timer();

        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT project_id, name, client_name, default_rate_cents, phase_rates_cents, created_utc
            FROM projects
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list projects: {}", e)))?;

        timer.observe_duration();

        Ok(projects)
    }

    #[instrument(skip(self), fields(project_id = %project_id))]
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_project"])
            .start_timer();

        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT project_id, name, client_name, default_rate_cents, phase_rates_cents, created_utc
            FROM projects
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get project: {}", e)))?;

        timer.observe_duration();

        Ok(project)
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, header, items), fields(invoice_number = %header.invoice_number))]
    async fn insert_invoice(
        &self,
        header: &CreateInvoice,
        items: &[CreateLineItem],
    ) -> Result<InvoiceDetail, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice_id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, project_id, invoice_date, due_date,
                amount_cents, status, vat_percent, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING invoice_id, invoice_number, project_id, invoice_date, due_date,
                amount_cents, status, vat_percent, notes, created_utc
            "#,
        )
        .bind(invoice_id)
        .bind(&header.invoice_number)
        .bind(header.project_id)
        .bind(header.invoice_date)
        .bind(header.due_date)
        .bind(header.amount_cents)
        .bind(header.status.as_str())
        .bind(header.vat_percent)
        .bind(&header.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice number '{}' already exists",
                    header.invoice_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)),
        })?;

        let mut line_items = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let line_item = sqlx::query_as::<_, LineItem>(
                r#"
                INSERT INTO line_items (
                    line_item_id, invoice_id, description, quantity, rate_cents,
                    amount_cents, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING line_item_id, invoice_id, description, quantity, rate_cents,
                    amount_cents, sort_order, created_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(invoice.invoice_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.rate_cents)
            .bind(item.amount_cents)
            .bind(idx as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert line item: {}", e))
            })?;
            line_items.push(line_item);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit invoice: {}", e))
        })?;

        timer.observe_duration();

        info!(invoice_id = %invoice.invoice_id, "Invoice row created");

        Ok(InvoiceDetail {
            invoice,
            items: line_items,
        })
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, invoice_number, project_id, invoice_date, due_date,
                amount_cents, status, vat_percent, notes, created_utc
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice_with_items(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceDetail>, AppError> {
        let invoice = match self.get_invoice(invoice_id).await? {
            Some(invoice) => invoice,
            None => return Ok(None),
        };

        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_line_items"])
            .start_timer();

        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT line_item_id, invoice_id, description, quantity, rate_cents,
                amount_cents, sort_order, created_utc
            FROM line_items
            WHERE invoice_id = $1
            ORDER BY sort_order, created_utc
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))?;

        timer.observe_duration();

        Ok(Some(InvoiceDetail { invoice, items }))
    }

    #[instrument(skip(self, filter))]
    async fn list_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let status_str = filter.status.map(|s| s.as_str().to_string());

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, invoice_number, project_id, invoice_date, due_date,
                amount_cents, status, vat_percent, notes, created_utc
            FROM invoices
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY invoice_date DESC, created_utc DESC
            "#,
        )
        .bind(&status_str)
        .bind(filter.project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: &UpdateInvoice,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let status_str = input.status.map(|s| s.as_str().to_string());

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET due_date = COALESCE($2, due_date),
                status = COALESCE($3, status),
                vat_percent = COALESCE($4, vat_percent),
                notes = COALESCE($5, notes)
            WHERE invoice_id = $1
            RETURNING invoice_id, invoice_number, project_id, invoice_date, due_date,
                amount_cents, status, vat_percent, notes, created_utc
            "#,
        )
        .bind(invoice_id)
        .bind(input.due_date)
        .bind(&status_str)
        .bind(input.vat_percent)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        if let Some(ref inv) = invoice {
            info!(invoice_id = %inv.invoice_id, "Invoice updated");
        }

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id, status = status.as_str()))]
    async fn set_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_invoice_status"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $2
            WHERE invoice_id = $1
            RETURNING invoice_id, invoice_number, project_id, invoice_date, due_date,
                amount_cents, status, vat_percent, notes, created_utc
            "#,
        )
        .bind(invoice_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to set invoice status: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            DELETE FROM line_items
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete line items: {}", e))
        })?;

        let result = sqlx::query(
            r#"
            DELETE FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit delete: {}", e))
        })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(invoice_id = %invoice_id, "Invoice deleted");
        }

        Ok(deleted)
    }
}
