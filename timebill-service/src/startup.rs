use crate::config::TimebillConfig;
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::services::{Billing, Store};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use suite_core::error::AppError;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: TimebillConfig,
    pub store: Arc<dyn Store>,
    pub billing: Billing,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: TimebillConfig, store: Arc<dyn Store>) -> Result<Self, AppError> {
        let billing = Billing::new(store.clone());
        let state = AppState {
            config: config.clone(),
            store,
            billing,
        };

        let api = Router::new()
            .route("/unbilled", get(handlers::list_unbilled))
            .route("/projects", get(handlers::list_projects))
            .route("/projects/:id", get(handlers::get_project))
            .route(
                "/time-entries",
                get(handlers::list_time_entries).post(handlers::create_time_entry),
            )
            .route(
                "/time-entries/:id",
                put(handlers::update_time_entry).delete(handlers::delete_time_entry),
            )
            .route(
                "/time-entries/:id/uninvoice",
                post(handlers::uninvoice_time_entry),
            )
            .route(
                "/invoices",
                get(handlers::list_invoices).post(handlers::create_invoice),
            )
            .route(
                "/invoices/:id",
                get(handlers::get_invoice)
                    .put(handlers::update_invoice)
                    .delete(handlers::delete_invoice),
            )
            .route("/invoices/:id/send", post(handlers::send_invoice))
            .route(
                "/invoices/:id/credit-note",
                post(handlers::create_credit_note),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ));

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .merge(api)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
