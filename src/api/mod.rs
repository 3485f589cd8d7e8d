//! HTTP/JSON surface of the ledger.

mod error;
pub mod handlers;

pub use error::*;

use std::future::Future;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::application::LedgerService;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Build the application router over a ledger service.
pub fn router(service: LedgerService) -> Router {
    Router::new()
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/accounts/{id}",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route("/transfer", post(handlers::transfer))
        .route("/adjustments", post(handlers::adjust_balance))
        .route("/health", get(handlers::health_check))
        .with_state(service)
}

/// Serve the API until `shutdown_signal` resolves.
pub async fn serve_with_shutdown<F>(
    service: LedgerService,
    config: ServerConfig,
    shutdown_signal: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(service);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("JSON API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
