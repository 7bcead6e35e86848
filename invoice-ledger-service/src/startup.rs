//! Application startup and lifecycle.

use service_core::error::AppError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::LedgerConfig;
use crate::services::{init_metrics, Ledger};
use crate::{build_router, AppState};

pub struct Application {
    listener: TcpListener,
    port: u16,
    state: AppState,
}

impl Application {
    /// Build the application from configuration. Binds the listener so that
    /// port 0 resolves to a real port before the server starts.
    pub async fn build(config: LedgerConfig) -> Result<Self, AppError> {
        let ledger = Ledger::from_settings(config.ledger.clone())?;
        Self::build_with_ledger(config, ledger).await
    }

    /// Build around an existing ledger (custom id generator or clock).
    pub async fn build_with_ledger(config: LedgerConfig, ledger: Ledger) -> Result<Self, AppError> {
        init_metrics();

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            service = %config.service_name,
            port,
            id_strategy = ?config.ledger.id_strategy,
            currency = %config.ledger.default_currency,
            "Application built"
        );

        Ok(Self {
            listener,
            port,
            state: AppState {
                config,
                ledger: Arc::new(ledger),
            },
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.state.ledger)
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        self.run_with_graceful_shutdown(std::future::pending()).await
    }

    pub async fn run_with_graceful_shutdown<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.state);

        tracing::info!(port = self.port, "Listening");

        service_core::axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}
