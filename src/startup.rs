//! Application startup and lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use crate::config::DraftConfig;
use crate::error::DraftError;
use crate::services::providers::gemini::{GeminiConfig, GeminiGenerator};
use crate::services::providers::TextGenerator;
use crate::services::store::{CounterStore, RedisCounterStore};
use crate::{build_router, AppState};

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: DraftConfig) -> Result<Self, DraftError> {
        let store: Arc<dyn CounterStore> = Arc::new(
            RedisCounterStore::connect(&config.redis)
                .await
                .map_err(DraftError::Store)?,
        );

        let generator = match &config.upstream.api_key {
            Some(api_key) => {
                tracing::info!(model = %config.upstream.model, "Gemini text generator initialized");
                let gemini: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::new(GeminiConfig {
                    api_key: api_key.clone(),
                    model: config.upstream.model.clone(),
                }));
                Some(gemini)
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set, draft requests will answer 500");
                None
            }
        };

        let state = AppState::new(config.clone(), store, generator);

        // Bind listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            DraftError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("draft-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run until a shutdown signal arrives, then let scheduled counter
    /// writes finish before returning.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let background = self.state.background.clone();
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        background.wait().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
