//! Web front end: upload form, JSON API and downloads.
//!
//! ```text
//! GET  /                    upload form
//! POST /                    convert, answer with the form + download link
//! POST /api/convert         convert, answer with a JSON BatchReport
//! GET  /download/{filename} stream an artifact from the output directory
//! GET  /health              liveness
//! ```

pub mod error;
pub mod handlers;
pub mod page;

use crate::config::ConversionConfig;
use crate::error::Doc2PdfError;
use crate::pipeline::dispatch::Dispatcher;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use minijinja::Environment;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::ApiError;
pub use handlers::BatchReport;

/// Listener settings for [`serve`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `127.0.0.1:5000`.
    pub bind: String,
    /// Largest accepted request body, all files together. Default: 50 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Shared state of every request handler.
pub struct AppState {
    pub config: ConversionConfig,
    pub dispatcher: Dispatcher,
    templates: Environment<'static>,
}

impl AppState {
    /// State with the tool-backed converters from `config`.
    pub fn new(config: ConversionConfig) -> Result<Self, Doc2PdfError> {
        let dispatcher = Dispatcher::from_config(&config);
        Self::with_dispatcher(config, dispatcher)
    }

    /// State with an explicit dispatcher.
    pub fn with_dispatcher(
        config: ConversionConfig,
        dispatcher: Dispatcher,
    ) -> Result<Self, Doc2PdfError> {
        let templates = page::templates()
            .map_err(|e| Doc2PdfError::Internal(format!("Invalid page template: {e}")))?;
        Ok(Self {
            config,
            dispatcher,
            templates,
        })
    }

    pub fn templates(&self) -> &Environment<'static> {
        &self.templates
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::upload))
        .route("/api/convert", axum::routing::post(handlers::api_convert))
        .route("/download/{filename}", get(handlers::download))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `server.bind` and serve until Ctrl+C or SIGTERM.
pub async fn serve(server: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&server.bind).await?;
    info!(
        addr = %listener.local_addr()?,
        max_upload_mb = server.max_upload_bytes / 1024 / 1024,
        output_dir = %state.config.output_dir.display(),
        "Server ready and accepting connections"
    );

    let app = router(Arc::new(state), server.max_upload_bytes);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or, on Unix, SIGTERM.
///
/// If a handler cannot be installed, that signal is ignored and the other one
/// still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight requests");
}
