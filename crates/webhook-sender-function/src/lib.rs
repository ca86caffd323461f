//! # Webhook Sender Function
//!
//! Request-handler entry point. Every invocation creates, signs and sends one
//! webhook and answers with a gateway-style response describing the outcome.
//!
//! The handler is hosted over HTTP:
//! - `POST /invoke` accepts a [`GatewayRequest`] JSON event (an empty body is
//!   an empty event) and returns the [`GatewayResponse`]
//! - `GET /health` reports liveness

pub mod handler;

pub use handler::{handle, GatewayRequest, GatewayResponse};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::Serialize;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};
use webhook_sender_core::{
    CancellationToken, ConfigError, DispatchError, PayloadTemplate, SenderConfig, WebhookDispatcher,
};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Dispatcher shared by all invocations
    pub dispatcher: Arc<WebhookDispatcher>,

    /// Constant payload fields
    pub template: Arc<PayloadTemplate>,
}

impl AppState {
    pub fn new(dispatcher: WebhookDispatcher, template: PayloadTemplate) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            template: Arc::new(template),
        }
    }

    /// Build state from validated configuration.
    pub fn from_config(config: &SenderConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let dispatcher = WebhookDispatcher::from_config(config)?;
        Ok(Self::new(dispatcher, config.payload.clone()))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failures that stop the host from serving
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Failed to create dispatcher: {0}")]
    Dispatcher(#[from] DispatchError),

    #[error("Failed to bind to {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },
}

// ============================================================================
// Router
// ============================================================================

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/invoke", post(handle_invoke))
        .route("/health", get(handle_health_check))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[instrument(skip(state, body))]
async fn handle_invoke(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.is_empty() {
        GatewayRequest::default()
    } else {
        match serde_json::from_slice::<GatewayRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejected malformed invocation event");
                let response = GatewayResponse {
                    status_code: 400,
                    headers: Default::default(),
                    body: format!("Invalid invocation event: {}", e),
                };
                return (StatusCode::BAD_REQUEST, Json(response)).into_response();
            }
        }
    };

    let response = handle(&request, &state.dispatcher, &state.template).await;
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, Json(response)).into_response()
}

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

// ============================================================================
// Server
// ============================================================================

/// Start the HTTP server and run until SIGINT or SIGTERM.
pub async fn start_server(config: &SenderConfig) -> Result<(), ServerError> {
    let state = AppState::from_config(config)?;
    let address = format!("{}:{}", config.server.host, config.server.port);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServerError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, endpoint = %state.dispatcher.endpoint(), "Starting HTTP server");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    serve(listener, create_router(state), shutdown_signal(), shutdown_timeout).await
}

/// Serve `router` until `shutdown` resolves, then give in-flight invocations
/// up to `shutdown_timeout` to finish.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    router: Router,
    shutdown: F,
    shutdown_timeout: Duration,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let stop = CancellationToken::new();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(stop.clone().cancelled_owned())
        .into_future();
    tokio::pin!(server);

    let server_failed = |e: std::io::Error| ServerError::ServerFailed {
        message: e.to_string(),
    };

    tokio::select! {
        result = &mut server => return result.map_err(server_failed),
        _ = shutdown => {
            info!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Initiating graceful shutdown"
            );
            stop.cancel();
        }
    }

    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(result) => result.map_err(server_failed)?,
        Err(_) => warn!("Graceful shutdown timed out; dropping in-flight invocations"),
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
