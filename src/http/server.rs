//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Bind server to listener
//! - Drain in-flight requests on the lifecycle shutdown signal

use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::handlers::{self, AppState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// HTTP server for the guestbook API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and state.
    pub fn new(config: &ServiceConfig, state: AppState) -> Self {
        Self {
            router: build_router(config, state),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut signal = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = signal.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/messages",
            get(handlers::list_messages).post(handlers::create_message),
        )
        .route("/api/v1/messages/latest", get(handlers::get_latest))
        .route(
            "/api/v1/messages/{id}",
            put(handlers::update_message).delete(handlers::delete_message),
        )
        .route("/api/v1/messages/batch-delete", post(handlers::batch_delete))
        .route("/api/v1/session", get(handlers::get_session))
        .route("/api/v1/reload", post(handlers::reload))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.listener.request_timeout_secs,
        )))
        .layer(propagate_request_id_layer())
        .layer(middleware::from_fn(record_request_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn record_request_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_http_request(&method, response.status().as_u16(), started);
    response
}
