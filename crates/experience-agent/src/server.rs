// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP server.
//!
//! Builds the axum router and runs it until shutdown. Everything except the liveness,
//! descriptor, connectivity and per-user lookup routes sits behind the shared-secret
//! gate.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::handlers::{self, SharedState};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests without the configured secret.
///
/// Passes everything through when no secret is set or the insecure override is on.
pub async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.access.api_key.as_deref()
        && !state.access.allow_insecure
    {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            debug!(path = %request.uri().path(), "Rejected request without valid API key");
            return ApiError::Unauthorized.into_response();
        }
    }
    next.run(request).await
}

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    let open = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/agent", get(handlers::agent_info))
        .route("/api/test-db", get(handlers::test_db))
        .route(
            "/api/interactions/{user_id}",
            get(handlers::user_interactions),
        );

    let gated = Router::new()
        .route("/api/interactions", post(handlers::save_interaction))
        .route("/api/onboarding/steps", get(handlers::onboarding_steps))
        .route(
            "/api/onboarding/progress",
            post(handlers::onboarding_progress),
        )
        .route("/api/course-delivery", post(handlers::course_delivery))
        .route("/api/dashboard/summary", get(handlers::dashboard_summary))
        .route(
            "/api/dashboard/verticals",
            get(handlers::dashboard_verticals),
        )
        .route("/api/playbook-run", post(handlers::playbook_run))
        .route("/api/playbook-stats", get(handlers::playbook_stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    open.merge(gated)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on `bind_addr` until `shutdown` resolves.
pub async fn run_http_server(
    bind_addr: SocketAddr,
    state: SharedState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
