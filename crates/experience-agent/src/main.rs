// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Experience Agent - Concierge Agent Backend
//!
//! Loads configuration, starts seeding the vertical counters from persisted history in
//! the background and serves the HTTP API until Ctrl-C.

use std::sync::Arc;
use tracing::{info, warn};

use experience_agent::config::Config;
use experience_agent::handlers::AppState;
use experience_agent::server::run_http_server;
use experience_agent::stats;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "experience_agent=info,tower_http=info".into()),
        )
        .init();

    if let Err(e) = dotenv {
        warn!("No .env file loaded: {}", e);
    }

    let config = Config::from_env()?;

    info!(
        http_addr = %config.http_addr,
        environment = %config.environment,
        store = config.store.is_some(),
        email = config.email.is_some(),
        api_key_enforced = config.access.enforced(),
        "Starting Experience Agent"
    );

    if config.access.api_key.is_some() && config.access.allow_insecure {
        warn!("BIZFLOW_ALLOW_INSECURE is set; API key check disabled");
    }

    let state = Arc::new(AppState::from_config(&config));
    if let Some(store) = &state.store {
        info!(backend = store.backend(), "Record store configured");
    }

    stats::spawn_seed(
        state.stats.clone(),
        state.store.clone(),
        stats::SEED_TIMEOUT,
    );

    run_http_server(config.http_addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
    })
    .await?;

    info!("Experience Agent shut down");

    Ok(())
}
