// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-vertical interaction and delivery counters.
//!
//! Counters live in process memory for the lifetime of the server. The interaction
//! counts are rebuilt at startup from a sample of persisted rows; delivery counts
//! start at zero on every restart.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::store::{INTERACTIONS_TABLE, RecordStore, SelectQuery, StoreError};
use crate::vertical::{self, BUSINESS_TYPES};

/// Maximum number of historical rows read when seeding.
pub const SEED_SAMPLE_LIMIT: usize = 500;

/// Upper bound on the background seed.
pub const SEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Counters for one vertical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerticalCounters {
    /// Interactions logged for the vertical.
    pub interactions: u64,
    /// Interactions that were course deliveries.
    pub deliveries: u64,
}

/// Result of the startup seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// No record store configured; counters stay at zero.
    Skipped,
    /// Historical rows were read and counted.
    Seeded {
        /// Number of rows folded into the counters.
        rows: usize,
    },
}

/// Canonical vertical id → counters.
#[derive(Debug)]
pub struct VerticalStats {
    counters: DashMap<String, VerticalCounters>,
}

impl Default for VerticalStats {
    fn default() -> Self {
        Self::new()
    }
}

impl VerticalStats {
    /// Create stats with zeroed counters for every catalog vertical.
    pub fn new() -> Self {
        let counters = DashMap::new();
        for t in BUSINESS_TYPES {
            counters.insert(t.id.to_string(), VerticalCounters::default());
        }
        Self { counters }
    }

    /// Rebuild interaction counts from persisted rows.
    ///
    /// Reads at most [`SEED_SAMPLE_LIMIT`] rows. Errors are returned for the caller to
    /// log; the counters are left as they were.
    #[instrument(skip(self, store))]
    pub async fn seed(&self, store: Option<&dyn RecordStore>) -> Result<SeedOutcome, StoreError> {
        let Some(store) = store else {
            return Ok(SeedOutcome::Skipped);
        };

        let rows = store
            .select(
                &SelectQuery::from(INTERACTIONS_TABLE)
                    .columns("business_type")
                    .limit(SEED_SAMPLE_LIMIT),
            )
            .await?;

        for row in &rows {
            let id = vertical::normalize_value(row.get("business_type"));
            self.counters
                .entry(id.to_string())
                .or_default()
                .interactions += 1;
        }

        debug!(rows = rows.len(), "Vertical stats seeded");
        Ok(SeedOutcome::Seeded { rows: rows.len() })
    }

    /// Count one interaction for `id`, and one delivery when `is_delivery`.
    pub fn record_interaction(&self, id: &str, is_delivery: bool) {
        let mut entry = self.counters.entry(id.to_string()).or_default();
        entry.interactions += 1;
        if is_delivery {
            entry.deliveries += 1;
        }
    }

    /// Current counters for `id`, zero when the id has never been seen.
    pub fn get(&self, id: &str) -> VerticalCounters {
        self.counters
            .get(id)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Copy of every counter, including ids outside the catalog.
    pub fn snapshot(&self) -> BTreeMap<String, VerticalCounters> {
        self.counters
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

/// Seed `stats` from `store` on a background task and log the outcome.
///
/// The task gives up after `timeout`; counters keep whatever they held.
pub fn spawn_seed(
    stats: Arc<VerticalStats>,
    store: Option<Arc<dyn RecordStore>>,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, stats.seed(store.as_deref())).await {
            Ok(Ok(SeedOutcome::Seeded { rows })) => info!(rows, "Vertical stats seeded"),
            Ok(Ok(SeedOutcome::Skipped)) => {
                info!("No record store configured; vertical stats start empty")
            }
            Ok(Err(e)) => warn!(error = %e, "Unable to seed vertical stats"),
            Err(_) => warn!(
                timeout_secs = timeout.as_secs(),
                "Vertical stats seed timed out"
            ),
        }
    })
}
