// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Interaction logging.
//!
//! Logging an interaction classifies its vertical, writes one row to the record store
//! and bumps the in-memory counters. The counters are bumped even when the write
//! fails, so after store errors the dashboard may count more interactions than were
//! persisted. Counters are never rolled back.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::records::InteractionRecord;
use crate::stats::VerticalStats;
use crate::store::{INTERACTIONS_TABLE, RecordStore, StoreError};
use crate::vertical;

/// Lower-case marker that flags an interaction as a course delivery.
pub const DELIVERY_MARKER: &str = "course delivery";

/// Input for [`InteractionLogger::log_interaction`].
#[derive(Debug, Clone, Copy)]
pub struct NewInteraction<'a> {
    /// Who talked to the agent.
    pub user_id: &'a str,
    /// What they said.
    pub message: &'a str,
    /// The agent's answer, if any.
    pub response: Option<&'a str>,
    /// Raw vertical label, classified before use.
    pub business_type: Option<&'a Value>,
}

/// Outcome of a logging attempt.
#[derive(Debug)]
pub struct LoggedInteraction {
    /// Rows returned by the store, or the store error.
    pub persisted: Result<Vec<Value>, StoreError>,
    /// Canonical vertical the interaction was counted under.
    pub business_type: &'static str,
}

/// Persists interactions and keeps the vertical counters current.
#[derive(Clone)]
pub struct InteractionLogger {
    store: Option<Arc<dyn RecordStore>>,
    stats: Arc<VerticalStats>,
}

impl InteractionLogger {
    /// Create a logger writing to `store` (if any) and counting into `stats`.
    pub fn new(store: Option<Arc<dyn RecordStore>>, stats: Arc<VerticalStats>) -> Self {
        Self { store, stats }
    }

    /// Record one interaction.
    ///
    /// Store failures are returned in [`LoggedInteraction::persisted`], never raised.
    #[instrument(skip(self, interaction), fields(user_id = %interaction.user_id))]
    pub async fn log_interaction(&self, interaction: NewInteraction<'_>) -> LoggedInteraction {
        let business_type = vertical::normalize_value(interaction.business_type);
        let record = InteractionRecord {
            user_id: interaction.user_id.to_string(),
            user_message: interaction.message.to_string(),
            agent_response: interaction
                .response
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            business_type: business_type.to_string(),
            created_at: Utc::now(),
        };

        let persisted = match &self.store {
            Some(store) => match serde_json::to_value(&record) {
                Ok(row) => store.insert(INTERACTIONS_TABLE, vec![row]).await,
                Err(e) => Err(StoreError::Decode(e.to_string())),
            },
            None => Err(StoreError::NotConfigured),
        };

        if let Err(e) = &persisted {
            warn!(error = %e, business_type, "Interaction not persisted");
        }

        let is_delivery = interaction.message.to_lowercase().contains(DELIVERY_MARKER);
        self.stats.record_interaction(business_type, is_delivery);
        debug!(business_type, is_delivery, "Interaction counted");

        LoggedInteraction {
            persisted,
            business_type,
        }
    }
}
