// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rows written to the record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One agent interaction (`agent_interactions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Who talked to the agent.
    pub user_id: String,
    /// What they said.
    pub user_message: String,
    /// What the agent answered, if anything.
    pub agent_response: Option<String>,
    /// Canonical vertical id.
    pub business_type: String,
    /// Write time.
    pub created_at: DateTime<Utc>,
}

/// One onboarding step submission (`onboarding_progress`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingProgressRecord {
    /// Submitting user.
    pub user_id: String,
    /// Onboarding step id.
    pub step_id: String,
    /// Whether the step is done.
    pub completed: bool,
    /// Free-form client metadata, `{}` when none was sent.
    pub metadata: Value,
    /// Canonical vertical id.
    pub business_type: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// One playbook execution (`playbook_runs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookRun {
    /// Which playbook ran.
    pub playbook_id: String,
    /// Canonical vertical id.
    pub business_type: String,
    /// Run time.
    pub created_at: DateTime<Utc>,
}
