// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Record store interface and backends.
//!
//! The hosted relational store is an opaque collaborator: the service only ever
//! inserts rows, selects with equality filters, ordering and a limit, and counts rows.
//! [`RecordStore`] captures exactly that surface.

pub mod memory;
pub mod rest;

pub use self::memory::MemoryStore;
pub use self::rest::RestStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Table holding one row per agent interaction.
pub const INTERACTIONS_TABLE: &str = "agent_interactions";
/// Table holding onboarding progress submissions.
pub const ONBOARDING_PROGRESS_TABLE: &str = "onboarding_progress";
/// Table holding playbook run events.
pub const PLAYBOOK_RUNS_TABLE: &str = "playbook_runs";
/// Table read by the connectivity check.
pub const CONNECTIVITY_TABLE: &str = "test_table";

/// Errors from record store operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No store credentials were configured.
    #[error("record store is not configured")]
    NotConfigured,

    /// The store answered with an error.
    #[error("{message}")]
    Rejected {
        /// HTTP status returned by the store.
        status: u16,
        /// The store's own error message.
        message: String,
    },

    /// The request never produced a response.
    #[error("store request failed: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("invalid store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Sort direction for ordered selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest/smallest first.
    Asc,
    /// Newest/largest first.
    #[default]
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A single-table select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Table to read from.
    pub table: String,
    /// Comma-separated column list, `*` for all columns.
    pub columns: String,
    /// Equality filters as `(column, value)` pairs.
    pub filters: Vec<(String, String)>,
    /// Optional ordering column and direction.
    pub order: Option<(String, SortOrder)>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

impl SelectQuery {
    /// Select all columns from `table`.
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the returned columns.
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Keep only rows whose `column` equals `value`.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    /// Order rows by `column`.
    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Generic query client for the hosted relational store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Insert rows into `table`, returning the rows as stored.
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Run a select and return the matching rows.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>>;

    /// Exact row count of `table`, `None` when the store did not report one.
    async fn count(&self, table: &str) -> Result<Option<u64>>;
}
