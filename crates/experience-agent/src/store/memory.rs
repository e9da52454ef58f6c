// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory record store.
//!
//! A simple store that keeps rows in process memory. Backs the unit and integration
//! tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::{RecordStore, Result, SelectQuery, SortOrder, StoreError};

/// In-memory store keyed by table name.
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    calls: AtomicUsize,
    /// If set, every operation fails with this message.
    pub fail_with: Option<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            calls: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    /// Create a store whose every operation is rejected with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Number of operations issued against the store so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the rows currently held in `table`.
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn begin(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(StoreError::Rejected {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Textual form used for equality filters, so `"7"` matches both `7` and `"7"`.
fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(x), Some(y)) => filter_text(x).cmp(&filter_text(y)),
        (Some(_), None) => CmpOrdering::Greater,
        (None, Some(_)) => CmpOrdering::Less,
        (None, None) => CmpOrdering::Equal,
    }
}

fn project(row: &Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row.clone();
    }
    let mut projected = Map::new();
    for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        projected.insert(
            column.to_string(),
            row.get(column).cloned().unwrap_or(Value::Null),
        );
    }
    Value::Object(projected)
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        self.begin()?;
        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if let Value::Object(fields) = &mut row
                && !fields.contains_key("id")
            {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                fields.insert("id".to_string(), Value::from(id));
            }
            stored.push(row);
        }
        self.tables
            .lock()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>> {
        self.begin()?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<&Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query.filters.iter().all(|(column, value)| {
                            row.get(column).map(filter_text).as_deref() == Some(value.as_str())
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some((column, order)) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(column), b.get(column));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn count(&self, table: &str) -> Result<Option<u64>> {
        self.begin()?;
        let tables = self.tables.lock().await;
        Ok(Some(tables.get(table).map_or(0, |rows| rows.len() as u64)))
    }
}
