// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgREST-backed record store.
//!
//! Talks to the hosted store's REST endpoint (`{base_url}/rest/v1/{table}`) with the
//! project API key sent both as `apikey` and as a bearer token.

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{RecordStore, Result, SelectQuery, StoreError};

/// Record store speaking the PostgREST dialect over HTTP.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// Create a store client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// Turn a non-success response into [`StoreError::Rejected`] carrying the store's message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("store returned HTTP {}", status.as_u16()));

    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Parse the total from a `Content-Range` header such as `0-9/120` or `*/120`.
fn parse_content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(|v| v.rsplit_once('/'))
        .and_then(|(_, total)| total.parse().ok())
}

/// Decode a JSON body that may legitimately be empty.
async fn rows_from(response: Response) -> Result<Vec<Value>> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(other) => Ok(vec![other]),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

#[async_trait]
impl RecordStore for RestStore {
    fn backend(&self) -> &'static str {
        "postgrest"
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        let response = check_status(response).await?;
        let stored = rows_from(response).await?;
        debug!(stored = stored.len(), "Rows inserted");
        Ok(stored)
    }

    #[instrument(skip(self), fields(table = %query.table))]
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>> {
        let mut params: Vec<(String, String)> = vec![("select".to_string(), query.columns.clone())];
        for (column, value) in &query.filters {
            params.push((column.clone(), format!("eq.{value}")));
        }
        if let Some((column, order)) = &query.order {
            params.push(("order".to_string(), format!("{column}.{}", order.as_str())));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        let response = self
            .authorized(self.client.get(self.table_url(&query.table)))
            .query(&params)
            .send()
            .await?;
        let response = check_status(response).await?;
        rows_from(response).await
    }

    #[instrument(skip(self))]
    async fn count(&self, table: &str) -> Result<Option<u64>> {
        let response = self
            .authorized(self.client.head(self.table_url(table)))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(parse_content_range_total(response.headers()))
    }
}
