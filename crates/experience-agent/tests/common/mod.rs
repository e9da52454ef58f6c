// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for experience-agent route tests.
//!
//! Provides TestContext for building handler state over an in-memory store and a
//! recording mailer, plus helpers for driving the router in-process.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use experience_agent::config::AccessConfig;
use experience_agent::email::{EmailError, EmailMessage, EmailNotifier, Mailer};
use experience_agent::handlers::AppState;
use experience_agent::router;
use experience_agent::store::{MemoryStore, RecordStore, Result as StoreResult, SelectQuery};

pub const SECRET: &str = "test-secret";
pub const SENDER: &str = "academy@example.com";

/// Mailer that records every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            Err(EmailError::Rejected {
                status: 401,
                body: "invalid api key".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Store that accepts requests and never answers.
pub struct StalledStore;

#[async_trait]
impl RecordStore for StalledStore {
    fn backend(&self) -> &'static str {
        "stalled"
    }

    async fn insert(&self, _table: &str, _rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        std::future::pending().await
    }

    async fn select(&self, _query: &SelectQuery) -> StoreResult<Vec<Value>> {
        std::future::pending().await
    }

    async fn count(&self, _table: &str) -> StoreResult<Option<u64>> {
        std::future::pending().await
    }
}

/// Test context holding handler state and handles on its collaborators.
pub struct TestContext {
    pub state: Arc<AppState>,
    pub store: Option<Arc<MemoryStore>>,
    pub mailer: Option<Arc<RecordingMailer>>,
}

/// Builder for [`TestContext`].
pub struct TestContextBuilder {
    access: AccessConfig,
    store: Option<Arc<MemoryStore>>,
    mailer: Option<Arc<RecordingMailer>>,
}

impl TestContextBuilder {
    /// Require the shared secret on gated routes.
    pub fn with_secret(mut self) -> Self {
        self.access.api_key = Some(SECRET.to_string());
        self
    }

    /// Set the insecure override.
    pub fn allow_insecure(mut self) -> Self {
        self.access.allow_insecure = true;
        self
    }

    /// Back the state with an empty in-memory store.
    pub fn with_store(self) -> Self {
        self.with_custom_store(MemoryStore::new())
    }

    /// Back the state with a store whose every operation fails.
    pub fn with_failing_store(self, message: &str) -> Self {
        self.with_custom_store(MemoryStore::failing(message))
    }

    fn with_custom_store(mut self, store: MemoryStore) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Configure a mailer.
    pub fn with_mailer(mut self, mailer: RecordingMailer) -> Self {
        self.mailer = Some(Arc::new(mailer));
        self
    }

    pub fn build(self) -> TestContext {
        let store = self.store.clone().map(|s| s as Arc<dyn RecordStore>);
        let notifier = match &self.mailer {
            Some(mailer) => EmailNotifier::new(mailer.clone(), SENDER),
            None => EmailNotifier::disabled(),
        };
        TestContext {
            state: Arc::new(AppState::new(self.access, store, notifier)),
            store: self.store,
            mailer: self.mailer,
        }
    }
}

impl TestContext {
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder {
            access: AccessConfig::default(),
            store: None,
            mailer: None,
        }
    }

    /// Open gate, no store, no mailer.
    pub fn unconfigured() -> Self {
        Self::builder().build()
    }

    /// Open gate with a store that never answers.
    pub fn with_stalled_store() -> Self {
        let store: Arc<dyn RecordStore> = Arc::new(StalledStore);
        TestContext {
            state: Arc::new(AppState::new(
                AccessConfig::default(),
                Some(store),
                EmailNotifier::disabled(),
            )),
            store: None,
            mailer: None,
        }
    }

    /// Open gate with an empty in-memory store.
    pub fn with_store() -> Self {
        Self::builder().with_store().build()
    }

    pub fn store(&self) -> &MemoryStore {
        self.store.as_deref().expect("context has no store")
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}
