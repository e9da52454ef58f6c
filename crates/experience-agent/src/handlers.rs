// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP route handlers.
//!
//! Handlers validate presence of required fields, call into the logger, notifier,
//! onboarding content or record store, and shape the JSON response. Collaborator
//! errors are returned as `500 {"error": ...}` with the collaborator's message.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::config::{AccessConfig, Config, StoreConfig};
use crate::email::{CourseEmail, EmailNotifier};
use crate::error::{ApiError, Result};
use crate::input;
use crate::interactions::{InteractionLogger, NewInteraction};
use crate::onboarding::{self, OnboardingStep, ProgressBuffer};
use crate::records::{OnboardingProgressRecord, PlaybookRun};
use crate::stats::VerticalStats;
use crate::store::{
    CONNECTIVITY_TABLE, INTERACTIONS_TABLE, ONBOARDING_PROGRESS_TABLE, PLAYBOOK_RUNS_TABLE,
    RecordStore, RestStore, SelectQuery, SortOrder, StoreError,
};
use crate::vertical::{self, BUSINESS_TYPES};

/// Rows shown in the dashboard's recent activity list.
pub const RECENT_INTERACTIONS_LIMIT: usize = 10;
/// Rows returned by the per-user interaction lookup.
pub const USER_INTERACTIONS_LIMIT: usize = 50;
/// Playbook runs read to build the leaderboard.
pub const PLAYBOOK_SAMPLE_LIMIT: usize = 1000;
/// Entries in the playbook leaderboard.
pub const PLAYBOOK_TOP_N: usize = 5;

/// Shared state for route handlers.
///
/// Built once per process and shared behind an `Arc`.
pub struct AppState {
    /// Access control for gated routes.
    pub access: AccessConfig,
    /// Record store, `None` when unconfigured.
    pub store: Option<Arc<dyn RecordStore>>,
    /// Per-vertical counters.
    pub stats: Arc<VerticalStats>,
    /// Interaction logger sharing `store` and `stats`.
    pub logger: InteractionLogger,
    /// Course email notifier.
    pub notifier: EmailNotifier,
    /// Development cache of onboarding progress.
    pub progress: ProgressBuffer,
}

impl AppState {
    /// Create handler state from explicit collaborators.
    pub fn new(
        access: AccessConfig,
        store: Option<Arc<dyn RecordStore>>,
        notifier: EmailNotifier,
    ) -> Self {
        let stats = Arc::new(VerticalStats::new());
        Self {
            access,
            logger: InteractionLogger::new(store.clone(), stats.clone()),
            store,
            stats,
            notifier,
            progress: ProgressBuffer::new(),
        }
    }

    /// Create handler state with the production collaborators described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let store = config.store.as_ref().map(|StoreConfig { url, api_key }| {
            Arc::new(RestStore::new(url, api_key)) as Arc<dyn RecordStore>
        });
        let notifier = EmailNotifier::from_config(config.email.as_ref());
        Self::new(config.access.clone(), store, notifier)
    }

    /// Whether a record store is configured.
    pub fn store_configured(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> std::result::Result<&dyn RecordStore, StoreError> {
        self.store.as_deref().ok_or(StoreError::NotConfigured)
    }
}

/// Shared state handle used by the router.
pub type SharedState = Arc<AppState>;

/// Unwrap a JSON body, reporting malformed input as a validation error.
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

/// Text of a truthy field.
fn present(value: &Option<Value>) -> Option<String> {
    input::present(value.as_ref())
}

// ============================================================================
// Health & Agent Info
// ============================================================================

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: &'static str,
    /// Human-readable status.
    pub message: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Experience Agent is running",
    })
}

/// Static agent descriptor.
#[derive(Debug, Serialize)]
pub struct AgentInfo {
    /// Agent name.
    pub name: &'static str,
    /// Agent version.
    pub version: &'static str,
    /// Agent status.
    pub status: &'static str,
    /// Record store wiring.
    pub database: &'static str,
}

/// `GET /api/agent`
pub async fn agent_info(State(state): State<SharedState>) -> Json<AgentInfo> {
    Json(AgentInfo {
        name: "Experience Agent",
        version: "1.0.0",
        status: "active",
        database: if state.store_configured() {
            "Supabase connected"
        } else {
            "Supabase not configured"
        },
    })
}

/// Connectivity check response.
#[derive(Debug, Serialize)]
pub struct TestDbResponse {
    /// Whether the check query succeeded.
    pub connected: bool,
    /// Success message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    /// Failure message from the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /api/test-db`
#[instrument(skip(state))]
pub async fn test_db(State(state): State<SharedState>) -> (StatusCode, Json<TestDbResponse>) {
    let check = match state.store() {
        Ok(store) => {
            store
                .select(&SelectQuery::from(CONNECTIVITY_TABLE).limit(1))
                .await
        }
        Err(e) => Err(e),
    };

    match check {
        Ok(_) => (
            StatusCode::OK,
            Json(TestDbResponse {
                connected: true,
                message: Some("Supabase connection successful"),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Store connectivity check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TestDbResponse {
                    connected: false,
                    message: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

// ============================================================================
// Interactions
// ============================================================================

/// Body of `POST /api/interactions`.
#[derive(Debug, Default, Deserialize)]
pub struct SaveInteractionRequest {
    /// Who talked to the agent.
    pub user_id: Option<Value>,
    /// What they said.
    pub message: Option<Value>,
    /// The agent's answer.
    pub response: Option<Value>,
    /// Raw vertical label.
    pub business_type: Option<Value>,
}

/// Successful interaction save.
#[derive(Debug, Serialize)]
pub struct SaveInteractionResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable status.
    pub message: &'static str,
    /// Rows as stored.
    pub data: Vec<Value>,
    /// Canonical vertical the interaction was counted under.
    pub business_type: &'static str,
}

/// `POST /api/interactions`
#[instrument(skip(state, payload))]
pub async fn save_interaction(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<SaveInteractionRequest>, JsonRejection>,
) -> Result<Json<SaveInteractionResponse>> {
    let request = json_body(payload)?;
    let (Some(user_id), Some(message)) = (present(&request.user_id), present(&request.message))
    else {
        return Err(ApiError::Validation(
            "user_id and message required".to_string(),
        ));
    };

    let response = present(&request.response);
    let logged = state
        .logger
        .log_interaction(NewInteraction {
            user_id: &user_id,
            message: &message,
            response: response.as_deref(),
            business_type: request.business_type.as_ref(),
        })
        .await;

    Ok(Json(SaveInteractionResponse {
        success: true,
        message: "Interaction saved",
        data: logged.persisted?,
        business_type: logged.business_type,
    }))
}

/// Interaction history for one user.
#[derive(Debug, Serialize)]
pub struct UserInteractionsResponse {
    /// Always `true`.
    pub success: bool,
    /// Number of rows returned.
    pub count: usize,
    /// Rows, newest first.
    pub interactions: Vec<Value>,
}

/// `GET /api/interactions/{user_id}`
#[instrument(skip(state))]
pub async fn user_interactions(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserInteractionsResponse>> {
    let interactions = state
        .store()?
        .select(
            &SelectQuery::from(INTERACTIONS_TABLE)
                .eq("user_id", &user_id)
                .order("created_at", SortOrder::Desc)
                .limit(USER_INTERACTIONS_LIMIT),
        )
        .await?;

    Ok(Json(UserInteractionsResponse {
        success: true,
        count: interactions.len(),
        interactions,
    }))
}

// ============================================================================
// Onboarding
// ============================================================================

/// Onboarding steps response.
#[derive(Debug, Serialize)]
pub struct OnboardingStepsResponse {
    /// `connected` or `unconfigured`.
    pub status: &'static str,
    /// Steps in recommended order.
    pub steps: &'static [OnboardingStep],
    /// Hint for the client.
    pub summary: &'static str,
}

/// `GET /api/onboarding/steps`
pub async fn onboarding_steps(State(state): State<SharedState>) -> Json<OnboardingStepsResponse> {
    let (status, summary) = if state.store_configured() {
        (
            "connected",
            "Supabase is wired—output the steps directly to your UI.",
        )
    } else {
        (
            "unconfigured",
            "Supabase credentials missing. Steps are safe to display offline.",
        )
    };
    Json(OnboardingStepsResponse {
        status,
        steps: onboarding::list_steps(),
        summary,
    })
}

/// Body of `POST /api/onboarding/progress`.
#[derive(Debug, Default, Deserialize)]
pub struct OnboardingProgressRequest {
    /// Submitting user.
    pub user_id: Option<Value>,
    /// Step being reported.
    pub step_id: Option<Value>,
    /// Whether the step is done, by truthiness.
    pub completed: Option<Value>,
    /// Free-form metadata.
    pub metadata: Option<Value>,
    /// Raw vertical label.
    pub business_type: Option<Value>,
}

/// Onboarding progress response.
#[derive(Debug, Serialize)]
pub struct OnboardingProgressResponse {
    /// Always `true`.
    pub success: bool,
    /// Whether the record reached the store.
    pub stored: bool,
    /// Human-readable status.
    pub message: &'static str,
    /// The stored rows, or the buffered record when the store is unconfigured.
    pub record: Value,
}

/// `POST /api/onboarding/progress`
///
/// Every accepted submission is appended to the progress buffer. Without a store the
/// route answers `202` with `stored: false`.
#[instrument(skip(state, payload))]
pub async fn onboarding_progress(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<OnboardingProgressRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OnboardingProgressResponse>)> {
    let request = json_body(payload)?;
    let (Some(user_id), Some(step_id)) = (present(&request.user_id), present(&request.step_id))
    else {
        return Err(ApiError::Validation(
            "user_id and step_id are required".to_string(),
        ));
    };

    let record = OnboardingProgressRecord {
        user_id,
        step_id: step_id.clone(),
        completed: request.completed.as_ref().is_some_and(input::is_truthy),
        metadata: match request.metadata {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(metadata) => metadata,
        },
        business_type: vertical::normalize_value(request.business_type.as_ref()).to_string(),
        created_at: Utc::now(),
    };
    let row = serde_json::to_value(&record).map_err(|e| StoreError::Decode(e.to_string()))?;
    state.progress.push(record);

    let Some(store) = state.store.as_deref() else {
        info!(step_id = %step_id, "Onboarding progress buffered in memory");
        return Ok((
            StatusCode::ACCEPTED,
            Json(OnboardingProgressResponse {
                success: true,
                stored: false,
                message: "Supabase credentials missing; onboarding progress cached in memory for development.",
                record: row,
            }),
        ));
    };

    let stored = store
        .insert(ONBOARDING_PROGRESS_TABLE, vec![row])
        .await
        .inspect_err(|e| error!(error = %e, "Failed to save onboarding progress"))?;

    Ok((
        StatusCode::OK,
        Json(OnboardingProgressResponse {
            success: true,
            stored: true,
            message: "Progress saved",
            record: Value::Array(stored),
        }),
    ))
}

// ============================================================================
// Course Delivery
// ============================================================================

/// Body of `POST /api/course-delivery`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDeliveryRequest {
    /// Student address.
    pub email: Option<Value>,
    /// Course being delivered.
    pub course_title: Option<Value>,
    /// Optional note for the student.
    pub note: Option<Value>,
}

/// Course delivery response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDeliveryResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable status.
    pub message: &'static str,
    /// Whether the access email was handed to the provider.
    pub email_sent: bool,
    /// Interaction rows as stored.
    pub data: Vec<Value>,
}

/// `POST /api/course-delivery`
///
/// Sends the access email (when configured), then logs the delivery as a `courses`
/// interaction. Only the logging outcome decides the status code.
#[instrument(skip(state, payload))]
pub async fn course_delivery(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<CourseDeliveryRequest>, JsonRejection>,
) -> Result<Json<CourseDeliveryResponse>> {
    let request = json_body(payload)?;
    let (Some(email), Some(course_title)) =
        (present(&request.email), present(&request.course_title))
    else {
        return Err(ApiError::Validation(
            "email and courseTitle are required".to_string(),
        ));
    };
    let note = present(&request.note);
    let note = note.as_deref();

    let email_sent = state
        .notifier
        .send_course_email(CourseEmail {
            to: &email,
            course_title: &course_title,
            note,
        })
        .await;

    let message = format!("Course delivery: {course_title}");
    let courses = Value::from("courses");
    let logged = state
        .logger
        .log_interaction(NewInteraction {
            user_id: &email,
            message: &message,
            response: Some(note.unwrap_or("Access link delivered via SendGrid")),
            business_type: Some(&courses),
        })
        .await;

    Ok(Json(CourseDeliveryResponse {
        success: true,
        message: if email_sent {
            "Course delivery logged and email sent"
        } else {
            "Logged course delivery (email not configured)"
        },
        email_sent,
        data: logged.persisted?,
    }))
}

// ============================================================================
// Dashboard
// ============================================================================

/// Counters for one vertical in the dashboard summary.
#[derive(Debug, Serialize)]
pub struct VerticalBreakdown {
    /// Canonical id.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Interactions counted.
    pub interactions: u64,
    /// Deliveries counted.
    pub deliveries: u64,
}

/// Aggregate dashboard metrics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Failure message, only on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Exact interaction count.
    pub total_interactions: u64,
    /// Distinct users among the recent interactions.
    pub unique_users: usize,
    /// Most recent interactions, newest first.
    pub recent_interactions: Vec<Value>,
    /// `connected`, `unconfigured` or `error`.
    pub status: &'static str,
    /// Human-readable note.
    pub note: &'static str,
    /// Per-vertical counters, only when live metrics were read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_breakdown: Option<Vec<VerticalBreakdown>>,
}

impl DashboardSummary {
    /// Zeroed summary used when no live metrics are available.
    fn baseline(store_configured: bool) -> Self {
        Self {
            error: None,
            total_interactions: 0,
            unique_users: 0,
            recent_interactions: Vec::new(),
            status: if store_configured {
                "connected"
            } else {
                "unconfigured"
            },
            note: if store_configured {
                "Live metrics from agent_interactions table"
            } else {
                "Supabase credentials missing"
            },
            vertical_breakdown: None,
        }
    }
}

async fn live_summary(store: &dyn RecordStore, stats: &VerticalStats) -> Result<DashboardSummary> {
    let recent = store
        .select(
            &SelectQuery::from(INTERACTIONS_TABLE)
                .columns("id, user_id, user_message, agent_response, created_at")
                .order("created_at", SortOrder::Desc)
                .limit(RECENT_INTERACTIONS_LIMIT),
        )
        .await?;
    let count = store.count(INTERACTIONS_TABLE).await?;

    let unique_users = recent
        .iter()
        .map(|row| {
            row.get("user_id")
                .cloned()
                .unwrap_or(Value::Null)
                .to_string()
        })
        .collect::<HashSet<_>>()
        .len();
    let vertical_breakdown = BUSINESS_TYPES
        .iter()
        .map(|t| {
            let counters = stats.get(t.id);
            VerticalBreakdown {
                id: t.id,
                label: t.label,
                interactions: counters.interactions,
                deliveries: counters.deliveries,
            }
        })
        .collect();

    Ok(DashboardSummary {
        error: None,
        total_interactions: count.unwrap_or(recent.len() as u64),
        unique_users,
        recent_interactions: recent,
        status: "connected",
        note: "Live metrics from agent_interactions table.",
        vertical_breakdown: Some(vertical_breakdown),
    })
}

/// `GET /api/dashboard/summary`
#[instrument(skip(state))]
pub async fn dashboard_summary(
    State(state): State<SharedState>,
) -> (StatusCode, Json<DashboardSummary>) {
    let Some(store) = state.store.as_deref() else {
        return (StatusCode::OK, Json(DashboardSummary::baseline(false)));
    };

    match live_summary(store, &state.stats).await {
        Ok(summary) => (StatusCode::OK, Json(summary)),
        Err(e) => {
            error!(error = %e, "Dashboard summary error");
            let summary = DashboardSummary {
                error: Some(e.to_string()),
                status: "error",
                ..DashboardSummary::baseline(true)
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(summary))
        }
    }
}

/// Goal and counters for one vertical.
#[derive(Debug, Serialize)]
pub struct VerticalProgress {
    /// Canonical id.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Interaction goal.
    pub goal: u32,
    /// Interactions counted.
    pub interactions: u64,
    /// Deliveries counted.
    pub deliveries: u64,
}

/// Verticals dashboard response.
#[derive(Debug, Serialize)]
pub struct VerticalsResponse {
    /// One entry per catalog vertical, in catalog order.
    pub types: Vec<VerticalProgress>,
}

/// `GET /api/dashboard/verticals`
pub async fn dashboard_verticals(State(state): State<SharedState>) -> Json<VerticalsResponse> {
    let types = BUSINESS_TYPES
        .iter()
        .map(|t| {
            let counters = state.stats.get(t.id);
            VerticalProgress {
                id: t.id,
                label: t.label,
                goal: t.goal,
                interactions: counters.interactions,
                deliveries: counters.deliveries,
            }
        })
        .collect();
    Json(VerticalsResponse { types })
}

// ============================================================================
// Playbooks
// ============================================================================

/// Body of `POST /api/playbook-run`.
#[derive(Debug, Default, Deserialize)]
pub struct PlaybookRunRequest {
    /// Which playbook ran.
    #[serde(rename = "playbookId")]
    pub playbook_id: Option<Value>,
    /// Raw vertical label.
    pub business_type: Option<Value>,
}

/// Playbook run response.
#[derive(Debug, Serialize)]
pub struct PlaybookRunResponse {
    /// Always `true`.
    pub success: bool,
    /// Rows as stored.
    pub data: Vec<Value>,
}

/// `POST /api/playbook-run`
#[instrument(skip(state, payload))]
pub async fn playbook_run(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<PlaybookRunRequest>, JsonRejection>,
) -> Result<Json<PlaybookRunResponse>> {
    let request = json_body(payload)?;
    let Some(playbook_id) = present(&request.playbook_id) else {
        return Err(ApiError::Validation("playbookId required".to_string()));
    };

    let run = PlaybookRun {
        playbook_id,
        business_type: vertical::normalize_value(request.business_type.as_ref()).to_string(),
        created_at: Utc::now(),
    };
    let row = serde_json::to_value(&run).map_err(|e| StoreError::Decode(e.to_string()))?;
    let data = state
        .store()?
        .insert(PLAYBOOK_RUNS_TABLE, vec![row])
        .await?;

    Ok(Json(PlaybookRunResponse {
        success: true,
        data,
    }))
}

/// Run count for one playbook.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PlaybookCount {
    /// Playbook id.
    pub playbook_id: String,
    /// Number of recorded runs.
    pub count: u64,
}

/// Playbook leaderboard response.
#[derive(Debug, Serialize)]
pub struct PlaybookStatsResponse {
    /// Most-run playbooks, highest count first.
    pub stats: Vec<PlaybookCount>,
}

/// Count runs per playbook and keep the `top_n` most frequent (ties by id).
pub fn top_playbooks(rows: &[Value], top_n: usize) -> Vec<PlaybookCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for id in rows
        .iter()
        .filter_map(|row| row.get("playbook_id").and_then(Value::as_str))
    {
        *counts.entry(id.to_string()).or_default() += 1;
    }

    let mut ranked: Vec<PlaybookCount> = counts
        .into_iter()
        .map(|(playbook_id, count)| PlaybookCount { playbook_id, count })
        .collect();
    // Stable sort keeps the BTreeMap's id order among equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(top_n);
    ranked
}

/// `GET /api/playbook-stats`
#[instrument(skip(state))]
pub async fn playbook_stats(
    State(state): State<SharedState>,
) -> Result<Json<PlaybookStatsResponse>> {
    let rows = state
        .store()?
        .select(
            &SelectQuery::from(PLAYBOOK_RUNS_TABLE)
                .columns("playbook_id")
                .limit(PLAYBOOK_SAMPLE_LIMIT),
        )
        .await?;

    Ok(Json(PlaybookStatsResponse {
        stats: top_playbooks(&rows, PLAYBOOK_TOP_N),
    }))
}
