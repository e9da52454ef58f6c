// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Experience Agent - Concierge Agent Backend
//!
//! An HTTP service that sits behind the Bizflow concierge agent. It is responsible for:
//! - Interaction logging to the hosted record store
//! - Per-vertical interaction and delivery counters
//! - Course delivery emails
//! - Onboarding content and progress capture
//! - Playbook run tracking
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Agent UI / Dashboard clients                 │
//! └──────────────────────────────────────────────────────────────┘
//!                               │ HTTP (x-api-key)
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 experience-agent (This Crate)                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐           │
//! │  │ Interaction │  │  Vertical   │  │ Onboarding  │           │
//! │  │   Logger    │──▶   Stats     │  │   Buffer    │           │
//! │  └─────────────┘  └─────────────┘  └─────────────┘           │
//! └──────────────────────────────────────────────────────────────┘
//!           │                                     │
//!           ▼                                     ▼
//! ┌───────────────────────┐           ┌───────────────────────┐
//! │  Supabase REST store  │           │   SendGrid mail API   │
//! └───────────────────────┘           └───────────────────────┘
//! ```
//!
//! # Routes
//!
//! ## Open
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /health` | Liveness |
//! | `GET /api/agent` | Agent descriptor and store wiring |
//! | `GET /api/test-db` | Store connectivity check |
//! | `GET /api/interactions/{user_id}` | Last 50 interactions for a user |
//!
//! ## Gated
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/interactions` | Log an interaction |
//! | `GET /api/onboarding/steps` | Onboarding content |
//! | `POST /api/onboarding/progress` | Record onboarding progress |
//! | `POST /api/course-delivery` | Email course access and log the delivery |
//! | `GET /api/dashboard/summary` | Totals, unique users, recent activity |
//! | `GET /api/dashboard/verticals` | Per-vertical goals and counters |
//! | `POST /api/playbook-run` | Record a playbook run |
//! | `GET /api/playbook-stats` | Top five playbooks by run count |
//!
//! # Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SUPABASE_URL` / `SUPABASE_API_KEY` | unset | Record store |
//! | `SENDGRID_API_KEY` / `SENDGRID_SENDER` | unset | Course emails |
//! | `BIZFLOW_API_KEY` | unset | Shared secret for gated routes |
//! | `BIZFLOW_ALLOW_INSECURE` | `false` | `true` disables the secret check |
//! | `PORT` | `3000` | HTTP port |
//! | `BIZFLOW_ENV` | `development` | Environment name |

#![deny(missing_docs)]

/// Environment configuration.
pub mod config;
/// Course delivery emails.
pub mod email;
/// HTTP error mapping.
pub mod error;
/// Route handlers and shared state.
pub mod handlers;
/// Loosely typed request fields.
pub mod input;
/// Interaction logging.
pub mod interactions;
/// Onboarding content and progress buffer.
pub mod onboarding;
/// Persisted record shapes.
pub mod records;
/// Router and server loop.
pub mod server;
/// Per-vertical counters.
pub mod stats;
/// Record store abstraction and backends.
pub mod store;
/// Vertical catalog and classification.
pub mod vertical;

pub use config::Config;
pub use error::ApiError;
pub use handlers::AppState;
pub use server::{router, run_http_server};
