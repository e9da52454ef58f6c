// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Dashboard and vertical counter tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestContext;
use experience_agent::stats::SeedOutcome;
use experience_agent::store::{INTERACTIONS_TABLE, RecordStore};

#[tokio::test]
async fn test_summary_unconfigured() {
    let (status, body) = TestContext::unconfigured()
        .get("/api/dashboard/summary")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "totalInteractions": 0,
            "uniqueUsers": 0,
            "recentInteractions": [],
            "status": "unconfigured",
            "note": "Supabase credentials missing"
        })
    );
}

#[tokio::test]
async fn test_summary_connected() {
    let ctx = TestContext::with_store();
    let rows = (0..12)
        .map(|i| {
            json!({
                "user_id": format!("u{}", i % 3),
                "user_message": format!("message {i}"),
                "agent_response": null,
                "business_type": "cleaning",
                "created_at": format!("2025-01-{:02}T00:00:00Z", i + 1),
            })
        })
        .collect();
    ctx.store().insert(INTERACTIONS_TABLE, rows).await.unwrap();

    for message in ["hello", "Course delivery: Gold Basics"] {
        let (status, _) = ctx
            .post(
                "/api/interactions",
                json!({ "user_id": "u9", "message": message, "business_type": "courses" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = ctx.get("/api/dashboard/summary").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["note"], "Live metrics from agent_interactions table.");
    assert_eq!(body["totalInteractions"], 14);

    let recent = body["recentInteractions"].as_array().unwrap();
    assert_eq!(recent.len(), 10);
    // Newest first; the two logged interactions carry the current time.
    assert_eq!(recent[0]["user_id"], "u9");
    assert!(recent[0].get("business_type").is_none());
    // u9 plus u0..u2 among the eight newest seeded rows
    assert_eq!(body["uniqueUsers"], 4);

    assert_eq!(
        body["verticalBreakdown"],
        json!([
            { "id": "cleaning", "label": "Cleaning Services", "interactions": 0, "deliveries": 0 },
            { "id": "photobooth", "label": "Photobooth Business", "interactions": 0, "deliveries": 0 },
            { "id": "courses", "label": "Gold Wealth Academy", "interactions": 2, "deliveries": 1 }
        ])
    );
}

#[tokio::test]
async fn test_summary_store_error() {
    let ctx = TestContext::builder()
        .with_failing_store("connection refused")
        .build();

    let (status, body) = ctx.get("/api/dashboard/summary").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "connection refused",
            "totalInteractions": 0,
            "uniqueUsers": 0,
            "recentInteractions": [],
            "status": "error",
            "note": "Live metrics from agent_interactions table"
        })
    );
}

#[tokio::test]
async fn test_verticals_start_at_zero() {
    let (status, body) = TestContext::unconfigured()
        .get("/api/dashboard/verticals")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "types": [
                { "id": "cleaning", "label": "Cleaning Services", "goal": 62, "interactions": 0, "deliveries": 0 },
                { "id": "photobooth", "label": "Photobooth Business", "goal": 48, "interactions": 0, "deliveries": 0 },
                { "id": "courses", "label": "Gold Wealth Academy", "goal": 32, "interactions": 0, "deliveries": 0 }
            ]
        })
    );
}

#[tokio::test]
async fn test_verticals_count_unpersisted_interactions() {
    let ctx = TestContext::unconfigured();

    for business_type in [json!("photobooth"), json!(null), json!("Cleaning crew")] {
        let (status, _) = ctx
            .post(
                "/api/interactions",
                json!({ "user_id": "u1", "message": "hi", "business_type": business_type }),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let (_, body) = ctx.get("/api/dashboard/verticals").await;
    assert_eq!(body["types"][0]["interactions"], 2);
    assert_eq!(body["types"][1]["interactions"], 1);
    assert_eq!(body["types"][2]["interactions"], 0);
}

#[tokio::test]
async fn test_seeded_counters_show_in_verticals() {
    let ctx = TestContext::with_store();
    ctx.store()
        .insert(
            INTERACTIONS_TABLE,
            vec![
                json!({ "user_id": "a", "business_type": "courses" }),
                json!({ "user_id": "b", "business_type": "photobooth" }),
                json!({ "user_id": "c", "business_type": null }),
            ],
        )
        .await
        .unwrap();

    let outcome = ctx
        .state
        .stats
        .seed(ctx.state.store.as_deref())
        .await
        .unwrap();
    assert_eq!(outcome, SeedOutcome::Seeded { rows: 3 });

    let (_, body) = ctx.get("/api/dashboard/verticals").await;
    for (index, expected) in [1, 1, 1].into_iter().enumerate() {
        assert_eq!(body["types"][index]["interactions"], expected);
        assert_eq!(body["types"][index]["deliveries"], 0);
    }
}
