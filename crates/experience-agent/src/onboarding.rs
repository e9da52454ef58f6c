// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Onboarding content and the in-memory progress buffer.

use serde::Serialize;
use std::sync::Mutex;

use crate::records::OnboardingProgressRecord;

/// One recommended onboarding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OnboardingStep {
    /// Stable step identifier.
    pub id: &'static str,
    /// Short title.
    pub title: &'static str,
    /// What the user should do.
    pub description: &'static str,
    /// API routes that support the step.
    pub actions: &'static [&'static str],
    /// Display icon.
    pub icon: &'static str,
}

const STEPS: [OnboardingStep; 4] = [
    OnboardingStep {
        id: "claim-workspace",
        title: "Claim your Bizflow workspace",
        description: "Create an Experience Agent account, verify your email, and link your Supabase project so you can see interactions in one dashboard.",
        actions: &["/api/agent", "/api/onboarding/steps"],
        icon: "🗝️",
    },
    OnboardingStep {
        id: "configure-agent",
        title: "Configure your concierge agent",
        description: "Define tone, personas, and default replies so the agent feels like part of your brand. Every change is stored in Supabase for analytics.",
        actions: &["/api/interactions", "/api/dashboard/summary"],
        icon: "🤖",
    },
    OnboardingStep {
        id: "invite-team",
        title: "Invite your team & stakeholders",
        description: "Share progress links, onboarding data, and dashboards with your customer success or ops leads so everyone knows how experiences perform.",
        actions: &["/api/onboarding/progress", "/api/dashboard/summary"],
        icon: "🌐",
    },
    OnboardingStep {
        id: "measure-and-iterate",
        title: "Measure, learn, repeat",
        description: "Pull consolidated metrics from the dashboard, celebrate wins, and push new prompts when the experience needs a boost.",
        actions: &["/api/dashboard/summary"],
        icon: "📊",
    },
];

/// The onboarding steps, in recommended order.
pub fn list_steps() -> &'static [OnboardingStep] {
    &STEPS
}

/// Append-only cache of progress submissions.
///
/// Nothing reads this back over HTTP; it only keeps submissions around in development
/// when no record store is configured.
#[derive(Debug, Default)]
pub struct ProgressBuffer {
    records: Mutex<Vec<OnboardingProgressRecord>>,
}

impl ProgressBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a submission.
    pub fn push(&self, record: OnboardingProgressRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(record);
    }

    /// Number of buffered submissions.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .map(|r| r.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    /// Whether nothing has been buffered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the buffered submissions, oldest first.
    pub fn snapshot(&self) -> Vec<OnboardingProgressRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(step_id: &str) -> OnboardingProgressRecord {
        OnboardingProgressRecord {
            user_id: "u1".to_string(),
            step_id: step_id.to_string(),
            completed: false,
            metadata: json!({}),
            business_type: "cleaning".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_steps_are_in_recommended_order() {
        let ids: Vec<&str> = list_steps().iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                "claim-workspace",
                "configure-agent",
                "invite-team",
                "measure-and-iterate"
            ]
        );
    }

    #[test]
    fn test_step_serialization_shape() {
        let value = serde_json::to_value(list_steps()[3]).unwrap();
        assert_eq!(value["id"], "measure-and-iterate");
        assert_eq!(
            value["actions"],
            serde_json::json!(["/api/dashboard/summary"])
        );
        assert_eq!(value["icon"], "📊");
        assert!(value["title"].is_string());
        assert!(value["description"].is_string());
    }

    #[test]
    fn test_progress_buffer_appends_in_order() {
        let buffer = ProgressBuffer::new();
        assert!(buffer.is_empty());

        buffer.push(record("claim-workspace"));
        buffer.push(record("invite-team"));

        assert_eq!(buffer.len(), 2);
        let steps: Vec<String> = buffer.snapshot().into_iter().map(|r| r.step_id).collect();
        assert_eq!(steps, vec!["claim-workspace", "invite-team"]);
    }
}
