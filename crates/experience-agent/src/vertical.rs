// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Business verticals and the classifier that maps free text onto them.
//!
//! Every record that carries a `business_type` goes through [`normalize`] before it is
//! persisted or counted, so downstream code only ever sees a canonical id.

use serde::Serialize;
use serde_json::Value;

use crate::input;

/// A line of business the agent is deployed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessType {
    /// Canonical identifier, stored in the `business_type` column.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Interaction goal shown on the verticals dashboard.
    pub goal: u32,
}

/// Canonical id used when nothing else matches.
pub const BASELINE_ID: &str = "cleaning";

/// Known verticals, in matching order.
pub const BUSINESS_TYPES: [BusinessType; 3] = [
    BusinessType {
        id: "cleaning",
        label: "Cleaning Services",
        goal: 62,
    },
    BusinessType {
        id: "photobooth",
        label: "Photobooth Business",
        goal: 48,
    },
    BusinessType {
        id: "courses",
        label: "Gold Wealth Academy",
        goal: 32,
    },
];

/// Map a raw label onto a canonical vertical id.
///
/// Matching is a case-insensitive substring test against each catalog entry in order,
/// so `"I run a Cleaning company"` classifies as `cleaning`. An entry matches when the
/// input contains its id or its full label (`"Gold Wealth Academy"` is `courses`).
/// Empty or missing input, and input that matches nothing, falls back to
/// [`BASELINE_ID`].
pub fn normalize(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return BASELINE_ID;
    };
    let candidate = raw.to_lowercase();
    BUSINESS_TYPES
        .iter()
        .find(|t| candidate.contains(t.id) || candidate.contains(&t.label.to_lowercase()))
        .map(|t| t.id)
        .unwrap_or(BASELINE_ID)
}

/// Classify an arbitrary JSON value taken from a request body or a store row.
///
/// Falsy values (`null`, `false`, `0`, `""`) fall back to [`BASELINE_ID`]. Anything
/// else is classified by its textual form, so objects never match a vertical.
pub fn normalize_value(raw: Option<&Value>) -> &'static str {
    match input::present(raw) {
        Some(text) => normalize(Some(&text)),
        None => BASELINE_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_ids_classify_to_themselves() {
        for t in BUSINESS_TYPES {
            assert_eq!(normalize(Some(t.id)), t.id);
        }
    }

    #[test]
    fn test_ids_embedded_in_sentences_any_case() {
        assert_eq!(normalize(Some("I run a CLEANING company")), "cleaning");
        assert_eq!(normalize(Some("Weekend PhotoBooth rentals")), "photobooth");
        assert_eq!(normalize(Some("online Courses for investors")), "courses");
    }

    #[test]
    fn test_missing_or_empty_input_is_baseline() {
        assert_eq!(normalize(None), BASELINE_ID);
        assert_eq!(normalize(Some("")), BASELINE_ID);
    }

    #[test]
    fn test_unrelated_text_is_baseline() {
        assert_eq!(normalize(Some("bakery")), BASELINE_ID);
        assert_eq!(normalize(Some("gold")), BASELINE_ID);
    }

    #[test]
    fn test_labels_classify_to_their_id() {
        assert_eq!(normalize(Some("Gold Wealth Academy")), "courses");
        assert_eq!(normalize(Some("our photobooth business")), "photobooth");
        assert_eq!(normalize(Some("Cleaning Services")), "cleaning");
    }

    #[test]
    fn test_first_match_in_catalog_order_wins() {
        assert_eq!(normalize(Some("photobooth and cleaning")), "cleaning");
        assert_eq!(normalize(Some("courses about photobooth")), "photobooth");
    }

    #[test]
    fn test_normalize_value_falsy_values() {
        assert_eq!(normalize_value(None), BASELINE_ID);
        assert_eq!(normalize_value(Some(&Value::Null)), BASELINE_ID);
        assert_eq!(normalize_value(Some(&json!(false))), BASELINE_ID);
        assert_eq!(normalize_value(Some(&json!(0))), BASELINE_ID);
        assert_eq!(normalize_value(Some(&json!(""))), BASELINE_ID);
    }

    #[test]
    fn test_normalize_value_strings_and_scalars() {
        assert_eq!(normalize_value(Some(&json!("Courses"))), "courses");
        assert_eq!(normalize_value(Some(&json!(42))), BASELINE_ID);
        assert_eq!(normalize_value(Some(&json!(["photobooth"]))), "photobooth");
    }

    #[test]
    fn test_normalize_value_objects_fall_back_to_baseline() {
        assert_eq!(normalize_value(Some(&json!({"k": "courses"}))), BASELINE_ID);
        assert_eq!(
            normalize_value(Some(&json!({"courses": true}))),
            BASELINE_ID
        );
    }
}
