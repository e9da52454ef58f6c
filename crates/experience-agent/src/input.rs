// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Loosely typed request fields.
//!
//! Clients send whatever JSON they like. A field counts as present when it is truthy:
//! anything except `null`, `false`, `0` and `""`. Present values are turned into text
//! the way a browser would print them, so `123` becomes `"123"`.

use serde_json::Value;

/// Whether `value` counts as present.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Textual form of `value`.
///
/// Arrays join their elements with `,` and objects print as `[object Object]`.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(as_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Text of a truthy field, `None` when the field is missing or falsy.
pub fn present(value: Option<&Value>) -> Option<String> {
    value.filter(|v| is_truthy(v)).map(as_text)
}
