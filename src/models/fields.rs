//! Tolerant field readers for stored documents.
//!
//! Every field is optional in storage; readers return `None` for absent or
//! mistyped values and callers substitute the semantic default.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::db::Document;

pub trait DocumentExt {
    fn str_field(&self, key: &str) -> Option<&str>;
    fn int_field(&self, key: &str) -> Option<i64>;
    fn float_field(&self, key: &str) -> Option<f64>;
    fn bool_field(&self, key: &str) -> Option<bool>;
    fn string_list(&self, key: &str) -> Vec<String>;
    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>>;

    /// Reads a string field, treating the empty string as absent.
    fn non_empty_str(&self, key: &str) -> Option<String> {
        self.str_field(key)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Reads a free-form field that may have been stored as a string or number.
    fn text_field(&self, key: &str) -> Option<String>;
}

impl DocumentExt for Document {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn int_field(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn float_field(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.str_field(key)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn text_field(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
