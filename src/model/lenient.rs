// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tolerant field deserializers for hand-edited and older files.

use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` or a missing field both become `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strings pass through, numbers and booleans are stringified, anything else is empty.
pub(crate) fn string_like<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Optional string variant of [`string_like`]; empty values become `None`.
pub(crate) fn opt_string_like<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = string_like(deserializer)?;
    Ok((!s.is_empty()).then_some(s))
}

/// Epoch milliseconds from a number or an RFC 3339 string.
pub(crate) fn epoch_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.timestamp_millis())
            .or_else(|| s.trim().parse::<i64>().ok()),
        _ => None,
    })
}

/// Sequence of strings; non-string entries are dropped.
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::epoch_millis")]
        at: Option<i64>,
        #[serde(default, deserialize_with = "super::string_like")]
        version: String,
        #[serde(default, deserialize_with = "super::string_list")]
        tabs: Vec<String>,
    }

    #[test]
    fn epoch_millis_accepts_numbers_and_rfc3339() {
        let p: Probe = serde_json::from_str(r#"{"at": 1700000000000}"#).unwrap();
        assert_eq!(p.at, Some(1_700_000_000_000));

        let p: Probe = serde_json::from_str(r#"{"at": "1970-01-01T00:00:01Z"}"#).unwrap();
        assert_eq!(p.at, Some(1000));

        let p: Probe = serde_json::from_str(r#"{"at": "yesterday"}"#).unwrap();
        assert_eq!(p.at, None);
    }

    #[test]
    fn string_like_and_list_tolerate_odd_values() {
        let p: Probe = serde_json::from_str(r#"{"version": 2, "tabs": ["a", 3, null, "b"]}"#)
            .unwrap();
        assert_eq!(p.version, "2");
        assert_eq!(p.tabs, vec!["a".to_owned(), "b".to_owned()]);
    }
}
