// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Scrubbing of workflow JSON before it is written back to disk.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Runtime-only node state the editor attaches under `data.state`.
const RUNTIME_STATE_FIELD: &str = "state";

fn credential_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        RegexBuilder::new(
            r"^(api[_-]?key|secret|client[_-]?secret|password|passwd|token|access[_-]?token|refresh[_-]?token|auth[_-]?token|private[_-]?key|credentials?)$",
        )
        .case_insensitive(true)
        .build()
        .expect("credential key pattern is valid")
    })
}

/// What [`sanitize_credentials`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub blanked_values: usize,
    pub stripped_states: usize,
}

/// Blanks credential-shaped values and drops runtime node state, in place.
///
/// A value counts as credential-shaped when its key matches a known secret name (`apiKey`,
/// `password`, `token`, ...); every string below such a key is emptied, except `type`
/// discriminants. Node `data.state` is removed wherever a `nodes` or `blocks` array holds
/// nodes.
pub fn sanitize_credentials(value: &mut Value) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    walk(value, &mut report);
    report
}

fn walk(value: &mut Value, report: &mut SanitizeReport) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if credential_key_re().is_match(key) {
                    blank_strings(child, report);
                    continue;
                }
                if key == "nodes" || key == "blocks" {
                    strip_runtime_state(child, report);
                }
                walk(child, report);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, report);
            }
        }
        _ => {}
    }
}

fn blank_strings(value: &mut Value, report: &mut SanitizeReport) {
    match value {
        Value::String(text) if !text.is_empty() => {
            text.clear();
            report.blanked_values += 1;
        }
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key != "type" {
                    blank_strings(child, report);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                blank_strings(item, report);
            }
        }
        _ => {}
    }
}

fn strip_runtime_state(nodes: &mut Value, report: &mut SanitizeReport) {
    let Value::Array(nodes) = nodes else {
        return;
    };
    for node in nodes {
        if let Some(Value::Object(data)) = node.get_mut("data") {
            if data.remove(RUNTIME_STATE_FIELD).is_some() {
                report.stripped_states += 1;
            }
        }
    }
}
