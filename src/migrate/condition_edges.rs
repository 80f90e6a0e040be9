// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::Value;

use super::MigrationError;
use crate::model::Document;

const CONDITION_NODE_TYPE: &str = "condition";

/// 1.0.0 -> 1.0.1: condition edges leave through per-branch ports.
///
/// The branch list is ordered `if_*` first and `else_*` last; `if_out` maps to the first
/// key and `else_out` to the last one (only when there are at least two branches).
pub(super) fn condition_edges_v1_0_0_to_v1_0_1(
    document: &Document,
) -> Result<Document, MigrationError> {
    let mut next = document.clone();

    let mut rewrites: Vec<(String, Option<String>, Option<String>)> = Vec::new();
    for node in next
        .nodes
        .iter()
        .filter(|node| node.kind == CONDITION_NODE_TYPE)
    {
        let keys = branch_keys(&node.id, &node.data)?;
        if keys.is_empty() {
            continue;
        }
        let if_key = keys.first().cloned().flatten();
        let else_key = if keys.len() > 1 {
            keys.last().cloned().flatten()
        } else {
            None
        };
        rewrites.push((node.id.clone(), if_key, else_key));
    }

    for (node_id, if_key, else_key) in &rewrites {
        let mut rewritten = 0usize;
        for edge in next
            .edges
            .iter_mut()
            .filter(|edge| edge.source() == Some(node_id.as_str()))
        {
            let replacement = match edge.source_port() {
                Some("if_out") => if_key.as_deref(),
                Some("else_out") => else_key.as_deref(),
                _ => None,
            };
            if let Some(port) = replacement {
                edge.set_source_port(port);
                rewritten += 1;
            }
        }
        if rewritten > 0 {
            tracing::debug!(
                node_id = %node_id,
                rewritten,
                if_key = if_key.as_deref().unwrap_or("<none>"),
                else_key = else_key.as_deref().unwrap_or("<none>"),
                "rewrote condition edge ports"
            );
        }
    }

    Ok(next)
}

/// Branch keys in port order: `if_*`, then everything else, then `else_*`.
fn branch_keys(node_id: &str, data: &Value) -> Result<Vec<Option<String>>, MigrationError> {
    let conditions = match data.get("conditions") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(conditions)) => conditions,
        Some(_) => {
            return Err(MigrationError::Node {
                node_id: node_id.to_owned(),
                reason: "condition list is not an array".to_owned(),
            })
        }
    };

    let mut keys: Vec<Option<String>> = conditions
        .iter()
        .map(|condition| {
            condition
                .get("key")
                .and_then(Value::as_str)
                .filter(|key| !key.is_empty())
                .map(ToOwned::to_owned)
        })
        .collect();
    keys.sort_by_key(|key| match key.as_deref() {
        Some(key) if key.starts_with("if_") => 0,
        Some(key) if key.starts_with("else_") => 2,
        _ => 1,
    });
    Ok(keys)
}
