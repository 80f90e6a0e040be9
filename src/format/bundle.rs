// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bundle wire formats.
//!
//! Two bundle shapes exist on disk:
//!
//! - canonical: `{ mainSheetId, sheets: [ { id, name, document, .. } ], openTabs, activeSheetId }`
//! - legacy: `{ sheets: { <id>: { name, document, .. } }, order: [<id>], openTabs, activeSheetId }`
//!
//! Both are normalized into [`Bundle`]. Single-skill documents share the `.json` extension
//! with bundles, so [`classify_file`] decides which one a parsed file is.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::model::{now_millis, Bundle, BundleSheet, SkillDocument};

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("expected a JSON object at the top level, found {found}")]
    NotAnObject { found: &'static str },
    #[error("not a sheet bundle: {reason}")]
    NotABundle { reason: &'static str },
    #[error("bundle contains no sheets")]
    EmptyBundle,
    #[error("malformed bundle: {source}")]
    MalformedBundle {
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed skill document: {source}")]
    MalformedSkill {
        #[source]
        source: serde_json::Error,
    },
}

/// Recognized bundle shape, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum BundleShape {
    Canonical(Bundle),
    Legacy(LegacyBundle),
}

/// The map-of-sheets shape written by early editor builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyBundle {
    /// Sheet entries keyed by id, in file key order.
    pub sheets: Vec<(String, Value)>,
    pub order: Option<Vec<String>>,
    pub main_sheet_id: Option<String>,
    pub open_tabs: Vec<String>,
    pub active_sheet_id: Option<String>,
    pub schema_version: Option<String>,
}

/// What a parsed `.json` file turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum FileShape {
    Bundle(Bundle),
    Skill(SkillDocument),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn opt_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn str_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(ToOwned::to_owned)
        .collect()
}

/// Cheap discriminant: does `raw` look like a bundle rather than a single-skill document?
///
/// True for `mainSheetId` plus an array `sheets`, or for a non-array `sheets` object paired
/// with an `order` array.
pub fn looks_like_bundle(raw: &Value) -> bool {
    let Some(obj) = raw.as_object() else {
        return false;
    };
    match obj.get("sheets") {
        Some(Value::Array(_)) => obj.contains_key("mainSheetId"),
        Some(Value::Object(_)) => obj.get("order").is_some_and(Value::is_array),
        _ => false,
    }
}

/// Recognizes the bundle shape of `raw`.
///
/// This is more tolerant than [`looks_like_bundle`]: a legacy map of sheets without an
/// `order` array is still accepted and ordered by key order.
pub fn parse_bundle_shape(raw: &Value) -> Result<BundleShape, ShapeError> {
    let obj = raw.as_object().ok_or(ShapeError::NotAnObject {
        found: json_kind(raw),
    })?;

    match obj.get("sheets") {
        Some(Value::Array(_)) => {
            if !obj.contains_key("mainSheetId") {
                return Err(ShapeError::NotABundle {
                    reason: "sheet array without mainSheetId",
                });
            }
            let bundle: Bundle = serde_json::from_value(raw.clone())
                .map_err(|source| ShapeError::MalformedBundle { source })?;
            Ok(BundleShape::Canonical(bundle))
        }
        Some(Value::Object(sheets)) => Ok(BundleShape::Legacy(LegacyBundle {
            sheets: sheets
                .iter()
                .map(|(id, sheet)| (id.clone(), sheet.clone()))
                .collect(),
            order: obj
                .get("order")
                .filter(|order| order.is_array())
                .map(|order| str_list(Some(order))),
            main_sheet_id: opt_str(obj, "mainSheetId"),
            open_tabs: str_list(obj.get("openTabs")),
            active_sheet_id: opt_str(obj, "activeSheetId"),
            schema_version: opt_str(obj, "schemaVersion"),
        })),
        Some(_) => Err(ShapeError::NotABundle {
            reason: "sheets is neither an array nor an object",
        }),
        None => Err(ShapeError::NotABundle {
            reason: "missing sheets",
        }),
    }
}

impl BundleShape {
    /// Projects either shape onto a canonical [`Bundle`], backfilling timestamps with `now`.
    pub fn into_bundle(self, now: i64) -> Bundle {
        let mut bundle = match self {
            Self::Canonical(bundle) => bundle,
            Self::Legacy(legacy) => legacy.into_canonical(),
        };

        for sheet in &mut bundle.sheets {
            sheet.created_at.get_or_insert(now);
            sheet.last_opened_at.get_or_insert(now);
        }

        bundle
    }
}

impl LegacyBundle {
    fn into_canonical(self) -> Bundle {
        let Self {
            sheets,
            order,
            main_sheet_id,
            open_tabs,
            active_sheet_id,
            schema_version,
        } = self;

        let mut ordered_ids: Vec<String> = Vec::with_capacity(sheets.len());
        let mut seen = BTreeSet::new();
        let key_order = sheets.iter().map(|(id, _)| id.clone());
        for id in order.into_iter().flatten().chain(key_order) {
            if sheets.iter().any(|(key, _)| key == &id) && seen.insert(id.clone()) {
                ordered_ids.push(id);
            }
        }

        let mut canonical_sheets = Vec::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            let Some((_, raw)) = sheets.iter().find(|(key, _)| key == &id) else {
                continue;
            };
            match serde_json::from_value::<BundleSheet>(raw.clone()) {
                Ok(mut sheet) => {
                    sheet.id = id;
                    canonical_sheets.push(sheet);
                }
                Err(err) => {
                    tracing::warn!(sheet_id = %id, error = %err, "dropping unreadable legacy sheet entry");
                }
            }
        }

        let main_sheet_id = main_sheet_id
            .filter(|main| canonical_sheets.iter().any(|sheet| &sheet.id == main))
            .or_else(|| canonical_sheets.first().map(|sheet| sheet.id.clone()))
            .unwrap_or_default();

        Bundle {
            main_sheet_id,
            sheets: canonical_sheets,
            open_tabs,
            active_sheet_id,
            schema_version,
        }
    }
}

/// Normalizes either bundle shape; `None` if unrecognized or without sheets.
pub fn normalize_bundle(raw: &Value) -> Option<Bundle> {
    normalize_bundle_at(raw, now_millis())
}

/// [`normalize_bundle`] with an explicit clock for missing timestamps.
pub fn normalize_bundle_at(raw: &Value, now: i64) -> Option<Bundle> {
    let shape = match parse_bundle_shape(raw) {
        Ok(shape) => shape,
        Err(err) => {
            tracing::debug!(error = %err, "value is not a recognizable bundle");
            return None;
        }
    };
    let bundle = shape.into_bundle(now);
    (!bundle.sheets.is_empty()).then_some(bundle)
}

/// Decides whether a parsed file is a bundle or a single-skill document.
pub fn classify_file(raw: &Value) -> Result<FileShape, ShapeError> {
    if !raw.is_object() {
        return Err(ShapeError::NotAnObject {
            found: json_kind(raw),
        });
    }

    if looks_like_bundle(raw) {
        let bundle = parse_bundle_shape(raw)?.into_bundle(now_millis());
        if bundle.sheets.is_empty() {
            return Err(ShapeError::EmptyBundle);
        }
        return Ok(FileShape::Bundle(bundle));
    }

    serde_json::from_value::<SkillDocument>(raw.clone())
        .map(FileShape::Skill)
        .map_err(|source| ShapeError::MalformedSkill { source })
}

/// How a dangling call target was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Case-insensitive match of a recorded target name against sheet names.
    NameMatch,
    /// No name recorded and exactly one other sheet exists.
    SingleCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedReference {
    pub sheet_id: String,
    pub node_id: String,
    pub previous_target: Option<String>,
    pub target: String,
    pub strategy: RepairStrategy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub repaired: Vec<RepairedReference>,
    /// Call nodes still pointing nowhere after repair.
    pub unresolved: usize,
}

/// Repoints call nodes whose target sheet id does not exist.
///
/// Recovery tries, in order: a case-insensitive match of the node's recorded target name
/// (see [`crate::model::CALL_TARGET_NAME_FIELDS`]) against sheet names, then, when no name
/// is recorded at all, the only other sheet in the bundle. Anything else is left for the
/// resolver to report.
pub fn repair_references(bundle: &mut Bundle) -> RepairReport {
    let directory: Vec<(String, String)> = bundle
        .sheets
        .iter()
        .filter(|sheet| !sheet.id.is_empty())
        .map(|sheet| (sheet.id.clone(), sheet.name.clone()))
        .collect();

    let mut report = RepairReport::default();

    for sheet in &mut bundle.sheets {
        let owner_id = sheet.id.clone();
        for node in sheet.document.nodes.iter_mut().filter(|node| node.is_call()) {
            let previous_target = node.call_target().map(ToOwned::to_owned);
            if previous_target
                .as_deref()
                .is_some_and(|target| directory.iter().any(|(id, _)| id == target))
            {
                continue;
            }

            let resolved = match node.call_target_name() {
                Some(wanted) => {
                    let wanted = wanted.to_lowercase();
                    directory
                        .iter()
                        .find(|(_, name)| name.trim().to_lowercase() == wanted)
                        .map(|entry| (entry, RepairStrategy::NameMatch))
                }
                None => {
                    let mut others = directory.iter().filter(|(id, _)| id != &owner_id);
                    match (others.next(), others.next()) {
                        (Some(only), None) => Some((only, RepairStrategy::SingleCandidate)),
                        _ => None,
                    }
                }
            };

            let Some(((target_id, target_name), strategy)) = resolved else {
                report.unresolved += 1;
                continue;
            };

            node.set_call_target(target_id, target_name);
            tracing::info!(
                sheet_id = %owner_id,
                node_id = %node.id,
                from = previous_target.as_deref().unwrap_or("<none>"),
                to = %target_id,
                ?strategy,
                "repaired call target"
            );
            report.repaired.push(RepairedReference {
                sheet_id: owner_id.clone(),
                node_id: node.id.clone(),
                previous_target,
                target: target_id.clone(),
                strategy,
            });
        }
    }

    report
}

/// Pretty JSON with a trailing newline, the on-disk form of every file this crate writes.
pub fn serialize_bundle(bundle: &Bundle) -> Result<String, serde_json::Error> {
    to_file_json(bundle)
}

pub(crate) fn to_file_json<T: serde::Serialize + ?Sized>(
    value: &T,
) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests;
