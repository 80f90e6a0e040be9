// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::Document;
use super::lenient;

/// The canonical on-disk multi-sheet container.
///
/// Ids are raw strings here: a bundle is an import/export snapshot and may be broken in
/// ways the resolver has to report (missing or duplicate ids, dangling tabs).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bundle {
    #[serde(rename = "mainSheetId", default, deserialize_with = "lenient::string_like")]
    pub main_sheet_id: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub sheets: Vec<BundleSheet>,
    #[serde(rename = "openTabs", default, deserialize_with = "lenient::string_list")]
    pub open_tabs: Vec<String>,
    #[serde(
        rename = "activeSheetId",
        default,
        deserialize_with = "lenient::opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_sheet_id: Option<String>,
    #[serde(
        rename = "schemaVersion",
        default,
        deserialize_with = "lenient::opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<String>,
}

impl Bundle {
    pub fn sheet(&self, sheet_id: &str) -> Option<&BundleSheet> {
        self.sheets.iter().find(|sheet| sheet.id == sheet_id)
    }

    pub fn main_sheet(&self) -> Option<&BundleSheet> {
        self.sheet(&self.main_sheet_id)
    }
}

/// One sheet inside a [`Bundle`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BundleSheet {
    #[serde(default, deserialize_with = "lenient::string_like")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_like")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub document: Document,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "lenient::epoch_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    #[serde(
        rename = "lastOpenedAt",
        default,
        deserialize_with = "lenient::epoch_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_opened_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<SheetView>,
    #[serde(
        rename = "selectionIds",
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selection_ids: Vec<String>,
}

/// Per-sheet canvas state restored when a tab is reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SheetView {
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SheetView {
    pub fn with_zoom(zoom: f64) -> Self {
        Self {
            zoom,
            extra: Map::new(),
        }
    }
}

impl Default for SheetView {
    fn default() -> Self {
        Self::with_zoom(default_zoom())
    }
}

fn default_zoom() -> f64 {
    1.0
}
