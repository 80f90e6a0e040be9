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

/// A single-skill file: one workflow plus the skill's header fields.
///
/// `version` is the user's own skill version and has nothing to do with `schemaVersion`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SkillDocument {
    #[serde(rename = "skillId", default, deserialize_with = "lenient::string_like")]
    pub skill_id: String,
    #[serde(rename = "skillName", default, deserialize_with = "lenient::string_like")]
    pub skill_name: String,
    #[serde(default, deserialize_with = "lenient::string_like")]
    pub version: String,
    #[serde(
        rename = "lastModified",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<Value>,
    #[serde(rename = "workFlow", default, deserialize_with = "lenient::null_as_default")]
    pub work_flow: Document,
    #[serde(
        rename = "schemaVersion",
        default,
        deserialize_with = "lenient::opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SkillDocument {
    /// A skill wrapping `work_flow`, used when only a bundle file exists on disk.
    pub fn synthesized(skill_name: impl Into<String>, work_flow: Document) -> Self {
        let skill_name = skill_name.into();
        Self {
            skill_id: skill_name.clone(),
            skill_name,
            version: "1.0.0".to_owned(),
            last_modified: Some(Value::String(chrono::Utc::now().to_rfc3339())),
            work_flow,
            schema_version: None,
            extra: Map::new(),
        }
    }
}
