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

use super::lenient;

/// Node types that invoke another sheet.
pub const CALL_NODE_TYPES: [&str; 2] = ["call", "sheet-call"];

/// Node types that declare a sheet's inputs.
pub const INPUTS_NODE_TYPES: [&str; 2] = ["inputs", "sheet-inputs"];

/// Node types that declare a sheet's outputs.
pub const OUTPUTS_NODE_TYPES: [&str; 2] = ["outputs", "sheet-outputs"];

/// Field names that have carried a call node's target sheet name over time.
///
/// `callName` is the node's display label, not a sheet name.
pub const CALL_TARGET_NAME_FIELDS: [&str; 6] = [
    "targetSheet",
    "targetSheetName",
    "sheetName",
    "targetName",
    "target_sheet",
    "sheet_name",
];

const CALL_TARGET_ID_FIELD: &str = "targetSheetId";

/// A workflow graph as produced by the flow editor.
///
/// Fields this crate does not interpret are kept in `extra` so that a load/save cycle does
/// not lose editor state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub nodes: Vec<Node>,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub edges: Vec<Edge>,
    #[serde(
        rename = "schemaVersion",
        default,
        deserialize_with = "lenient::opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<String>,
    /// Deprecated predecessor of `schemaVersion`.
    #[serde(
        rename = "dataVersion",
        default,
        deserialize_with = "lenient::opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// The template used for new and cleared sheets: a start node and an end node.
    pub fn blank() -> Self {
        Self {
            nodes: vec![
                Node::new("start_0", "start").with_data(serde_json::json!({ "title": "Start" })),
                Node::new("end_0", "end").with_data(serde_json::json!({ "title": "End" })),
            ],
            ..Self::default()
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn call_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_call())
    }

    /// Names declared by this document's interface marker nodes for `side`.
    ///
    /// Multiple marker nodes are merged; duplicates and blank names are dropped while the
    /// first-seen order is kept.
    pub fn interface_names(&self, side: InterfaceSide) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for node in self.nodes.iter().filter(|node| node.is_marker(side)) {
            for name in node.declared_interface(side) {
                if !names.iter().any(|existing| existing == &name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// One node of a [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    #[serde(default, deserialize_with = "lenient::string_like")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string_like")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            data: Value::Null,
            extra: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn is_call(&self) -> bool {
        CALL_NODE_TYPES.contains(&self.kind.as_str())
    }

    pub fn is_marker(&self, side: InterfaceSide) -> bool {
        side.marker_types().contains(&self.kind.as_str())
    }

    fn data_str(&self, field: &str) -> Option<&str> {
        self.data
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The sheet id a call node points at, if any.
    pub fn call_target(&self) -> Option<&str> {
        self.data_str(CALL_TARGET_ID_FIELD)
    }

    /// The first non-blank target name across the historical alias fields.
    pub fn call_target_name(&self) -> Option<&str> {
        CALL_TARGET_NAME_FIELDS
            .iter()
            .find_map(|field| self.data_str(field))
    }

    /// Points the call at `sheet_id` and mirrors `sheet_name` into the name fields newer
    /// editors read.
    pub fn set_call_target(&mut self, sheet_id: &str, sheet_name: &str) {
        if !self.data.is_object() {
            self.data = Value::Object(Map::new());
        }
        if let Value::Object(data) = &mut self.data {
            data.insert(CALL_TARGET_ID_FIELD.to_owned(), Value::from(sheet_id));
            data.insert("targetSheet".to_owned(), Value::from(sheet_name));
            data.insert("targetSheetName".to_owned(), Value::from(sheet_name));
            data.insert("sheetName".to_owned(), Value::from(sheet_name));
        }
    }

    /// Interface names this marker node declares under `data.interface.<side>[].name`.
    pub fn declared_interface(&self, side: InterfaceSide) -> Vec<String> {
        self.data
            .get("interface")
            .and_then(|interface| interface.get(side.interface_field()))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Whether this call node maps the interface entry `name` on `side`.
    ///
    /// An entry counts as mapped when its mapping value is present and not `null`.
    pub fn maps_interface(&self, side: InterfaceSide, name: &str) -> bool {
        self.data
            .get(side.mapping_field())
            .and_then(|mapping| mapping.get(name))
            .is_some_and(|value| !value.is_null())
    }
}

/// Which half of a sheet's interface is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceSide {
    Inputs,
    Outputs,
}

impl InterfaceSide {
    pub fn marker_types(self) -> &'static [&'static str] {
        match self {
            Self::Inputs => &INPUTS_NODE_TYPES,
            Self::Outputs => &OUTPUTS_NODE_TYPES,
        }
    }

    pub fn interface_field(self) -> &'static str {
        match self {
            Self::Inputs => "inputs",
            Self::Outputs => "outputs",
        }
    }

    pub fn mapping_field(self) -> &'static str {
        match self {
            Self::Inputs => "inputMapping",
            Self::Outputs => "outputMapping",
        }
    }

    pub fn as_str(self) -> &'static str {
        self.interface_field()
    }
}

/// One edge of a [`Document`].
///
/// Edges are stored as their raw field map: files written by different editor builds use
/// `sourceNodeID`/`source` and `sourcePortID`/`sourcePortId` interchangeably (sometimes
/// both), so the accessors resolve the aliases instead of the deserializer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Edge {
    fields: Map<String, Value>,
}

const SOURCE_NODE_FIELDS: [&str; 2] = ["sourceNodeID", "source"];
const TARGET_NODE_FIELDS: [&str; 2] = ["targetNodeID", "target"];
const SOURCE_PORT_FIELDS: [&str; 2] = ["sourcePortID", "sourcePortId"];
const TARGET_PORT_FIELDS: [&str; 2] = ["targetPortID", "targetPortId"];

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(SOURCE_NODE_FIELDS[0].to_owned(), Value::String(source.into()));
        fields.insert(TARGET_NODE_FIELDS[0].to_owned(), Value::String(target.into()));
        Self { fields }
    }

    pub fn with_source_port(mut self, port: impl Into<String>) -> Self {
        self.fields
            .insert(SOURCE_PORT_FIELDS[0].to_owned(), Value::String(port.into()));
        self
    }

    pub fn with_target_port(mut self, port: impl Into<String>) -> Self {
        self.fields
            .insert(TARGET_PORT_FIELDS[0].to_owned(), Value::String(port.into()));
        self
    }

    fn first_str(&self, fields: &[&str]) -> Option<&str> {
        fields
            .iter()
            .find_map(|field| self.fields.get(*field).and_then(Value::as_str))
    }

    pub fn source(&self) -> Option<&str> {
        self.first_str(&SOURCE_NODE_FIELDS)
    }

    pub fn target(&self) -> Option<&str> {
        self.first_str(&TARGET_NODE_FIELDS)
    }

    pub fn source_port(&self) -> Option<&str> {
        self.first_str(&SOURCE_PORT_FIELDS)
    }

    pub fn target_port(&self) -> Option<&str> {
        self.first_str(&TARGET_PORT_FIELDS)
    }

    /// Sets the canonical source port; an alias field already present is kept in sync.
    pub fn set_source_port(&mut self, port: &str) {
        self.fields
            .insert(SOURCE_PORT_FIELDS[0].to_owned(), Value::from(port));
        if let Some(alias) = self.fields.get_mut(SOURCE_PORT_FIELDS[1]) {
            *alias = Value::from(port);
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}
