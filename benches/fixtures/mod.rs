// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use serde_json::{json, Value};
use skillsheets::model::{Bundle, BundleSheet, Document, Edge, Node};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub fn sheets(self) -> usize {
        match self {
            Self::Small => 4,
            Self::Medium => 32,
            Self::Large => 256,
        }
    }

    /// Plain nodes per sheet, besides markers and calls.
    pub fn nodes_per_sheet(self) -> usize {
        match self {
            Self::Small => 8,
            Self::Medium => 24,
            Self::Large => 48,
        }
    }
}

fn sheet_id(index: usize) -> String {
    if index == 0 {
        "main".to_owned()
    } else {
        format!("sheet-{index:04}")
    }
}

/// One sheet of the chain: markers, a run of condition nodes wired with legacy ports and,
/// for every sheet but the last, a call into the next sheet with complete mappings.
fn sheet_document(index: usize, case: Case) -> Document {
    let mut nodes = vec![
        Node::new("inputs", "sheet-inputs")
            .with_data(json!({"interface": {"inputs": [{"name": "query"}]}})),
        Node::new("outputs", "sheet-outputs")
            .with_data(json!({"interface": {"outputs": [{"name": "answer"}]}})),
    ];
    let mut edges = Vec::new();

    let mut previous = "inputs".to_owned();
    for n in 0..case.nodes_per_sheet() {
        let id = format!("cond_{n}");
        nodes.push(Node::new(&id, "condition").with_data(json!({
            "conditions": [{"key": format!("if_{index}_{n}")}, {"key": format!("else_{index}_{n}")}]
        })));
        edges.push(Edge::new(&previous, &id).with_source_port("if_out"));
        previous = id;
    }

    if index + 1 < case.sheets() {
        nodes.push(Node::new("call", "sheet-call").with_data(json!({
            "targetSheetId": sheet_id(index + 1),
            "inputMapping": {"query": "q"},
            "outputMapping": {"answer": "a"}
        })));
        edges.push(Edge::new(&previous, "call").with_source_port("else_out"));
    }

    Document {
        nodes,
        edges,
        ..Document::default()
    }
}

pub fn chain_bundle(case: Case) -> Bundle {
    let sheets = (0..case.sheets())
        .map(|index| BundleSheet {
            id: sheet_id(index),
            name: format!("Sheet {index}"),
            document: sheet_document(index, case),
            created_at: Some(1_700_000_000_000 + index as i64),
            last_opened_at: Some(1_700_000_000_000 + index as i64),
            ..BundleSheet::default()
        })
        .collect();

    Bundle {
        main_sheet_id: "main".to_owned(),
        sheets,
        open_tabs: vec!["main".to_owned()],
        active_sheet_id: Some("main".to_owned()),
        schema_version: Some("1.0.0".to_owned()),
    }
}

/// The same bundle in the map-of-sheets shape older editor builds wrote.
pub fn legacy_bundle_json(case: Case) -> Value {
    let bundle = chain_bundle(case);
    let order: Vec<&str> = bundle.sheets.iter().map(|sheet| sheet.id.as_str()).collect();
    let mut sheets = serde_json::Map::new();
    for sheet in &bundle.sheets {
        let mut entry = serde_json::to_value(sheet).expect("sheet encodes");
        if let Value::Object(entry) = &mut entry {
            entry.remove("id");
        }
        sheets.insert(sheet.id.clone(), entry);
    }
    json!({
        "mainSheetId": bundle.main_sheet_id,
        "sheets": sheets,
        "order": order,
        "openTabs": bundle.open_tabs,
        "activeSheetId": bundle.active_sheet_id
    })
}

pub fn checksum_bundle(bundle: &Bundle) -> u64 {
    bundle
        .sheets
        .iter()
        .map(|sheet| (sheet.document.nodes.len() + sheet.document.edges.len()) as u64)
        .sum()
}
