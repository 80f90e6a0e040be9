// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Map, Value};

use super::{
    classify_file, looks_like_bundle, normalize_bundle_at, parse_bundle_shape,
    repair_references, serialize_bundle, BundleShape, FileShape, RepairStrategy, ShapeError,
};
use crate::model::{Bundle, BundleSheet, Document, Node};

const NOW: i64 = 1_700_000_000_000;

fn call_node(id: &str, data: Value) -> Node {
    Node::new(id, "call").with_data(data)
}

fn sheet(id: &str, name: &str, nodes: Vec<Node>) -> BundleSheet {
    BundleSheet {
        id: id.to_owned(),
        name: name.to_owned(),
        document: Document {
            nodes,
            ..Document::default()
        },
        created_at: Some(1),
        last_opened_at: Some(2),
        ..BundleSheet::default()
    }
}

#[rstest]
#[case::canonical(json!({"mainSheetId": "m", "sheets": []}), true)]
#[case::legacy(json!({"sheets": {"m": {}}, "order": ["m"]}), true)]
#[case::legacy_without_order(json!({"sheets": {"m": {}}}), false)]
#[case::array_without_main(json!({"sheets": []}), false)]
#[case::skill(json!({"skillName": "x", "workFlow": {"nodes": [], "edges": []}}), false)]
#[case::not_object(json!([1, 2]), false)]
fn looks_like_bundle_discriminates_shapes(#[case] raw: Value, #[case] expected: bool) {
    assert_eq!(looks_like_bundle(&raw), expected);
}

#[test]
fn canonical_input_passes_through_with_backfilled_timestamps() {
    let raw = json!({
        "mainSheetId": "main",
        "sheets": [
            {"id": "main", "name": "Main", "document": {"nodes": [], "edges": []}, "createdAt": 7},
            {"id": "s2", "name": "Two"}
        ],
        "openTabs": ["main"],
        "activeSheetId": "main"
    });

    let bundle = normalize_bundle_at(&raw, NOW).expect("bundle");

    assert_eq!(bundle.main_sheet_id, "main");
    assert_eq!(bundle.sheets[0].created_at, Some(7));
    assert_eq!(bundle.sheets[0].last_opened_at, Some(NOW));
    assert_eq!(bundle.sheets[1].created_at, Some(NOW));
    assert_eq!(bundle.open_tabs, vec!["main"]);
    assert_eq!(bundle.active_sheet_id.as_deref(), Some("main"));
}

#[test]
fn legacy_input_follows_order_then_remaining_keys() {
    let raw = json!({
        "sheets": {
            "a": {"name": "A"},
            "b": {"name": "B"},
            "c": {"name": "C"}
        },
        "order": ["c", "ghost", "a"],
        "openTabs": ["a"]
    });

    let bundle = normalize_bundle_at(&raw, NOW).expect("bundle");
    let ids: Vec<&str> = bundle.sheets.iter().map(|s| s.id.as_str()).collect();

    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(bundle.main_sheet_id, "c");
    assert_eq!(bundle.open_tabs, vec!["a"]);
}

#[test]
fn legacy_input_without_order_uses_key_order() {
    let raw = json!({
        "sheets": {
            "zeta": {"name": "Z"},
            "alpha": {"name": "A"}
        }
    });

    let bundle = normalize_bundle_at(&raw, NOW).expect("bundle");
    let ids: Vec<&str> = bundle.sheets.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["zeta", "alpha"]);
}

#[test]
fn legacy_main_sheet_id_is_kept_when_it_resolves() {
    let raw = json!({
        "mainSheetId": "b",
        "sheets": {"a": {"name": "A"}, "b": {"name": "B"}},
        "order": ["a", "b"]
    });

    let BundleShape::Legacy(legacy) = parse_bundle_shape(&raw).unwrap() else {
        panic!("expected legacy shape");
    };
    assert_eq!(legacy.main_sheet_id.as_deref(), Some("b"));
    assert_eq!(normalize_bundle_at(&raw, NOW).unwrap().main_sheet_id, "b");
}

#[test]
fn unreadable_legacy_entries_are_dropped() {
    let raw = json!({
        "sheets": {"a": "not a sheet", "b": {"name": "B"}},
        "order": ["a", "b"]
    });

    let bundle = normalize_bundle_at(&raw, NOW).expect("bundle");
    assert_eq!(bundle.sheets.len(), 1);
    assert_eq!(bundle.main_sheet_id, "b");
}

#[rstest]
#[case::empty_canonical(json!({"mainSheetId": "m", "sheets": []}))]
#[case::empty_legacy(json!({"sheets": {}, "order": []}))]
#[case::unrecognized(json!({"nodes": [], "edges": []}))]
#[case::scalar(json!("bundle"))]
fn normalize_returns_none_without_sheets_or_shape(#[case] raw: Value) {
    assert_eq!(normalize_bundle_at(&raw, NOW), None);
}

#[test]
fn classify_file_separates_bundles_from_skills() {
    let bundle = json!({"mainSheetId": "m", "sheets": [{"id": "m", "name": "M"}]});
    assert!(matches!(classify_file(&bundle), Ok(FileShape::Bundle(_))));

    let skill = json!({"skillName": "s", "workFlow": {"nodes": [], "edges": []}});
    let Ok(FileShape::Skill(skill)) = classify_file(&skill) else {
        panic!("expected skill");
    };
    assert_eq!(skill.skill_name, "s");

    let empty = json!({"mainSheetId": "m", "sheets": []});
    assert!(matches!(classify_file(&empty), Err(ShapeError::EmptyBundle)));

    assert!(matches!(
        classify_file(&json!(3)),
        Err(ShapeError::NotAnObject { found: "number" })
    ));
}

#[test]
fn repair_matches_names_case_insensitively_and_backfills_names() {
    let mut bundle = Bundle {
        main_sheet_id: "main".to_owned(),
        sheets: vec![
            sheet(
                "main",
                "Main",
                vec![call_node(
                    "n1",
                    json!({"targetSheetId": "stale", "targetSheet": "  helper "}),
                )],
            ),
            sheet("h", "Helper", Vec::new()),
            sheet("o", "Other", Vec::new()),
        ],
        ..Bundle::default()
    };

    let report = repair_references(&mut bundle);

    assert_eq!(report.unresolved, 0);
    assert_eq!(report.repaired.len(), 1);
    assert_eq!(report.repaired[0].strategy, RepairStrategy::NameMatch);
    assert_eq!(report.repaired[0].previous_target.as_deref(), Some("stale"));

    let node = &bundle.sheets[0].document.nodes[0];
    assert_eq!(node.call_target(), Some("h"));
    assert_eq!(node.data["targetSheet"], "Helper");
    assert_eq!(node.data["targetSheetName"], "Helper");
    assert_eq!(node.data["sheetName"], "Helper");
}

#[rstest]
#[case::editor_field(json!({"targetSheetId": "stale", "targetSheet": "Helper"}))]
#[case::runtime_snake_case(json!({"targetSheetId": "stale", "target_sheet": "helper"}))]
#[case::runtime_sheet_name(json!({"sheet_name": "HELPER"}))]
fn repair_reads_every_recorded_name_field(#[case] data: Value) {
    let mut bundle = Bundle {
        main_sheet_id: "main".to_owned(),
        sheets: vec![
            sheet("main", "Main", vec![call_node("n1", data)]),
            sheet("h", "Helper", Vec::new()),
            sheet("x", "Other", Vec::new()),
        ],
        ..Bundle::default()
    };

    let report = repair_references(&mut bundle);

    assert_eq!(report.unresolved, 0);
    assert_eq!(report.repaired[0].strategy, RepairStrategy::NameMatch);
    assert_eq!(bundle.sheets[0].document.nodes[0].call_target(), Some("h"));
}

#[test]
fn call_labels_do_not_block_the_single_candidate_fallback() {
    let mut bundle = Bundle {
        main_sheet_id: "main".to_owned(),
        sheets: vec![
            sheet(
                "main",
                "Main",
                vec![call_node(
                    "n1",
                    json!({"targetSheetId": "stale", "callName": "Fetch prices"}),
                )],
            ),
            sheet("prices", "Prices", Vec::new()),
        ],
        ..Bundle::default()
    };

    let report = repair_references(&mut bundle);

    assert_eq!(report.unresolved, 0);
    assert_eq!(report.repaired[0].strategy, RepairStrategy::SingleCandidate);
    let node = &bundle.sheets[0].document.nodes[0];
    assert_eq!(node.call_target(), Some("prices"));
    assert_eq!(node.data["callName"], "Fetch prices");
    assert_eq!(node.data["targetSheet"], "Prices");
}

#[test]
fn repair_defaults_to_the_single_other_sheet_when_no_name_is_recorded() {
    let mut bundle = Bundle {
        main_sheet_id: "main".to_owned(),
        sheets: vec![
            sheet("main", "Main", vec![call_node("n1", json!({}))]),
            sheet("sub", "Sub", Vec::new()),
        ],
        ..Bundle::default()
    };

    let report = repair_references(&mut bundle);

    assert_eq!(report.repaired[0].strategy, RepairStrategy::SingleCandidate);
    assert_eq!(bundle.sheets[0].document.nodes[0].call_target(), Some("sub"));
}

#[test]
fn repair_leaves_ambiguous_references_alone() {
    let mut bundle = Bundle {
        main_sheet_id: "main".to_owned(),
        sheets: vec![
            sheet("main", "Main", vec![call_node("n1", json!({"targetSheetId": "s3"}))]),
            sheet("s2", "Two", Vec::new()),
            sheet("s4", "Four", Vec::new()),
        ],
        ..Bundle::default()
    };
    let before = bundle.clone();

    let report = repair_references(&mut bundle);

    assert!(report.repaired.is_empty());
    assert_eq!(report.unresolved, 1);
    assert_eq!(bundle, before);
}

#[test]
fn repair_ignores_unknown_names() {
    let mut bundle = Bundle {
        main_sheet_id: "main".to_owned(),
        sheets: vec![
            sheet("main", "Main", vec![call_node("n1", json!({"sheetName": "Nope"}))]),
            sheet("s2", "Two", Vec::new()),
        ],
        ..Bundle::default()
    };

    let report = repair_references(&mut bundle);
    assert_eq!(report.unresolved, 1);
    assert_eq!(bundle.sheets[0].document.nodes[0].call_target(), None);
}

#[test]
fn serialized_bundle_is_canonical_and_newline_terminated() {
    let bundle = Bundle {
        main_sheet_id: "main".to_owned(),
        sheets: vec![sheet("main", "Main", Vec::new())],
        open_tabs: vec!["main".to_owned()],
        active_sheet_id: Some("main".to_owned()),
        schema_version: Some("1.0.1".to_owned()),
    };

    let text = serialize_bundle(&bundle).unwrap();
    assert!(text.ends_with("}\n"));

    let raw: Value = serde_json::from_str(&text).unwrap();
    assert!(looks_like_bundle(&raw));
    assert_eq!(normalize_bundle_at(&raw, NOW), Some(bundle));
}

fn canonical_shape(sheets: &[(String, String, Option<i64>)], tabs: &[String]) -> Value {
    json!({
        "mainSheetId": sheets[0].0,
        "sheets": sheets.iter().map(|(id, name, created)| {
            let mut entry = Map::new();
            entry.insert("id".to_owned(), json!(id));
            entry.insert("name".to_owned(), json!(name));
            entry.insert("document".to_owned(), json!({"nodes": [{"id": "n", "type": "start"}], "edges": []}));
            if let Some(created) = created {
                entry.insert("createdAt".to_owned(), json!(created));
            }
            Value::Object(entry)
        }).collect::<Vec<_>>(),
        "openTabs": tabs,
    })
}

fn legacy_shape(sheets: &[(String, String, Option<i64>)], tabs: &[String]) -> Value {
    let mut map = Map::new();
    // Insert in reverse so that only `order` can restore the sequence.
    for (id, name, created) in sheets.iter().rev() {
        let mut entry = Map::new();
        entry.insert("name".to_owned(), json!(name));
        entry.insert("document".to_owned(), json!({"nodes": [{"id": "n", "type": "start"}], "edges": []}));
        if let Some(created) = created {
            entry.insert("createdAt".to_owned(), json!(created));
        }
        map.insert(id.clone(), Value::Object(entry));
    }
    json!({
        "sheets": map,
        "order": sheets.iter().map(|(id, _, _)| id.clone()).collect::<Vec<_>>(),
        "openTabs": tabs,
    })
}

fn logical_sheets() -> impl Strategy<Value = Vec<(String, String, Option<i64>)>> {
    proptest::collection::btree_map("[a-z]{1,6}", ("[A-Za-z ]{0,8}", proptest::option::of(0i64..1_000_000)), 1..6)
        .prop_map(|map| map.into_iter().map(|(id, (name, created))| (id, name, created)).collect())
}

proptest! {
    #[test]
    fn normalization_is_shape_invariant(sheets in logical_sheets()) {
        let tabs: Vec<String> = sheets.iter().take(2).map(|(id, _, _)| id.clone()).collect();

        let from_canonical = normalize_bundle_at(&canonical_shape(&sheets, &tabs), NOW);
        let from_legacy = normalize_bundle_at(&legacy_shape(&sheets, &tabs), NOW);

        prop_assert!(from_canonical.is_some());
        prop_assert_eq!(from_canonical, from_legacy);
    }
}
