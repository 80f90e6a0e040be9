// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use skillsheets::config::EditorConfig;
use skillsheets::format::bundle::serialize_bundle;
use skillsheets::loader::{LoadOptions, PersistOutcome, SkillLoader};
use skillsheets::migrate::CURRENT_SCHEMA_VERSION;
use skillsheets::model::SheetId;
use skillsheets::registry::SheetRegistry;
use skillsheets::resolve::IssueKind;
use skillsheets::store::{FileStore, FsStore};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap_or_else(|err| panic!("failed to create {to:?}: {err}"));
    for entry in fs::read_dir(from).unwrap_or_else(|err| panic!("failed to list {from:?}: {err}"))
    {
        let entry = entry.expect("dir entry");
        let target = to.join(entry.file_name());
        if entry.file_type().expect("file type").is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target)
                .unwrap_or_else(|err| panic!("failed to copy {:?}: {err}", entry.path()));
        }
    }
}

/// A scratch copy of the `search_skill` fixture folder; returns the skill file path.
fn seeded_skill(dir: &Path) -> PathBuf {
    let root = dir.join("search_skill");
    copy_dir(&fixtures_dir().join("search_skill"), &root);
    root.join("diagram_dir").join("search_skill.json")
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"));
    serde_json::from_str(&text).unwrap_or_else(|err| panic!("{path:?} is not JSON: {err}"))
}

fn fs_loader() -> SkillLoader {
    let store: Arc<dyn FileStore> = Arc::new(FsStore::new());
    SkillLoader::new(store, &EditorConfig::default())
}

fn id(raw: &str) -> SheetId {
    SheetId::new(raw).expect("valid sheet id")
}

#[test]
fn legacy_skill_folder_opens_migrated_and_repaired() {
    let dir = tempfile::tempdir().expect("tempdir");
    let skill_path = seeded_skill(dir.path());
    let bundle_path = skill_path.with_file_name("search_skill_bundle.json");
    let mut registry = SheetRegistry::new(&EditorConfig::default().registry);

    let (loaded, report) = fs_loader()
        .open_into(&mut registry, &skill_path, &LoadOptions::default())
        .expect("skill folder loads");

    assert_eq!(loaded.skill_name, "search");
    assert!(loaded.migrated);
    assert_eq!(loaded.bundle_path.as_deref(), Some(bundle_path.as_path()));
    match &loaded.persist {
        PersistOutcome::Written(paths) => assert_eq!(paths, &[skill_path.clone(), bundle_path.clone()]),
        other => panic!("expected both files to be written, got {other:?}"),
    }

    assert!(report.ok);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, IssueKind::InterfaceMismatch);
    assert!(report.warnings[0].message.contains("\"result\""));
    assert_eq!(report.call_graph["main"], vec!["lookup".to_owned()]);

    let order: Vec<&str> = registry.sheets_in_order().map(|sheet| sheet.sheet_id().as_str()).collect();
    assert_eq!(order, ["main", "lookup"]);
    assert_eq!(registry.main_sheet_id(), &id("main"));
    assert_eq!(registry.open_tabs(), &[id("main"), id("lookup")]);
    assert_eq!(registry.active_sheet_id(), Some(&id("lookup")));

    let main = registry.sheet(&id("main")).expect("main sheet");
    let call = main.document().node("call_1").expect("call node");
    assert_eq!(call.call_target(), Some("lookup"));
    assert_eq!(main.document().edges[2].source_port(), Some("else_missing"));
}

#[test]
fn written_files_are_sanitized_and_current() {
    let dir = tempfile::tempdir().expect("tempdir");
    let skill_path = seeded_skill(dir.path());
    let bundle_path = skill_path.with_file_name("search_skill_bundle.json");

    let loaded = fs_loader()
        .load_skill_file(&skill_path, &LoadOptions::default())
        .expect("skill loads");
    assert!(loaded.persist.persisted());

    let skill = read_json(&skill_path);
    assert_eq!(skill["schemaVersion"], CURRENT_SCHEMA_VERSION);
    assert_eq!(skill["version"], "0.4.0");
    let llm = &skill["workFlow"]["nodes"][1]["data"];
    assert_eq!(llm["inputsValues"]["apiKey"]["content"], "");
    assert_eq!(llm["inputsValues"]["apiKey"]["type"], "constant");
    assert_eq!(llm["inputsValues"]["model"]["content"], "gpt-4o-mini");
    assert!(llm.get("state").is_none());
    assert_eq!(skill["workFlow"]["edges"][2]["sourcePortID"], "if_hits");
    assert_eq!(skill["workFlow"]["edges"][3]["sourcePortID"], "else_empty");

    let bundle = read_json(&bundle_path);
    assert!(bundle["sheets"].is_array(), "bundle is rewritten in canonical shape");
    assert_eq!(bundle["schemaVersion"], CURRENT_SCHEMA_VERSION);
    assert_eq!(bundle["sheets"][0]["id"], "main");
    assert_eq!(bundle["sheets"][0]["createdAt"], 1_732_093_100_000_i64);
}

#[test]
fn second_load_finds_nothing_to_migrate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let skill_path = seeded_skill(dir.path());
    let loader = fs_loader();

    let first = loader
        .load_skill_file(&skill_path, &LoadOptions::default())
        .expect("first load");
    let second = loader
        .load_skill_file(&skill_path, &LoadOptions::default())
        .expect("second load");

    assert!(first.migrated);
    assert!(!second.migrated);
    assert!(matches!(second.persist, PersistOutcome::NotNeeded));
    assert_eq!(first.bundle, second.bundle);
}

#[test]
fn registry_snapshot_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let skill_path = seeded_skill(dir.path());
    let loader = fs_loader();
    let mut registry = SheetRegistry::new(&EditorConfig::default().registry);
    loader
        .open_into(&mut registry, &skill_path, &LoadOptions::default())
        .expect("skill folder loads");

    let snapshot = registry.get_all_sheets();
    let exported = dir.path().join("export_bundle.json");
    fs::write(&exported, serialize_bundle(&snapshot).expect("encode")).expect("write export");

    let mut reopened = SheetRegistry::new(&EditorConfig::default().registry);
    let (loaded, _) = loader
        .open_into(&mut reopened, &exported, &LoadOptions::default())
        .expect("export reopens");

    assert!(!loaded.migrated);
    assert_eq!(reopened.get_all_sheets(), snapshot);
}
