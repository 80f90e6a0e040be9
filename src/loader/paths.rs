// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};

/// Skill files live in `<name>_skill/diagram_dir/<name>_skill.json`.
const DIAGRAM_DIR: &str = "diagram_dir";

const BUNDLE_SUFFIXES: [&str; 2] = ["_bundle", "-bundle"];

fn strip_skill_suffixes(stem: &str) -> &str {
    let stem = BUNDLE_SUFFIXES
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(stem);
    stem.strip_suffix("_skill")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(stem)
}

/// The skill name a file belongs to.
///
/// The folder convention wins: for `.../<name>_skill/diagram_dir/<file>.json` it is
/// `<name>`. Otherwise the file stem with `_skill` and bundle suffixes removed.
pub fn skill_name_from_path(path: &Path) -> String {
    let parent = path.parent();
    let in_diagram_dir = parent
        .and_then(Path::file_name)
        .is_some_and(|name| name == DIAGRAM_DIR);
    if in_diagram_dir {
        let skill_dir = parent
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .and_then(|name| name.to_str());
        if let Some(name) = skill_dir.and_then(|dir| dir.strip_suffix("_skill")) {
            if !name.is_empty() {
                return name.to_owned();
            }
        }
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_skill_suffixes(&stem).to_owned()
}

/// Where a bundle belonging to the skill file at `path` may live, in probe order.
pub fn sibling_bundle_paths(path: &Path) -> Vec<PathBuf> {
    let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
        return Vec::new();
    };
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    vec![
        dir.join(format!("{stem}_bundle.json")),
        dir.join(format!("{stem}-bundle.json")),
    ]
}
