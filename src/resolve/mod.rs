// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cross-sheet integrity checks for bundles.
//!
//! Validation runs before a bundle is trusted by the registry. Hard errors (structural
//! problems, a missing main sheet, calls that point nowhere) block loading; interface
//! mismatches and call cycles are only reported as warnings, since half-wired and
//! recursive sheets are legitimate while a workflow is being designed.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Bundle, BundleSheet, InterfaceSide, Node};

/// Minimum rapidfuzz ratio for a sheet to be offered as a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Skip validation entirely and report success.
    pub bypass: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Structural,
    DuplicateSheet,
    MissingMainSheet,
    UnresolvedReference,
    MissingTarget,
    InterfaceMismatch,
    Cycle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub level: Level,
    pub kind: IssueKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    fn new(level: Level, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            level,
            kind,
            message: message.into(),
            sheet_id: None,
            node_id: None,
            target: None,
            suggestion: None,
        }
    }

    fn at(mut self, sheet_id: &str, node_id: Option<&str>) -> Self {
        self.sheet_id = Some(sheet_id.to_owned());
        self.node_id = node_id.map(ToOwned::to_owned);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// Deduplicated sheet-to-sheet call adjacency, one key per known sheet.
    pub call_graph: BTreeMap<String, Vec<String>>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            call_graph: BTreeMap::new(),
        }
    }
}

impl ValidationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    fn error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    fn warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }
}

/// A call from one sheet to another that resolved to an existing sheet.
struct ResolvedCall<'a> {
    caller: &'a str,
    node: &'a Node,
    callee: &'a BundleSheet,
}

/// Validates `bundle` and builds its call graph.
pub fn validate_bundle(bundle: &Bundle, options: &ResolveOptions) -> ValidationReport {
    if options.bypass {
        tracing::debug!("bundle validation bypassed");
        return ValidationReport::default();
    }

    let mut report = ValidationReport::default();

    let directory = check_structure(bundle, &mut report);
    check_main_sheet(bundle, &directory, &mut report);

    let calls = resolve_calls(bundle, &directory, &mut report);
    report.call_graph = call_graph(&directory, &calls);
    check_interfaces(&calls, &mut report);

    if let Some(cycle) = find_cycle(&report.call_graph) {
        let issue = ValidationIssue::new(
            Level::Warning,
            IssueKind::Cycle,
            format!("call graph contains a cycle: {}", cycle.join(" -> ")),
        );
        report.warning(issue);
    }

    report.ok = report.errors.is_empty();
    tracing::debug!(
        ok = report.ok,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        sheets = bundle.sheets.len(),
        "validated bundle"
    );
    report
}

/// Indexes sheets by id, reporting blank and duplicate ids. The first sheet wins a duplicate.
fn check_structure<'a>(
    bundle: &'a Bundle,
    report: &mut ValidationReport,
) -> BTreeMap<&'a str, &'a BundleSheet> {
    if bundle.sheets.is_empty() {
        report.error(ValidationIssue::new(
            Level::Error,
            IssueKind::Structural,
            "bundle contains no sheets",
        ));
    }

    let mut directory: BTreeMap<&str, &BundleSheet> = BTreeMap::new();
    for (index, sheet) in bundle.sheets.iter().enumerate() {
        if sheet.id.trim().is_empty() {
            report.error(ValidationIssue::new(
                Level::Error,
                IssueKind::Structural,
                format!("sheet at position {index} ({:?}) has no id", sheet.name),
            ));
            continue;
        }
        match directory.entry(sheet.id.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(sheet);
            }
            Entry::Occupied(_) => report.error(
                ValidationIssue::new(
                    Level::Error,
                    IssueKind::DuplicateSheet,
                    format!("sheet id {:?} is used more than once", sheet.id),
                )
                .at(&sheet.id, None),
            ),
        }
    }

    directory
}

fn check_main_sheet(
    bundle: &Bundle,
    directory: &BTreeMap<&str, &BundleSheet>,
    report: &mut ValidationReport,
) {
    let main = bundle.main_sheet_id.trim();
    if main.is_empty() {
        report.error(ValidationIssue::new(
            Level::Error,
            IssueKind::MissingMainSheet,
            "bundle has no mainSheetId",
        ));
    } else if !directory.contains_key(bundle.main_sheet_id.as_str()) {
        let mut issue = ValidationIssue::new(
            Level::Error,
            IssueKind::MissingMainSheet,
            format!("main sheet {:?} does not exist", bundle.main_sheet_id),
        );
        issue.target = Some(bundle.main_sheet_id.clone());
        report.error(issue);
    }
}

fn resolve_calls<'a>(
    bundle: &'a Bundle,
    directory: &BTreeMap<&'a str, &'a BundleSheet>,
    report: &mut ValidationReport,
) -> Vec<ResolvedCall<'a>> {
    let mut calls = Vec::new();

    // Bundle order; blank ids and later duplicates have no directory entry of their own.
    for sheet in &bundle.sheets {
        let caller = sheet.id.as_str();
        if !directory
            .get(caller)
            .is_some_and(|indexed| std::ptr::eq(*indexed, sheet))
        {
            continue;
        }
        for node in sheet.document.call_nodes() {
            let Some(target) = node.call_target() else {
                report.error(
                    ValidationIssue::new(
                        Level::Error,
                        IssueKind::MissingTarget,
                        format!(
                            "call node {:?} in sheet {:?} has no target sheet",
                            node.id, caller
                        ),
                    )
                    .at(caller, Some(&node.id)),
                );
                continue;
            };

            match directory.get(target) {
                Some(&callee) => calls.push(ResolvedCall {
                    caller,
                    node,
                    callee,
                }),
                None => {
                    let needle = node.call_target_name().unwrap_or(target);
                    let suggestion = suggest_sheet(needle, bundle);
                    let mut message = format!(
                        "call node {:?} in sheet {:?} references missing sheet {:?}",
                        node.id, caller, target
                    );
                    if let Some(suggestion) = &suggestion {
                        message.push_str(&format!(" (did you mean {suggestion:?}?)"));
                    }
                    let mut issue =
                        ValidationIssue::new(Level::Error, IssueKind::UnresolvedReference, message)
                            .at(caller, Some(&node.id));
                    issue.target = Some(target.to_owned());
                    issue.suggestion = suggestion;
                    report.error(issue);
                }
            }
        }
    }

    calls
}

/// The sheet id whose name or id is closest to `needle`, if close enough.
fn suggest_sheet(needle: &str, bundle: &Bundle) -> Option<String> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    bundle
        .sheets
        .iter()
        .filter(|sheet| !sheet.id.trim().is_empty())
        .map(|sheet| {
            let by_name =
                rapidfuzz::fuzz::ratio(needle.chars(), sheet.name.trim().to_lowercase().chars());
            let by_id = rapidfuzz::fuzz::ratio(needle.chars(), sheet.id.to_lowercase().chars());
            (by_name.max(by_id), sheet)
        })
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, sheet)| sheet.id.clone())
}

fn call_graph(
    directory: &BTreeMap<&str, &BundleSheet>,
    calls: &[ResolvedCall<'_>],
) -> BTreeMap<String, Vec<String>> {
    let mut outgoing: BTreeMap<String, BTreeSet<String>> = directory
        .keys()
        .map(|id| ((*id).to_owned(), BTreeSet::new()))
        .collect();

    for call in calls {
        outgoing
            .entry(call.caller.to_owned())
            .or_default()
            .insert(call.callee.id.clone());
    }

    outgoing
        .into_iter()
        .map(|(sheet_id, callees)| (sheet_id, callees.into_iter().collect()))
        .collect()
}

fn check_interfaces(calls: &[ResolvedCall<'_>], report: &mut ValidationReport) {
    for call in calls {
        for side in [InterfaceSide::Inputs, InterfaceSide::Outputs] {
            for name in call.callee.document.interface_names(side) {
                if call.node.maps_interface(side, &name) {
                    continue;
                }
                let mut issue = ValidationIssue::new(
                    Level::Warning,
                    IssueKind::InterfaceMismatch,
                    format!(
                        "call node {:?} in sheet {:?} does not map {} {:?} of sheet {:?}",
                        call.node.id,
                        call.caller,
                        side.as_str(),
                        name,
                        call.callee.id
                    ),
                )
                .at(call.caller, Some(&call.node.id));
                issue.target = Some(call.callee.id.clone());
                report.warning(issue);
            }
        }
    }
}

/// Iterative depth-first search; returns the first cycle found as a closed path
/// (`a -> b -> a`).
///
/// Each frame is a sheet plus the index of its next callee. `on_path` mirrors `path` so the
/// back-edge test stays logarithmic on long call chains.
fn find_cycle(graph: &BTreeMap<String, Vec<String>>) -> Option<Vec<String>> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();

    for root in graph.keys() {
        let root = root.as_str();
        if !visited.insert(root) {
            continue;
        }

        let mut frames: Vec<(&str, usize)> = vec![(root, 0)];
        let mut path: Vec<&str> = vec![root];
        let mut on_path: BTreeSet<&str> = BTreeSet::from([root]);

        while let Some(frame) = frames.last_mut() {
            let (node, cursor) = *frame;
            frame.1 += 1;

            let Some(next) = graph.get(node).and_then(|callees| callees.get(cursor)) else {
                on_path.remove(node);
                path.pop();
                frames.pop();
                continue;
            };
            let next = next.as_str();

            if on_path.contains(next) {
                let start = path.iter().position(|id| *id == next).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[start..].iter().map(|id| (*id).to_owned()).collect();
                cycle.push(next.to_owned());
                return Some(cycle);
            }
            if visited.insert(next) {
                on_path.insert(next);
                path.push(next);
                frames.push((next, 0));
            }
        }
    }
    None
}
