// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Schema migrations for workflow documents.
//!
//! `schemaVersion` tracks the structure of the workflow data (port id format, node data
//! layout, edge format). It is unrelated to the user-facing skill `version`.
//!
//! Version history:
//!
//! - `1.0.0`: condition node edges use the fixed ports `if_out` / `else_out`; files carry
//!   no version field.
//! - `1.0.1`: condition node edges use the per-branch keys (`if_xxxxx`, `else_yyyyy`) from
//!   the node's branch list; files carry `schemaVersion`.
//!
//! A breaking data change bumps [`CURRENT_SCHEMA_VERSION`] and appends a [`Migration`] to
//! the table in this module.

mod condition_edges;
mod version;

use serde::Serialize;

use crate::model::{Bundle, Document, SkillDocument};

pub use version::{ParseSchemaVersionError, SchemaVersion};

/// The version every migrated document is stamped with.
pub const CURRENT_SCHEMA_VERSION: &str = "1.0.1";

/// Oldest version the migration table knows how to upgrade.
pub const MIN_SUPPORTED_SCHEMA_VERSION: &str = "1.0.0";

/// Source port ids that only exist in pre-1.0.1 documents.
const LEGACY_CONDITION_PORTS: [&str; 2] = ["if_out", "else_out"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("node {node_id:?}: {reason}")]
    Node { node_id: String, reason: String },
    #[error("{0}")]
    Other(String),
}

/// A document transform from one schema version to the next.
pub type MigrationFn = fn(&Document) -> Result<Document, MigrationError>;

#[derive(Clone)]
pub struct Migration {
    pub from: &'static str,
    pub to: &'static str,
    pub description: &'static str,
    pub transform: MigrationFn,
    pub added_date: &'static str,
    /// Date after which no supported file should still need this step.
    pub can_remove_after: Option<&'static str>,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("description", &self.description)
            .field("added_date", &self.added_date)
            .field("can_remove_after", &self.can_remove_after)
            .finish_non_exhaustive()
    }
}

const MIGRATIONS: &[Migration] = &[Migration {
    from: "1.0.0",
    to: "1.0.1",
    description: "Convert condition node edges from if_out/else_out to dynamic condition keys",
    transform: condition_edges::condition_edges_v1_0_0_to_v1_0_1,
    added_date: "2025-12-06",
    can_remove_after: Some("2026-06-01"),
}];

/// A migration step that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub description: &'static str,
    pub error: MigrationError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub migrated: bool,
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub failures: Vec<StepFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BundleMigrationOutcome {
    pub migrated_count: usize,
    pub total_sheets: usize,
    /// Sheets where at least one step failed and was skipped.
    pub sheets_with_failures: usize,
}

impl BundleMigrationOutcome {
    pub fn any_migrated(&self) -> bool {
        self.migrated_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub from: String,
    pub to: String,
    pub description: String,
    pub added_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_remove_after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub current_schema_version: String,
    pub min_supported_version: String,
    pub migrations: Vec<MigrationSummary>,
}

/// Ordered table of migrations plus the version they converge on.
#[derive(Debug, Clone)]
pub struct SchemaMigrator {
    current: SchemaVersion,
    min_supported: SchemaVersion,
    migrations: Vec<(SchemaVersion, SchemaVersion, Migration)>,
}

impl Default for SchemaMigrator {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaMigrator {
    /// The migrator for this build's schema.
    pub fn builtin() -> Self {
        Self::new(
            SchemaVersion::current(),
            SchemaVersion::min_supported(),
            MIGRATIONS.to_vec(),
        )
    }

    /// A migrator over a custom table; entries with unparsable versions are dropped.
    pub fn new(
        current: SchemaVersion,
        min_supported: SchemaVersion,
        migrations: Vec<Migration>,
    ) -> Self {
        let mut table: Vec<_> = migrations
            .into_iter()
            .filter_map(|migration| {
                let from = SchemaVersion::parse(migration.from);
                let to = SchemaVersion::parse(migration.to);
                match (from, to) {
                    (Some(from), Some(to)) => Some((from, to, migration)),
                    _ => {
                        tracing::error!(
                            from = migration.from,
                            to = migration.to,
                            "ignoring migration with unparsable version range"
                        );
                        None
                    }
                }
            })
            .collect();
        table.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        Self {
            current,
            min_supported,
            migrations: table,
        }
    }

    pub fn current(&self) -> &SchemaVersion {
        &self.current
    }

    /// The schema version a document claims or, failing that, appears to have.
    ///
    /// Order: `schemaVersion`, then the deprecated `dataVersion`, then structural inference
    /// (legacy condition ports mean `1.0.0`). Documents with no markers are new and thus
    /// current.
    pub fn schema_version_of(&self, document: &Document) -> SchemaVersion {
        if let Some(version) = declared_version(document) {
            return version;
        }

        let has_legacy_ports = document.edges.iter().any(|edge| {
            edge.source_port()
                .is_some_and(|port| LEGACY_CONDITION_PORTS.contains(&port))
        });
        if has_legacy_ports {
            return self.min_supported.clone();
        }

        self.current.clone()
    }

    /// Upgrades `document` to the current schema version.
    ///
    /// A document already at (or past) the current version is left untouched. Otherwise every
    /// applicable step runs in ascending version order; a failing step is logged and skipped
    /// and later steps still run. The result is stamped current either way.
    pub fn migrate_document(&self, document: &mut Document) -> MigrationOutcome {
        let from = self.schema_version_of(document);
        self.migrate_from(document, from)
    }

    fn migrate_from(&self, document: &mut Document, from: SchemaVersion) -> MigrationOutcome {
        if from >= self.current {
            return MigrationOutcome {
                migrated: false,
                from,
                to: self.current.clone(),
                failures: Vec::new(),
            };
        }

        if from < self.min_supported {
            tracing::warn!(
                %from,
                min_supported = %self.min_supported,
                "schema version is older than the oldest supported version"
            );
        }

        tracing::info!(%from, to = %self.current, "migrating document");

        let mut working = std::mem::take(document);
        let mut at = from.clone();
        let mut failures = Vec::new();

        for (step_from, step_to, migration) in self.applicable(&from) {
            if at > *step_from {
                continue;
            }
            tracing::debug!(description = migration.description, "applying migration");
            match (migration.transform)(&working) {
                Ok(next) => {
                    working = next;
                    at = step_to.clone();
                }
                Err(error) => {
                    tracing::warn!(
                        description = migration.description,
                        %error,
                        "migration step failed; continuing with later steps"
                    );
                    failures.push(StepFailure {
                        description: migration.description,
                        error,
                    });
                }
            }
        }

        working.schema_version = Some(self.current.to_string());
        *document = working;

        MigrationOutcome {
            migrated: true,
            from,
            to: self.current.clone(),
            failures,
        }
    }

    fn applicable<'a>(
        &'a self,
        from: &'a SchemaVersion,
    ) -> impl Iterator<Item = &'a (SchemaVersion, SchemaVersion, Migration)> + 'a {
        self.migrations
            .iter()
            .filter(move |(step_from, step_to, _)| step_from >= from && *step_to <= self.current)
    }

    /// Migrates every sheet's document and stamps the bundle itself.
    pub fn migrate_bundle(&self, bundle: &mut Bundle) -> BundleMigrationOutcome {
        let mut outcome = BundleMigrationOutcome {
            total_sheets: bundle.sheets.len(),
            ..BundleMigrationOutcome::default()
        };

        for sheet in &mut bundle.sheets {
            let sheet_outcome = self.migrate_document(&mut sheet.document);
            if sheet_outcome.migrated {
                outcome.migrated_count += 1;
            }
            if !sheet_outcome.failures.is_empty() {
                outcome.sheets_with_failures += 1;
            }
        }

        let bundle_version = bundle
            .schema_version
            .as_deref()
            .and_then(SchemaVersion::parse);
        if bundle_version.map_or(true, |version| version < self.current) {
            bundle.schema_version = Some(self.current.to_string());
        }

        outcome
    }

    /// Migrates a single-skill document.
    ///
    /// The skill header's `schemaVersion` wins over anything found inside the workflow.
    pub fn migrate_skill(&self, skill: &mut SkillDocument) -> MigrationOutcome {
        let from = skill
            .schema_version
            .as_deref()
            .and_then(SchemaVersion::parse)
            .unwrap_or_else(|| self.schema_version_of(&skill.work_flow));

        let outcome = self.migrate_from(&mut skill.work_flow, from);
        if outcome.migrated {
            skill.schema_version = Some(self.current.to_string());
        }
        outcome
    }

    pub fn report(&self) -> MigrationReport {
        MigrationReport {
            current_schema_version: self.current.to_string(),
            min_supported_version: self.min_supported.to_string(),
            migrations: self
                .migrations
                .iter()
                .map(|(from, to, migration)| MigrationSummary {
                    from: from.to_string(),
                    to: to.to_string(),
                    description: migration.description.to_owned(),
                    added_date: migration.added_date.to_owned(),
                    can_remove_after: migration.can_remove_after.map(ToOwned::to_owned),
                })
                .collect(),
        }
    }
}

fn declared_version(document: &Document) -> Option<SchemaVersion> {
    [&document.schema_version, &document.data_version]
        .into_iter()
        .flatten()
        .find_map(|raw| {
            let parsed = SchemaVersion::parse(raw);
            if parsed.is_none() {
                tracing::debug!(raw = %raw, "ignoring unparsable schema version field");
            }
            parsed
        })
}
