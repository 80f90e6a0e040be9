// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Loading skill and bundle files from disk.
//!
//! A load reads one `.json` file, decides whether it is a bundle or a single-skill
//! document, picks up a sibling bundle for single documents, migrates whatever it found to
//! the current schema and writes migrated files back. The write-back is best effort: its
//! result is reported in [`LoadResult::persist`] and never fails the load.

mod paths;
mod sanitize;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::EditorConfig;
use crate::format::bundle::{classify_file, normalize_bundle, to_file_json, FileShape, ShapeError};
use crate::migrate::SchemaMigrator;
use crate::model::{Bundle, BundleSheet, Document, SkillDocument, MAIN_SHEET_ID};
use crate::registry::{RegistryError, SheetRegistry, MAIN_SHEET_NAME};
use crate::resolve::ValidationReport;
use crate::store::{FileStore, SaveScheduler, StoreError};

pub use paths::{sibling_bundle_paths, skill_name_from_path};
pub use sanitize::{sanitize_credentials, SanitizeReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Overrides the configured write-back of migrated files.
    pub auto_save: Option<bool>,
    /// Look for `<stem>_bundle.json` / `<stem>-bundle.json` next to single-skill files.
    pub probe_sibling_bundle: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            auto_save: None,
            probe_sibling_bundle: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
    #[error("{} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} is neither a bundle nor a skill document: {source}", path.display())]
    Structural {
        path: PathBuf,
        #[source]
        source: ShapeError,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode migrated file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What happened to the migrated files after a load.
#[derive(Debug)]
pub enum PersistOutcome {
    /// Nothing was migrated.
    NotNeeded,
    /// Something was migrated but write-back is switched off.
    Disabled,
    Written(Vec<PathBuf>),
    /// Handed to the save scheduler; failures show up in
    /// [`SaveScheduler::take_failures`].
    Scheduled(Vec<PathBuf>),
    /// The first write that failed. Remaining writes were still attempted.
    Failed { path: PathBuf, error: PersistError },
}

impl PersistOutcome {
    /// True unless a write-back was attempted and failed.
    pub fn persisted(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn error(&self) -> Option<&PersistError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct LoadResult {
    /// The skill descriptor. When a bundle was found its workflow is the bundle's main
    /// sheet; for a bundle-only file it is synthesized.
    pub skill: SkillDocument,
    pub bundle: Option<Bundle>,
    pub skill_name: String,
    pub skill_path: PathBuf,
    pub bundle_path: Option<PathBuf>,
    pub migrated: bool,
    pub persist: PersistOutcome,
}

type PendingWrite = (PathBuf, Result<String, serde_json::Error>);

pub struct SkillLoader {
    store: Arc<dyn FileStore>,
    migrator: SchemaMigrator,
    auto_save: bool,
    scheduler: Option<SaveScheduler>,
}

impl std::fmt::Debug for SkillLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillLoader")
            .field("migrator", &self.migrator)
            .field("auto_save", &self.auto_save)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl SkillLoader {
    pub fn new(store: Arc<dyn FileStore>, config: &EditorConfig) -> Self {
        Self {
            store,
            migrator: SchemaMigrator::builtin(),
            auto_save: config.persistence.auto_save_migrations,
            scheduler: None,
        }
    }

    /// Like [`SkillLoader::new`], but write-back goes through a [`SaveScheduler`] whenever
    /// `persistence.debounce_ms` is non-zero.
    pub fn from_config(
        store: Arc<dyn FileStore>,
        config: &EditorConfig,
    ) -> Result<Self, StoreError> {
        let loader = Self::new(store.clone(), config);
        if config.persistence.debounce_ms == 0 {
            return Ok(loader);
        }
        let scheduler = SaveScheduler::new(store, config.persistence.debounce())?;
        Ok(loader.with_scheduler(scheduler))
    }

    pub fn with_migrator(mut self, migrator: SchemaMigrator) -> Self {
        self.migrator = migrator;
        self
    }

    /// Routes write-back through `scheduler` instead of writing before `load_skill_file`
    /// returns.
    pub fn with_scheduler(mut self, scheduler: SaveScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn scheduler(&self) -> Option<&SaveScheduler> {
        self.scheduler.as_ref()
    }

    pub fn migrator(&self) -> &SchemaMigrator {
        &self.migrator
    }

    pub fn load_skill_file(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<LoadResult, LoadError> {
        let auto_save = options.auto_save.unwrap_or(self.auto_save);
        let raw = self.read_json(path)?;
        let skill_name = skill_name_from_path(path);
        let shape = classify_file(&raw).map_err(|source| LoadError::Structural {
            path: path.to_path_buf(),
            source,
        })?;

        let mut migrated = false;
        let mut pending: Vec<PendingWrite> = Vec::new();

        let (skill, bundle, bundle_path) = match shape {
            FileShape::Bundle(mut bundle) => {
                let outcome = self.migrator.migrate_bundle(&mut bundle);
                if outcome.sheets_with_failures > 0 {
                    tracing::warn!(
                        path = %path.display(),
                        sheets = outcome.sheets_with_failures,
                        "some migration steps failed and were skipped"
                    );
                }
                if outcome.any_migrated() {
                    migrated = true;
                    if auto_save {
                        pending.push((path.to_path_buf(), encode_for_disk(&bundle)));
                    }
                }

                let work_flow = bundle
                    .main_sheet()
                    .or_else(|| bundle.sheets.first())
                    .map(|sheet| sheet.document.clone())
                    .unwrap_or_else(Document::blank);
                let skill = SkillDocument::synthesized(skill_name.clone(), work_flow);
                (skill, Some(bundle), Some(path.to_path_buf()))
            }
            FileShape::Skill(mut skill) => {
                let sibling = if options.probe_sibling_bundle {
                    self.probe_sibling_bundle(path)
                } else {
                    None
                };

                if self.migrator.migrate_skill(&mut skill).migrated {
                    migrated = true;
                    if auto_save {
                        pending.push((path.to_path_buf(), encode_for_disk(&skill)));
                    }
                }

                match sibling {
                    Some((bundle_path, mut bundle)) => {
                        let outcome = self.migrator.migrate_bundle(&mut bundle);
                        if outcome.any_migrated() {
                            migrated = true;
                            if auto_save {
                                pending.push((bundle_path.clone(), encode_for_disk(&bundle)));
                            }
                        }
                        // The bundle is authoritative; the skill only mirrors its main sheet.
                        if let Some(main) = bundle.main_sheet() {
                            skill.work_flow = main.document.clone();
                        }
                        (skill, Some(bundle), Some(bundle_path))
                    }
                    None => (skill, None, None),
                }
            }
        };

        let persist = if !migrated {
            PersistOutcome::NotNeeded
        } else if !auto_save {
            tracing::debug!(path = %path.display(), "migrated in memory only; write-back disabled");
            PersistOutcome::Disabled
        } else {
            self.persist(pending)
        };

        tracing::info!(
            path = %path.display(),
            skill = %skill_name,
            bundle = bundle.is_some(),
            migrated,
            "loaded skill file"
        );

        Ok(LoadResult {
            skill,
            bundle,
            skill_name,
            skill_path: path.to_path_buf(),
            bundle_path,
            migrated,
            persist,
        })
    }

    /// Loads `path` and replaces the contents of `registry` with it.
    ///
    /// A single-skill file without a bundle becomes a one-sheet bundle whose main sheet
    /// holds the skill's workflow. On any error the registry is left untouched.
    pub fn open_into(
        &self,
        registry: &mut SheetRegistry,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<(LoadResult, ValidationReport), LoadError> {
        let loaded = self.load_skill_file(path, options)?;
        let bundle = loaded
            .bundle
            .clone()
            .unwrap_or_else(|| single_sheet_bundle(&loaded.skill));
        let report = registry.load_bundle(bundle)?;
        Ok((loaded, report))
    }

    fn read_text(&self, path: &Path) -> Result<String, StoreError> {
        let err = match self.store.read(path) {
            Ok(text) => return Ok(text),
            Err(err) if err.is_not_found() => return Err(err),
            Err(err) => err,
        };

        match self.store.read_legacy(path) {
            Some(Ok(text)) => {
                tracing::warn!(path = %path.display(), error = %err, "read file with legacy decoding");
                Ok(text)
            }
            Some(Err(legacy)) => {
                tracing::debug!(path = %path.display(), error = %legacy, "legacy read failed too");
                Err(err)
            }
            None => Err(err),
        }
    }

    fn read_json(&self, path: &Path) -> Result<Value, LoadError> {
        let text = self.read_text(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(|source| {
            LoadError::Json {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// First sibling path holding a recognizable, non-empty bundle.
    fn probe_sibling_bundle(&self, path: &Path) -> Option<(PathBuf, Bundle)> {
        for candidate in sibling_bundle_paths(path) {
            let text = match self.read_text(&candidate) {
                Ok(text) => text,
                Err(err) => {
                    if !err.is_not_found() {
                        tracing::debug!(path = %candidate.display(), error = %err, "skipping unreadable sibling bundle");
                    }
                    continue;
                }
            };
            let raw: Value = match serde_json::from_str(text.trim_start_matches('\u{feff}')) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(path = %candidate.display(), error = %err, "sibling bundle is not valid JSON");
                    continue;
                }
            };
            match normalize_bundle(&raw) {
                Some(bundle) => return Some((candidate, bundle)),
                None => {
                    tracing::warn!(path = %candidate.display(), "sibling file is not a bundle");
                }
            }
        }
        None
    }

    fn persist(&self, pending: Vec<PendingWrite>) -> PersistOutcome {
        let mut written = Vec::with_capacity(pending.len());
        let mut failure: Option<(PathBuf, PersistError)> = None;

        for (path, contents) in pending {
            let contents = match contents {
                Ok(contents) => contents,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "could not encode migrated file");
                    if failure.is_none() {
                        failure = Some((path, PersistError::Encode(err)));
                    }
                    continue;
                }
            };

            if let Some(scheduler) = &self.scheduler {
                scheduler.schedule(path.clone(), contents);
                written.push(path);
                continue;
            }

            match self.store.write(&path, &contents) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "wrote migrated file");
                    written.push(path);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "could not write migrated file");
                    if failure.is_none() {
                        failure = Some((path, PersistError::Store(err)));
                    }
                }
            }
        }

        match failure {
            Some((path, error)) => PersistOutcome::Failed { path, error },
            None if self.scheduler.is_some() => PersistOutcome::Scheduled(written),
            None => PersistOutcome::Written(written),
        }
    }
}

/// On-disk JSON with credentials blanked and runtime state dropped.
fn encode_for_disk<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(value)?;
    let scrubbed = sanitize_credentials(&mut value);
    if scrubbed.blanked_values > 0 {
        tracing::debug!(blanked = scrubbed.blanked_values, "blanked credential values before write");
    }
    to_file_json(&value)
}

fn single_sheet_bundle(skill: &SkillDocument) -> Bundle {
    Bundle {
        main_sheet_id: MAIN_SHEET_ID.to_owned(),
        sheets: vec![BundleSheet {
            id: MAIN_SHEET_ID.to_owned(),
            name: MAIN_SHEET_NAME.to_owned(),
            document: skill.work_flow.clone(),
            ..BundleSheet::default()
        }],
        open_tabs: vec![MAIN_SHEET_ID.to_owned()],
        active_sheet_id: Some(MAIN_SHEET_ID.to_owned()),
        schema_version: skill.schema_version.clone(),
    }
}
