// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The live set of sheets an editor session works on.
//!
//! The registry is the system of record while the editor is open; bundles are only
//! import/export snapshots. Besides the sheets themselves it owns tab order, the active
//! sheet and per-sheet view state, because all of that is saved and restored with them.

use std::collections::BTreeMap;

use crate::config::RegistryConfig;
use crate::format::bundle::repair_references;
use crate::migrate::CURRENT_SCHEMA_VERSION;
use crate::model::{now_millis, Bundle, Document, IdError, Sheet, SheetId, SheetView};
use crate::resolve::{validate_bundle, ResolveOptions, ValidationReport};

pub(crate) const MAIN_SHEET_NAME: &str = "Main";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown sheet {0}")]
    UnknownSheet(SheetId),
    #[error("sheet {0} is the main sheet and cannot be deleted")]
    ProtectedSheet(SheetId),
    #[error("no sheet is active")]
    NoActiveSheet,
    #[error("bundle failed validation with {} error(s)", .0.errors.len())]
    Invalid(Box<ValidationReport>),
    #[error("bundle contains no usable sheets")]
    EmptyBundle,
    #[error("invalid sheet id {id:?}: {source}")]
    InvalidId {
        id: String,
        #[source]
        source: IdError,
    },
}

impl RegistryError {
    /// The validation report behind an [`RegistryError::Invalid`] rejection.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Invalid(report) => Some(&**report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetRegistry {
    sheets: BTreeMap<SheetId, Sheet>,
    /// Creation order.
    order: Vec<SheetId>,
    /// Tab strip order; also the eviction order (oldest first).
    open_tabs: Vec<SheetId>,
    /// Open tabs by recency of opening, most recent last.
    recent: Vec<SheetId>,
    active: Option<SheetId>,
    main: SheetId,
    max_open_tabs: usize,
    resolve_options: ResolveOptions,
}

impl SheetRegistry {
    /// A registry holding only the protected, blank main sheet, open and active.
    pub fn new(config: &RegistryConfig) -> Self {
        let main = SheetId::main();
        let sheet = Sheet::new(main.clone(), MAIN_SHEET_NAME, Document::blank(), now_millis());

        Self {
            sheets: BTreeMap::from([(main.clone(), sheet)]),
            order: vec![main.clone()],
            open_tabs: vec![main.clone()],
            recent: vec![main.clone()],
            active: Some(main.clone()),
            main,
            max_open_tabs: config.max_open_tabs.max(1),
            resolve_options: ResolveOptions::default(),
        }
    }

    pub fn with_resolve_options(mut self, options: ResolveOptions) -> Self {
        self.resolve_options = options;
        self
    }

    pub fn max_open_tabs(&self) -> usize {
        self.max_open_tabs
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn sheet(&self, sheet_id: &SheetId) -> Option<&Sheet> {
        self.sheets.get(sheet_id)
    }

    pub fn contains(&self, sheet_id: &SheetId) -> bool {
        self.sheets.contains_key(sheet_id)
    }

    pub fn sheets_in_order(&self) -> impl Iterator<Item = &Sheet> + '_ {
        self.order.iter().filter_map(|id| self.sheets.get(id))
    }

    pub fn open_tabs(&self) -> &[SheetId] {
        &self.open_tabs
    }

    pub fn active_sheet_id(&self) -> Option<&SheetId> {
        self.active.as_ref()
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.active.as_ref().and_then(|id| self.sheets.get(id))
    }

    pub fn main_sheet_id(&self) -> &SheetId {
        &self.main
    }

    fn sheet_mut(&mut self, sheet_id: &SheetId) -> Result<&mut Sheet, RegistryError> {
        self.sheets
            .get_mut(sheet_id)
            .ok_or_else(|| RegistryError::UnknownSheet(sheet_id.clone()))
    }

    fn next_default_name(&self) -> String {
        let mut n = self.order.len() + 1;
        loop {
            let candidate = format!("Sheet {n}");
            if !self.sheets.values().any(|sheet| sheet.name() == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Creates a sheet from a copy of `initial` (or the blank template) and returns its id.
    ///
    /// The new sheet is not opened.
    pub fn new_sheet(&mut self, name: Option<&str>, initial: Option<&Document>) -> SheetId {
        let mut sheet_id = SheetId::generate();
        while self.sheets.contains_key(&sheet_id) {
            sheet_id = SheetId::generate();
        }

        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| self.next_default_name());
        let document = initial.cloned().unwrap_or_else(Document::blank);

        let sheet = Sheet::new(sheet_id.clone(), name, document, now_millis());
        self.sheets.insert(sheet_id.clone(), sheet);
        self.order.push(sheet_id.clone());
        tracing::debug!(sheet_id = %sheet_id, "created sheet");
        sheet_id
    }

    /// Opens `sheet_id` in a tab and makes it active.
    ///
    /// When this pushes the tab count over the limit, the oldest tabs other than this one are
    /// closed.
    pub fn open_sheet(&mut self, sheet_id: &SheetId) -> Result<(), RegistryError> {
        self.sheet_mut(sheet_id)?.touch_opened(now_millis());

        if !self.open_tabs.contains(sheet_id) {
            self.open_tabs.push(sheet_id.clone());
        }
        self.recent.retain(|id| id != sheet_id);
        self.recent.push(sheet_id.clone());
        self.active = Some(sheet_id.clone());

        while self.open_tabs.len() > self.max_open_tabs {
            let Some(position) = self.open_tabs.iter().position(|id| id != sheet_id) else {
                break;
            };
            let evicted = self.open_tabs.remove(position);
            self.recent.retain(|id| id != &evicted);
            tracing::debug!(sheet_id = %evicted, "evicted tab");
        }

        Ok(())
    }

    /// Closes the tab of `sheet_id`; the sheet itself stays.
    ///
    /// Closing the active tab activates the most recently opened remaining tab, if any.
    pub fn close_sheet(&mut self, sheet_id: &SheetId) -> Result<(), RegistryError> {
        if !self.contains(sheet_id) {
            return Err(RegistryError::UnknownSheet(sheet_id.clone()));
        }
        self.drop_tab(sheet_id);
        Ok(())
    }

    fn drop_tab(&mut self, sheet_id: &SheetId) {
        self.open_tabs.retain(|id| id != sheet_id);
        self.recent.retain(|id| id != sheet_id);
        if self.active.as_ref() == Some(sheet_id) {
            self.active = self.recent.last().cloned();
        }
    }

    /// Removes `sheet_id` entirely. The main sheet is protected and cannot be deleted.
    pub fn delete_sheet(&mut self, sheet_id: &SheetId) -> Result<(), RegistryError> {
        if sheet_id == &self.main {
            return Err(RegistryError::ProtectedSheet(sheet_id.clone()));
        }
        if self.sheets.remove(sheet_id).is_none() {
            return Err(RegistryError::UnknownSheet(sheet_id.clone()));
        }
        self.order.retain(|id| id != sheet_id);
        self.drop_tab(sheet_id);
        tracing::debug!(sheet_id = %sheet_id, "deleted sheet");
        Ok(())
    }

    pub fn rename_sheet(&mut self, sheet_id: &SheetId, name: &str) -> Result<(), RegistryError> {
        self.sheet_mut(sheet_id)?.set_name(name.trim());
        Ok(())
    }

    /// Makes `sheet_id` active, opening a tab for it if needed.
    pub fn set_active_sheet(&mut self, sheet_id: &SheetId) -> Result<(), RegistryError> {
        self.open_sheet(sheet_id)
    }

    pub fn set_view(
        &mut self,
        sheet_id: &SheetId,
        view: Option<SheetView>,
    ) -> Result<(), RegistryError> {
        self.sheet_mut(sheet_id)?.set_view(view);
        Ok(())
    }

    pub fn set_selection(
        &mut self,
        sheet_id: &SheetId,
        selection_ids: Vec<String>,
    ) -> Result<(), RegistryError> {
        self.sheet_mut(sheet_id)?.set_selection_ids(selection_ids);
        Ok(())
    }

    /// Replaces the document of `sheet_id` wholesale. Last write wins.
    pub fn save_document_for(
        &mut self,
        sheet_id: &SheetId,
        document: Document,
    ) -> Result<(), RegistryError> {
        self.sheet_mut(sheet_id)?.replace_document(document);
        Ok(())
    }

    pub fn save_active_document(&mut self, document: Document) -> Result<(), RegistryError> {
        let active = self.active.clone().ok_or(RegistryError::NoActiveSheet)?;
        self.save_document_for(&active, document)
    }

    /// Resets the active sheet to the blank template.
    pub fn clear_active_sheet(&mut self) -> Result<(), RegistryError> {
        self.save_active_document(Document::blank())
    }

    /// Snapshot of the whole registry in creation order, stamped with the current schema.
    pub fn get_all_sheets(&self) -> Bundle {
        Bundle {
            main_sheet_id: self.main.to_string(),
            sheets: self
                .sheets_in_order()
                .map(Sheet::to_bundle_sheet)
                .collect(),
            open_tabs: self.open_tabs.iter().map(ToString::to_string).collect(),
            active_sheet_id: self.active.as_ref().map(ToString::to_string),
            schema_version: Some(CURRENT_SCHEMA_VERSION.to_owned()),
        }
    }

    /// Replaces the whole registry with `bundle`.
    ///
    /// Call targets are repaired first, then the bundle is validated. On hard errors the
    /// registry is left exactly as it was and the report comes back inside
    /// [`RegistryError::Invalid`]; otherwise the returned report carries any warnings.
    pub fn load_bundle(&mut self, mut bundle: Bundle) -> Result<ValidationReport, RegistryError> {
        let repairs = repair_references(&mut bundle);
        if !repairs.repaired.is_empty() {
            tracing::info!(repaired = repairs.repaired.len(), "repaired call targets");
        }

        let report = validate_bundle(&bundle, &self.resolve_options);
        if !report.ok {
            tracing::warn!(
                errors = report.errors.len(),
                "rejecting bundle that failed validation"
            );
            return Err(RegistryError::Invalid(Box::new(report)));
        }

        let next = self.state_from_bundle(bundle)?;
        *self = next;
        tracing::info!(
            sheets = self.order.len(),
            warnings = report.warnings.len(),
            "loaded bundle"
        );
        Ok(report)
    }

    fn state_from_bundle(&self, bundle: Bundle) -> Result<Self, RegistryError> {
        let now = now_millis();
        let mut sheets = BTreeMap::new();
        let mut order = Vec::with_capacity(bundle.sheets.len());

        for wire in bundle.sheets {
            let sheet_id = SheetId::new(wire.id.clone()).map_err(|source| {
                RegistryError::InvalidId {
                    id: wire.id.clone(),
                    source,
                }
            })?;
            if sheets.contains_key(&sheet_id) {
                // Only reachable with validation bypassed.
                tracing::warn!(sheet_id = %sheet_id, "dropping duplicate sheet");
                continue;
            }
            order.push(sheet_id.clone());
            sheets.insert(sheet_id.clone(), Sheet::from_bundle_sheet(sheet_id, wire, now));
        }

        let main = order
            .iter()
            .find(|id| id.as_str() == bundle.main_sheet_id.as_str())
            .or_else(|| order.first())
            .cloned()
            .ok_or(RegistryError::EmptyBundle)?;

        let mut open_tabs: Vec<SheetId> = Vec::new();
        for tab in &bundle.open_tabs {
            let Some(sheet_id) = order.iter().find(|id| id.as_str() == tab.as_str()) else {
                tracing::debug!(tab = %tab, "dropping tab for unknown sheet");
                continue;
            };
            if !open_tabs.contains(sheet_id) {
                open_tabs.push(sheet_id.clone());
            }
        }

        let active = bundle
            .active_sheet_id
            .as_deref()
            .and_then(|active| order.iter().find(|id| id.as_str() == active))
            .cloned();
        if let Some(active) = &active {
            if !open_tabs.contains(active) {
                open_tabs.push(active.clone());
            }
        }

        let max_open_tabs = self.max_open_tabs;
        while open_tabs.len() > max_open_tabs {
            let Some(position) = open_tabs.iter().position(|id| Some(id) != active.as_ref())
            else {
                break;
            };
            open_tabs.remove(position);
        }

        let mut recent = open_tabs.clone();
        recent.sort_by_key(|id| sheets.get(id).map_or(0, Sheet::last_opened_at));
        if let Some(active) = &active {
            recent.retain(|id| id != active);
            recent.push(active.clone());
        }

        Ok(Self {
            sheets,
            order,
            open_tabs,
            recent,
            active,
            main,
            max_open_tabs,
            resolve_options: self.resolve_options,
        })
    }
}
