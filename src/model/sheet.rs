// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::bundle::{BundleSheet, SheetView};
use super::document::Document;
use super::ids::SheetId;

/// A single, named workflow document held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    sheet_id: SheetId,
    name: String,
    document: Document,
    created_at: i64,
    last_opened_at: i64,
    view: Option<SheetView>,
    selection_ids: Vec<String>,
}

impl Sheet {
    pub fn new(sheet_id: SheetId, name: impl Into<String>, document: Document, now: i64) -> Self {
        Self {
            sheet_id,
            name: name.into(),
            document,
            created_at: now,
            last_opened_at: now,
            view: None,
            selection_ids: Vec::new(),
        }
    }

    /// Builds a sheet from a wire entry whose id has already been validated.
    pub fn from_bundle_sheet(sheet_id: SheetId, sheet: BundleSheet, now: i64) -> Self {
        let created_at = sheet.created_at.unwrap_or(now);
        Self {
            sheet_id,
            name: sheet.name,
            document: sheet.document,
            created_at,
            last_opened_at: sheet.last_opened_at.unwrap_or(created_at),
            view: sheet.view,
            selection_ids: sheet.selection_ids,
        }
    }

    pub fn to_bundle_sheet(&self) -> BundleSheet {
        BundleSheet {
            id: self.sheet_id.to_string(),
            name: self.name.clone(),
            document: self.document.clone(),
            created_at: Some(self.created_at),
            last_opened_at: Some(self.last_opened_at),
            view: self.view.clone(),
            selection_ids: self.selection_ids.clone(),
        }
    }

    pub fn sheet_id(&self) -> &SheetId {
        &self.sheet_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Replaces the document wholesale and returns the previous one.
    pub fn replace_document(&mut self, document: Document) -> Document {
        std::mem::replace(&mut self.document, document)
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn last_opened_at(&self) -> i64 {
        self.last_opened_at
    }

    pub fn touch_opened(&mut self, now: i64) {
        self.last_opened_at = self.last_opened_at.max(now);
    }

    pub fn view(&self) -> Option<&SheetView> {
        self.view.as_ref()
    }

    pub fn set_view(&mut self, view: Option<SheetView>) {
        self.view = view;
    }

    pub fn selection_ids(&self) -> &[String] {
        &self.selection_ids
    }

    pub fn set_selection_ids(&mut self, selection_ids: Vec<String>) {
        self.selection_ids = selection_ids;
    }
}
