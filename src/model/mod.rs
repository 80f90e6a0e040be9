// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Documents are the workflow graphs; sheets wrap a document with a name and view state;
//! bundles and skill documents are the two wire shapes those travel in.

pub mod bundle;
pub mod document;
pub mod ids;
pub(crate) mod lenient;
pub mod sheet;
pub mod skill;

pub use bundle::{Bundle, BundleSheet, SheetView};
pub use document::{
    Document, Edge, InterfaceSide, Node, CALL_NODE_TYPES, CALL_TARGET_NAME_FIELDS,
    INPUTS_NODE_TYPES, OUTPUTS_NODE_TYPES,
};
pub use ids::{Id, IdError, SheetId, MAIN_SHEET_ID};
pub use sheet::Sheet;
pub use skill::SkillDocument;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
