// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Skillsheets: multi-sheet workflow documents.
//!
//! A skill is a workflow graph; larger skills split it into sheets that call each other.
//! This crate reads both file shapes, upgrades old documents, checks cross-sheet calls and
//! keeps the live sheet set for an editor session.

pub mod config;
pub mod format;
pub mod loader;
pub mod migrate;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod store;

pub use config::EditorConfig;
pub use loader::{LoadError, LoadOptions, LoadResult, PersistOutcome, SkillLoader};
pub use migrate::SchemaMigrator;
pub use registry::{RegistryError, SheetRegistry};
pub use resolve::{validate_bundle, ValidationReport};
