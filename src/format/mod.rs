// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! On-disk formats.

pub mod bundle;

pub use bundle::{
    classify_file, looks_like_bundle, normalize_bundle, normalize_bundle_at, parse_bundle_shape,
    repair_references, serialize_bundle, BundleShape, FileShape, LegacyBundle, RepairReport,
    RepairStrategy, RepairedReference, ShapeError,
};
