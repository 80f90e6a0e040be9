// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use semver::Version;

use super::{CURRENT_SCHEMA_VERSION, MIN_SUPPORTED_SCHEMA_VERSION};

/// A document schema version.
///
/// Parsing is lenient because the value comes from user-editable files: a leading `v` is
/// dropped and missing minor/patch components count as zero, so `"1"`, `"1.0"` and
/// `"v1.0.0"` are all `1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion(Version);

impl SchemaVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix(['v', 'V']).unwrap_or(raw);
        if raw.is_empty() {
            return None;
        }

        if let Ok(version) = Version::parse(raw) {
            return Some(Self(version));
        }

        let mut parts = [0u64; 3];
        let mut count = 0;
        for part in raw.split('.') {
            if count == parts.len() {
                return None;
            }
            parts[count] = part.trim().parse().ok()?;
            count += 1;
        }
        Some(Self(Version::new(parts[0], parts[1], parts[2])))
    }

    pub fn current() -> Self {
        Self::known(CURRENT_SCHEMA_VERSION, 1, 0, 1)
    }

    pub fn min_supported() -> Self {
        Self::known(MIN_SUPPORTED_SCHEMA_VERSION, 1, 0, 0)
    }

    // The constants are plain x.y.z; the explicit parts only cover a malformed edit.
    fn known(raw: &str, major: u64, minor: u64, patch: u64) -> Self {
        Self::parse(raw).unwrap_or_else(|| Self(Version::new(major, minor, patch)))
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid schema version {0:?}")]
pub struct ParseSchemaVersionError(String);

impl FromStr for SchemaVersion {
    type Err = ParseSchemaVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseSchemaVersionError(s.to_owned()))
    }
}
