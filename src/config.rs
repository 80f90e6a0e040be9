// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Editor settings.
//!
//! Settings come from an optional TOML file (explicit path or `SKILLSHEETS_CONFIG`) and are
//! then overridden by `SKILLSHEETS_*` environment variables:
//!
//! ```toml
//! [registry]
//! max_open_tabs = 10
//!
//! [validation]
//! bypass = false
//!
//! [persistence]
//! auto_save_migrations = true
//! debounce_ms = 500
//! durable = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resolve::ResolveOptions;
use crate::store::WriteDurability;

pub const CONFIG_PATH_ENV: &str = "SKILLSHEETS_CONFIG";
pub const MAX_OPEN_TABS_ENV: &str = "SKILLSHEETS_MAX_OPEN_TABS";
pub const BYPASS_VALIDATION_ENV: &str = "SKILLSHEETS_BYPASS_VALIDATION";
pub const AUTO_SAVE_ENV: &str = "SKILLSHEETS_AUTO_SAVE";
pub const DEBOUNCE_MS_ENV: &str = "SKILLSHEETS_DEBOUNCE_MS";
pub const DURABLE_WRITES_ENV: &str = "SKILLSHEETS_DURABLE_WRITES";

const DEFAULT_MAX_OPEN_TABS: usize = 10;
const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {key} value {value:?}: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub registry: RegistryConfig,
    pub validation: ValidationConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Upper bound on open tabs; values below 1 are treated as 1.
    pub max_open_tabs: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_open_tabs: DEFAULT_MAX_OPEN_TABS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accept bundles without validating them. Meant for fixtures that are known to be
    /// irregular.
    pub bypass: bool,
}

impl ValidationConfig {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            bypass: self.bypass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Write migrated files back to disk after loading them.
    pub auto_save_migrations: bool,
    /// Write-behind delay for write-back; `0` writes before a load returns.
    pub debounce_ms: u64,
    /// fsync written files and their directory.
    pub durable: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            auto_save_migrations: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            durable: false,
        }
    }
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn durability(&self) -> WriteDurability {
        if self.durable {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        }
    }
}

impl EditorConfig {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.normalize();
        tracing::debug!(path = %path.display(), "loaded editor config");
        Ok(config)
    }

    /// Applies `SKILLSHEETS_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_env(&lookup, MAX_OPEN_TABS_ENV)? {
            self.registry.max_open_tabs = value;
        }
        if let Some(value) = lookup(BYPASS_VALIDATION_ENV) {
            self.validation.bypass = truthy(&value);
        }
        if let Some(value) = lookup(AUTO_SAVE_ENV) {
            self.persistence.auto_save_migrations = truthy(&value);
        }
        if let Some(value) = parse_env(&lookup, DEBOUNCE_MS_ENV)? {
            self.persistence.debounce_ms = value;
        }
        if let Some(value) = lookup(DURABLE_WRITES_ENV) {
            self.persistence.durable = truthy(&value);
        }
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        if self.registry.max_open_tabs == 0 {
            tracing::warn!("max_open_tabs must be at least 1; using 1");
            self.registry.max_open_tabs = 1;
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_env<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|err| ConfigError::Env {
            key,
            reason: err.to_string(),
            value,
        })
}
