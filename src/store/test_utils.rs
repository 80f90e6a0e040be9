// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{FileStore, StoreError};

/// In-memory [`FileStore`] that records writes and can be told to fail them.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
    legacy: Mutex<BTreeMap<PathBuf, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), contents.into());
        self
    }

    /// A file only the legacy read path can see.
    pub(crate) fn with_legacy_file(
        self,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        self.legacy
            .lock()
            .unwrap()
            .insert(path.into(), contents.into());
        self
    }

    pub(crate) fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn not_found(path: &Path) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        if self.legacy.lock().unwrap().contains_key(path) {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
            });
        }
        self.file(path).ok_or_else(|| not_found(path))
    }

    fn read_legacy(&self, path: &Path) -> Option<Result<String, StoreError>> {
        let legacy = self.legacy.lock().unwrap().get(path).cloned();
        Some(legacy.ok_or_else(|| not_found(path)))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only store"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_owned());
        Ok(())
    }
}
