// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! File access for skill and bundle files.
//!
//! Everything that touches disk goes through [`FileStore`], so the loader can be driven by
//! an in-memory store in tests and by [`FsStore`] in the editor and CLI.

pub mod autosave;
#[cfg(test)]
pub(crate) mod test_utils;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub use autosave::{SaveFailure, SaveScheduler};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("refusing to write through symlink at {}", path.display())]
    SymlinkRefused { path: PathBuf },
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },
    #[error("failed to start save worker: {0}")]
    Worker(#[source] io::Error),
}

impl StoreError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::SymlinkRefused { path } | Self::InvalidPath { path, .. } => {
                Some(path)
            }
            Self::Worker(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Read/write access to text files.
pub trait FileStore: Send + Sync {
    fn read(&self, path: &Path) -> Result<String, StoreError>;

    /// Fallback read for files [`FileStore::read`] rejects, such as files written by older
    /// editor builds with a broken encoding. `None` means the store has no fallback.
    fn read_legacy(&self, _path: &Path) -> Option<Result<String, StoreError>> {
        None
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Temp file plus atomic rename, without fsync.
    #[default]
    BestEffort,

    /// Like [`WriteDurability::BestEffort`], additionally syncing the file before the rename
    /// and the parent directory after it (unix).
    Durable,
}

/// The filesystem-backed [`FileStore`].
#[derive(Debug, Default, Clone)]
pub struct FsStore {
    durability: WriteDurability,
}

impl FsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }
}

impl FileStore for FsStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Lossy UTF-8 decoding with a leading byte-order mark removed.
    fn read_legacy(&self, path: &Path) -> Option<Result<String, StoreError>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                return Some(Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                }))
            }
        };
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        Some(Ok(String::from_utf8_lossy(bytes).into_owned()))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        write_atomic(path, contents.as_bytes(), self.durability)
    }
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

/// Writes `contents` to `path` through a sibling temp file and a rename, so readers see
/// either the old or the new file, never a torn one.
pub fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    let Some(file_name) = path.file_name() else {
        return Err(StoreError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path has no file name",
        });
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".skillsheets.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    let written = file.write_all(contents).and_then(|()| {
        if durability == WriteDurability::Durable {
            file.sync_all()
        } else {
            Ok(())
        }
    });
    drop(file);
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: tmp_path,
            source,
        });
    }

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
            dir.sync_all().map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}
