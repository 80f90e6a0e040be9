// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Skillsheets and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Debounced write-behind persistence.
//!
//! Every destination path owns one pending slot. Scheduling a write for a path that already
//! has one replaces its contents and restarts its debounce window, so a burst of edits ends
//! in a single write of the latest contents. A background thread performs the writes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::{FileStore, StoreError};

/// A scheduled write that failed on the worker thread.
#[derive(Debug)]
pub struct SaveFailure {
    pub path: PathBuf,
    pub error: StoreError,
}

#[derive(Debug)]
struct PendingSave {
    contents: String,
    due: Instant,
}

#[derive(Debug, Default)]
struct SaveState {
    pending: HashMap<PathBuf, PendingSave>,
    in_flight: Option<PathBuf>,
    failures: Vec<SaveFailure>,
    /// Number of callers blocked in `flush`; while non-zero every pending write is due.
    flushing: usize,
    shutdown: bool,
}

#[derive(Debug)]
struct SaveInner {
    state: Mutex<SaveState>,
    cv: Condvar,
}

impl SaveInner {
    fn lock(&self) -> MutexGuard<'_, SaveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, SaveState>) -> MutexGuard<'a, SaveState> {
        self.cv.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, SaveState>,
        timeout: Duration,
    ) -> MutexGuard<'a, SaveState> {
        self.cv
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner)
            .0
    }
}

pub struct SaveScheduler {
    inner: Arc<SaveInner>,
    debounce: Duration,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SaveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveScheduler")
            .field("debounce", &self.debounce)
            .field("pending", &self.pending_len())
            .finish_non_exhaustive()
    }
}

impl SaveScheduler {
    pub fn new(store: Arc<dyn FileStore>, debounce: Duration) -> Result<Self, StoreError> {
        let inner = Arc::new(SaveInner {
            state: Mutex::new(SaveState::default()),
            cv: Condvar::new(),
        });

        let worker = std::thread::Builder::new()
            .name("skillsheets-save".to_owned())
            .spawn({
                let inner = inner.clone();
                move || run_worker(&inner, store.as_ref())
            })
            .map_err(StoreError::Worker)?;

        Ok(Self {
            inner,
            debounce,
            worker: Some(worker),
        })
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Queues `contents` for `path`, replacing anything still pending for it.
    pub fn schedule(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        let due = Instant::now() + self.debounce;

        let mut state = self.inner.lock();
        let replaced = state
            .pending
            .insert(
                path.clone(),
                PendingSave {
                    contents: contents.into(),
                    due,
                },
            )
            .is_some();
        tracing::trace!(path = %path.display(), replaced, "scheduled save");
        self.inner.cv.notify_all();
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Writes everything pending now and blocks until the worker is idle.
    pub fn flush(&self) {
        let mut state = self.inner.lock();
        state.flushing += 1;
        self.inner.cv.notify_all();
        while !state.pending.is_empty() || state.in_flight.is_some() {
            state = self.inner.wait(state);
        }
        state.flushing -= 1;
    }

    /// Failed writes since the last call.
    pub fn take_failures(&self) -> Vec<SaveFailure> {
        std::mem::take(&mut self.inner.lock().failures)
    }
}

impl Drop for SaveScheduler {
    fn drop(&mut self) {
        {
            let mut state = self.inner.lock();
            state.shutdown = true;
            self.inner.cv.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(inner: &SaveInner, store: &dyn FileStore) {
    loop {
        let (path, contents) = {
            let mut state = inner.lock();
            loop {
                let next = state
                    .pending
                    .iter()
                    .min_by_key(|(_, save)| save.due)
                    .map(|(path, save)| (path.clone(), save.due));

                let Some((path, due)) = next else {
                    if state.shutdown {
                        return;
                    }
                    state = inner.wait(state);
                    continue;
                };

                let now = Instant::now();
                if due <= now || state.flushing > 0 || state.shutdown {
                    if let Some(save) = state.pending.remove(&path) {
                        state.in_flight = Some(path.clone());
                        break (path, save.contents);
                    }
                    continue;
                }

                state = inner.wait_timeout(state, due - now);
            }
        };

        let result = store.write(&path, &contents);

        let mut state = inner.lock();
        state.in_flight = None;
        match result {
            Ok(()) => tracing::debug!(path = %path.display(), "saved"),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "scheduled save failed");
                state.failures.push(SaveFailure { path, error });
            }
        }
        inner.cv.notify_all();
    }
}
