//! Query surface of the stub index engine.

use super::{PendingChange, StubEngine};
use crate::error::{Result, StubscopeError};
use std::cell::Cell;
use std::sync::Arc;
use stubscope_api::models::content::FileContent;
use stubscope_api::models::ids::{FileId, IndexId};
use stubscope_api::models::scope::{IdFilter, SearchScope};
use stubscope_api::models::stub::ResolvedStub;
use tokio_util::sync::CancellationToken;

thread_local! {
    /// Set while a reader holds an index read lock: the up-to-date check
    /// must not re-enter the writer path from under that lock.
    static UP_TO_DATE_CHECK_DISABLED: Cell<bool> = const { Cell::new(false) };
}

/// RAII half of the critical-section pairing: disable check, take read
/// lock, read, release lock, re-enable check.
pub(crate) struct UpToDateGuard {
    previous: bool,
}

impl UpToDateGuard {
    pub(crate) fn disable() -> Self {
        let previous = UP_TO_DATE_CHECK_DISABLED.with(|cell| cell.replace(true));
        Self { previous }
    }
}

impl Drop for UpToDateGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        UP_TO_DATE_CHECK_DISABLED.with(|cell| cell.set(previous));
    }
}

impl StubEngine {
    /// Queues a changed file for re-indexing; applied before the next read.
    pub fn schedule_update(&self, content: Arc<FileContent>) {
        self.pending
            .lock()
            .unwrap()
            .push(PendingChange::Update(content));
    }

    pub fn schedule_removal(&self, file_id: FileId) {
        self.pending
            .lock()
            .unwrap()
            .push(PendingChange::Remove(file_id));
    }

    /// Applies every queued change and pending rebuild now.
    pub fn flush_pending(&self) -> Result<()> {
        self.ensure_up_to_date()
    }

    /// Read-after-write consistency: queries see the most recent known file
    /// state. No-op when called from under a read lock (the guard is set).
    pub(crate) fn ensure_up_to_date(&self) -> Result<()> {
        if UP_TO_DATE_CHECK_DISABLED.with(|cell| cell.get()) {
            return Ok(());
        }
        self.flush_rebuilds()?;
        loop {
            let batch: Vec<PendingChange> = {
                let mut pending = self.pending.lock().unwrap();
                if pending.is_empty() {
                    break;
                }
                pending.drain(..).collect()
            };
            for change in batch {
                self.apply_change(change)?;
            }
        }
        Ok(())
    }

    /// Resolves every stub mapped to `key` in `index` and feeds it to
    /// `processor`. Returns `false` only if the processor stopped early.
    pub fn process_elements(
        &self,
        index: &IndexId,
        key: &str,
        scope: &SearchScope,
        id_filter: Option<&IdFilter>,
        required: Option<&str>,
        cancel: &CancellationToken,
        processor: &mut dyn FnMut(&ResolvedStub) -> bool,
    ) -> Result<bool> {
        self.ensure_up_to_date()?;
        let slot = self.slot(index)?;

        let _guard = UpToDateGuard::disable();
        let storage = slot.storage.read().unwrap();
        let Some(per_file) = storage.get(&key.to_string()) else {
            return Ok(true);
        };

        let mut files: Vec<FileId> = per_file.keys().copied().collect();
        files.sort_unstable();
        for file_id in files {
            if cancel.is_cancelled() {
                return Err(StubscopeError::Cancelled);
            }
            if !scope.contains(file_id) {
                continue;
            }
            if let Some(filter) = id_filter {
                if !filter.contains(file_id) {
                    continue;
                }
            }
            let ids = &per_file[&file_id];
            if !self.process_stub_ids(file_id, ids, required, processor)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Enumerates distinct keys currently present in `index`, restricted to
    /// keys with at least one file in scope.
    pub fn process_all_keys(
        &self,
        index: &IndexId,
        scope: &SearchScope,
        id_filter: Option<&IdFilter>,
        cancel: &CancellationToken,
        processor: &mut dyn FnMut(&str) -> bool,
    ) -> Result<bool> {
        self.ensure_up_to_date()?;
        let slot = self.slot(index)?;

        let _guard = UpToDateGuard::disable();
        let storage = slot.storage.read().unwrap();
        let mut keys: Vec<&String> = storage.keys().collect();
        keys.sort_unstable();
        for key in keys {
            if cancel.is_cancelled() {
                return Err(StubscopeError::Cancelled);
            }
            let in_scope = storage
                .get(key)
                .is_some_and(|per_file| {
                    per_file.keys().any(|id| {
                        scope.contains(*id)
                            && id_filter.is_none_or(|filter| filter.contains(*id))
                    })
                });
            if in_scope && !processor(key) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn get_all_keys(&self, index: &IndexId) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.process_all_keys(
            index,
            &SearchScope::everything(),
            None,
            &CancellationToken::new(),
            &mut |key| {
                keys.push(key.to_string());
                true
            },
        )?;
        Ok(keys)
    }

    /// Administrative escape hatch: any consumer that detects an
    /// inconsistency can demand a full rebuild. Logged at info level; an
    /// inconsistent index is an expected-possible condition, not a bug
    /// signal.
    ///
    /// Callable from inside a query processor: while the calling thread
    /// holds an index read lock (the guard is set), the request is queued
    /// even under the immediate policy and runs at the next up-to-date
    /// check.
    pub fn force_rebuild(&self, cause: &dyn std::fmt::Display) -> Result<()> {
        tracing::info!(%cause, "full stub index rebuild requested");
        self.scheduler.request_full();
        if self.policy == super::RebuildPolicy::Immediate
            && !UP_TO_DATE_CHECK_DISABLED.with(|cell| cell.get())
        {
            self.flush_rebuilds()?;
        }
        Ok(())
    }
}
