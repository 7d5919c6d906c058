//! Rebuild scheduling.
//!
//! The requirement is "a rebuild must eventually happen without re-entrant
//! initialization", so scheduling is a policy parameter: `Immediate`
//! rebuilds at the request point (tests, small hosts), `Deferred` queues and
//! lets the next up-to-date check drain the queue. Requests raised from
//! under a read lock are always queued, whatever the policy.

use super::StubEngine;
use crate::error::Result;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use stubscope_api::models::ids::FileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildPolicy {
    /// Rebuild synchronously where the request is made.
    Immediate,
    /// Queue the request; drained by the next `flush_pending` /
    /// up-to-date check.
    #[default]
    Deferred,
}

#[derive(Default)]
pub(crate) struct RebuildScheduler {
    full: AtomicBool,
    files: Mutex<HashSet<FileId>>,
}

impl RebuildScheduler {
    pub(crate) fn request_full(&self) {
        self.full.store(true, Ordering::SeqCst);
    }

    pub(crate) fn request_file(&self, file_id: FileId) {
        self.files.lock().unwrap().insert(file_id);
    }

    pub(crate) fn take_full(&self) -> bool {
        self.full.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn take_files(&self) -> HashSet<FileId> {
        std::mem::take(&mut self.files.lock().unwrap())
    }
}

impl StubEngine {
    pub(crate) fn flush_rebuilds(&self) -> Result<()> {
        if self.scheduler.take_full() {
            self.rebuild_all()?;
        }
        for file_id in self.scheduler.take_files() {
            match self.source.file(file_id) {
                Some(content) => self.update_file(&content)?,
                None => self.remove_file(file_id)?,
            }
        }
        Ok(())
    }

    /// Discards all index data and re-indexes every known file. Stub trees
    /// are built in parallel; commits stay serial so the per-file update
    /// transaction is unchanged.
    pub fn rebuild_all(&self) -> Result<()> {
        tracing::info!("rebuilding all stub indexes");
        {
            let mut ext_guards: Vec<_> = self
                .extensions
                .iter()
                .map(|slot| slot.storage.write().unwrap())
                .collect();
            let mut forward = self.forward.write().unwrap();
            forward.clear();
            forward.save()?;
            for guard in ext_guards.iter_mut() {
                guard.clear();
                guard.save()?;
            }
            drop(forward);
            while ext_guards.pop().is_some() {}
        }

        let files = self.source.all_files();
        let prepared: Vec<_> = files
            .into_par_iter()
            .map(|content| {
                let result = if self.accepts(&content.file_type) {
                    self.prepare_update(&content)
                } else {
                    Ok(None)
                };
                (content, result)
            })
            .collect();

        for (content, result) in prepared {
            match result {
                Ok(update) => {
                    self.file_ids.record(content.file_id, &content.path)?;
                    self.commit_update(content.file_id, update)?;
                }
                Err(e) => {
                    tracing::error!(
                        path = %content.path.display(),
                        error = %e,
                        "failed to build stub tree during rebuild"
                    );
                }
            }
        }
        Ok(())
    }
}
