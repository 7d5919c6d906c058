//! Persistent path ↔ file id mapping.
//!
//! The host assigns file ids; the engine records each (id, path) pair the
//! first time the file is indexed so diagnostics can name files by path.
//! For hosts without their own numbering, `id_for` allocates a stable id on
//! first sight instead.

use crate::error::{Result, StubscopeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use stubscope_api::models::ids::FileId;

#[derive(Default, Serialize, Deserialize)]
struct Inner {
    by_path: HashMap<PathBuf, FileId>,
    by_id: HashMap<FileId, PathBuf>,
}

pub struct FileIdRegistry {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl FileIdRegistry {
    pub fn open(path: PathBuf) -> Result<Self> {
        let inner = if path.exists() {
            let bytes = std::fs::read(&path)?;
            rmp_serde::from_slice(&bytes)
                .map_err(|e| StubscopeError::Storage(format!("file id table unreadable: {e}")))?
        } else {
            Inner::default()
        };
        Ok(Self {
            path,
            inner: RwLock::new(inner),
        })
    }

    /// Records a host-assigned pair. A file that moved keeps its id; the
    /// mapping follows the new path.
    pub fn record(&self, id: FileId, path: &Path) -> Result<()> {
        {
            let inner = self.inner.read().unwrap();
            if inner.by_id.get(&id).is_some_and(|known| known == path) {
                return Ok(());
            }
        }
        let mut inner = self.inner.write().unwrap();
        if let Some(previous) = inner.by_id.insert(id, path.to_path_buf()) {
            inner.by_path.remove(&previous);
        }
        inner.by_path.insert(path.to_path_buf(), id);
        self.save(&inner)
    }

    /// Returns the stable id for `path`, allocating and persisting one on
    /// first sight.
    pub fn id_for(&self, path: &Path) -> Result<FileId> {
        {
            let inner = self.inner.read().unwrap();
            if let Some(id) = inner.by_path.get(path) {
                return Ok(*id);
            }
        }
        let mut inner = self.inner.write().unwrap();
        if let Some(id) = inner.by_path.get(path) {
            return Ok(*id);
        }
        let id = FileId(inner.by_id.keys().map(|id| id.0 + 1).max().unwrap_or(0));
        inner.by_id.insert(id, path.to_path_buf());
        inner.by_path.insert(path.to_path_buf(), id);
        self.save(&inner)?;
        Ok(id)
    }

    pub fn path_of(&self, id: FileId) -> Option<PathBuf> {
        self.inner.read().unwrap().by_id.get(&id).cloned()
    }

    fn save(&self, inner: &Inner) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = rmp_serde::to_vec(inner)
            .map_err(|e| StubscopeError::Storage(format!("file id table encode failed: {e}")))?;
        let temp = self.path.with_extension("tmp");
        std::fs::write(&temp, bytes)?;
        std::fs::rename(temp, &self.path)?;
        Ok(())
    }
}
