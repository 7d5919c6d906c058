use crate::models::ids::{FileId, FileType};
use crate::models::stub::StubTree;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum FileData {
    Text(Arc<str>),
    Binary(Arc<[u8]>),
}

/// Snapshot of one file's content as seen by the indexer.
///
/// Carries the per-content stub tree memo: the orchestrator computes the
/// tree at most once per `FileContent` instance, even under concurrent
/// callers, by initializing the cell.
#[derive(Debug)]
pub struct FileContent {
    pub file_id: FileId,
    pub path: PathBuf,
    pub file_type: FileType,
    pub data: FileData,
    stub_memo: OnceCell<Option<Arc<StubTree>>>,
}

impl FileContent {
    pub fn text(file_id: FileId, path: PathBuf, file_type: FileType, text: &str) -> Self {
        Self {
            file_id,
            path,
            file_type,
            data: FileData::Text(Arc::from(text)),
            stub_memo: OnceCell::new(),
        }
    }

    pub fn binary(file_id: FileId, path: PathBuf, file_type: FileType, bytes: Vec<u8>) -> Self {
        Self {
            file_id,
            path,
            file_type,
            data: FileData::Binary(Arc::from(bytes)),
            stub_memo: OnceCell::new(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            FileData::Text(text) => Some(text),
            FileData::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            FileData::Text(text) => text.as_bytes(),
            FileData::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// The at-most-once stub tree slot; `None` inside means "not
    /// stub-indexable".
    pub fn stub_memo(&self) -> &OnceCell<Option<Arc<StubTree>>> {
        &self.stub_memo
    }
}

/// Host seam: where the engine obtains file content for (re)indexing.
pub trait ContentSource: Send + Sync {
    fn all_files(&self) -> Vec<Arc<FileContent>>;
    fn file(&self, id: FileId) -> Option<Arc<FileContent>>;
}
