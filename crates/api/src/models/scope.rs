use crate::models::ids::FileId;
use std::collections::HashSet;

/// Which files a query may touch. `everything()` is the whole project.
#[derive(Debug, Clone, Default)]
pub struct SearchScope(Option<HashSet<FileId>>);

impl SearchScope {
    pub fn everything() -> Self {
        Self(None)
    }

    pub fn files(ids: impl IntoIterator<Item = FileId>) -> Self {
        Self(Some(ids.into_iter().collect()))
    }

    pub fn contains(&self, id: FileId) -> bool {
        match &self.0 {
            None => true,
            Some(ids) => ids.contains(&id),
        }
    }
}

/// Optional coarse pre-filter applied before scope checks; a file id not in
/// the filter is skipped without touching its entries.
#[derive(Debug, Clone)]
pub struct IdFilter(HashSet<FileId>);

impl IdFilter {
    pub fn new(ids: impl IntoIterator<Item = FileId>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.0.contains(&id)
    }
}
