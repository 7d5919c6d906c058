//! Resolution of index hits back to stubs, with consistency checking.
//!
//! An index entry is (file id, stub ordinal). The ordinal is resolved
//! against, in order of preference: the stub tree memoized on the live
//! content, a tree freshly built from the live content, or the serialized
//! tree read back from the forward index. A hit that does not line up with
//! the resolved tree means the persisted index and the current content
//! disagree; the file is scheduled for re-indexing and its remaining hits
//! are dropped, since an incomplete answer beats a corrupted one.
//!
//! Before any ordinal is trusted against live content, the persisted length
//! and content stamp are compared with the content in hand: index entries
//! derived from different bytes are stale even when the stub shape happens
//! to line up.

use crate::error::Result;
use crate::index::StubEngine;
use std::sync::Arc;
use stubscope_api::models::content::FileContent;
use stubscope_api::models::id_list::StubIdList;
use stubscope_api::models::ids::{FileId, StubId};
use stubscope_api::models::stub::{ResolvedStub, StubTree};
use xxhash_rust::xxh3::xxh3_64;

impl StubEngine {
    /// Feeds every stub referenced by `list` to `processor`. Returns
    /// `false` only on early termination by the processor.
    pub(crate) fn process_stub_ids(
        &self,
        file_id: FileId,
        list: &StubIdList,
        required: Option<&str>,
        processor: &mut dyn FnMut(&ResolvedStub) -> bool,
    ) -> Result<bool> {
        let content = self.source.file(file_id);
        let live_tree = match &content {
            Some(content) if self.accepts(&content.file_type) => {
                if self.index_is_stale_for(content) {
                    tracing::warn!(
                        ?file_id,
                        "index entries predate the current content, scheduling re-index"
                    );
                    self.scheduler.request_file(file_id);
                    return Ok(true);
                }
                match self.factory.stub_tree(content) {
                    Ok(tree) => tree,
                    Err(e) => {
                        tracing::warn!(
                            ?file_id,
                            error = %e,
                            "stub tree construction failed during resolution"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        // Fall back to the persisted tree when no live view is available;
        // the required-kind check below still applies to stubs resolved
        // this way.
        let tree = match live_tree {
            Some(tree) => tree,
            None => match self.read_persisted_tree(file_id)? {
                Some(tree) => tree,
                None => return Ok(true),
            },
        };

        for stub_id in list.iter() {
            let Some(stub) = tree.get(stub_id) else {
                self.report_mismatch(file_id, &tree, stub_id, "stub id out of range");
                return Ok(true);
            };
            let external_id = self.registry.name_of(stub.serializer);
            if let Some(required) = required {
                if external_id != required {
                    self.report_mismatch(
                        file_id,
                        &tree,
                        stub_id,
                        &format!("expected kind `{required}`, found `{external_id}`"),
                    );
                    return Ok(true);
                }
            }
            let resolved = ResolvedStub {
                file_id,
                stub_id,
                external_id,
                payload: stub.payload.clone(),
                source: stub.source.clone(),
            };
            if !processor(&resolved) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Materializes the forward index's serialized tree. Unreadable bytes
    /// degrade to "no tree" and schedule a rebuild; readers never see the
    /// storage error.
    fn read_persisted_tree(&self, file_id: FileId) -> Result<Option<Arc<StubTree>>> {
        let forward = self.forward.read().unwrap();
        let Some(entry) = forward.get(&file_id) else {
            return Ok(None);
        };
        match self.helper.deserialize(&entry.bytes) {
            Ok(tree) => Ok(Some(Arc::new(tree))),
            Err(e) => {
                tracing::info!(
                    ?file_id,
                    error = %e,
                    "persisted stub tree unreadable, scheduling rebuild"
                );
                self.scheduler.request_full();
                Ok(None)
            }
        }
    }

    /// The index stores the length and xxh3 stamp of the bytes each entry
    /// was derived from; a live snapshot with a different stamp makes every
    /// persisted ordinal for the file suspect.
    fn index_is_stale_for(&self, content: &FileContent) -> bool {
        let forward = self.forward.read().unwrap();
        let Some(entry) = forward.get(&content.file_id) else {
            return false;
        };
        entry.text_len != content.len() as u64
            || entry.content_stamp != xxh3_64(content.as_bytes())
    }

    /// The resolved tree and the persisted index disagree. Logs the dual
    /// dump (persisted tree vs tree from current content) and schedules the
    /// file for re-indexing.
    fn report_mismatch(&self, file_id: FileId, resolved: &StubTree, stub_id: StubId, reason: &str) {
        let diagnostic = self.stub_tree_and_index_do_not_match(file_id, resolved);
        let path = self
            .file_ids
            .path_of(file_id)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("file #{}", file_id.0));
        tracing::error!(
            %path,
            ?stub_id,
            reason,
            "stub tree and index do not match\n{diagnostic}"
        );
        self.on_internal_error(file_id);
    }

    /// Schedules the offending file for re-indexing; queued even under the
    /// immediate policy because the caller holds a read lock.
    fn on_internal_error(&self, file_id: FileId) {
        self.scheduler.request_file(file_id);
    }

    fn stub_tree_and_index_do_not_match(&self, file_id: FileId, resolved: &StubTree) -> String {
        let name_of = |id| self.registry.name_of(id);
        let persisted = {
            let forward = self.forward.read().unwrap();
            forward
                .get(&file_id)
                .and_then(|entry| self.helper.deserialize(&entry.bytes).ok())
                .map(|tree| tree.debug_dump(&name_of))
                .unwrap_or_else(|| "<unreadable>".to_string())
        };
        format!(
            "persisted stub tree:\n{persisted}\nstub tree from current content:\n{}",
            resolved.debug_dump(&name_of)
        )
    }
}
