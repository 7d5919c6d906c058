//! Transactional per-file index updates.
//!
//! A file's new stub tree and derived key maps are computed outside any
//! lock; the write locks of every extension (in sorted index-id order) plus
//! the forward index are then held together while the old/new diff is
//! applied, so no reader ever observes a partially-updated combination of
//! raw stub bytes and derived key entries.

use super::{InvertedStorage, KeyMap, KeyMaps, PendingChange, StubEngine};
use crate::error::Result;
use crate::storage::SerializedStubTree;
use std::collections::HashSet;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use stubscope_api::models::content::FileContent;
use stubscope_api::models::id_list::StubIdList;
use stubscope_api::models::ids::{FileId, FileType, IndexId, StubId};
use stubscope_api::models::stub::StubTree;
use stubscope_plugin::IndexSink;
use xxhash_rust::xxh3::xxh3_64;

/// Collects (index, key) occurrences for the stub currently being visited.
struct KeyMapSink<'a> {
    current: StubId,
    acc: &'a mut std::collections::HashMap<IndexId, std::collections::HashMap<String, Vec<StubId>>>,
}

impl IndexSink for KeyMapSink<'_> {
    fn occurrence(&mut self, index: &IndexId, key: &str) {
        self.acc
            .entry(index.clone())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push(self.current);
    }
}

impl StubEngine {
    /// Input filter: only stub-capable file types reach the index at all.
    pub(crate) fn accepts(&self, file_type: &FileType) -> bool {
        self.factory.is_stub_indexable(file_type)
    }

    pub(crate) fn apply_change(&self, change: PendingChange) -> Result<()> {
        match change {
            PendingChange::Update(content) => self.update_file(&content),
            PendingChange::Remove(file_id) => self.remove_file(file_id),
        }
    }

    /// Re-indexes one file: new stub tree, serialized bytes and key maps
    /// replace whatever the file contributed before.
    pub fn update_file(&self, content: &Arc<FileContent>) -> Result<()> {
        self.file_ids.record(content.file_id, &content.path)?;
        let prepared = if self.accepts(&content.file_type) {
            self.prepare_update(content)?
        } else {
            None
        };
        self.commit_update(content.file_id, prepared)
    }

    /// Removes every trace of a file from the forward and derived indexes.
    pub fn remove_file(&self, file_id: FileId) -> Result<()> {
        self.commit_update(file_id, None)
    }

    /// The lock-free half of an update: parse, build, serialize, derive.
    pub(crate) fn prepare_update(
        &self,
        content: &Arc<FileContent>,
    ) -> Result<Option<(SerializedStubTree, KeyMaps)>> {
        let Some(tree) = self.factory.stub_tree(content)? else {
            return Ok(None);
        };
        let bytes = self.helper.serialize(&tree)?;
        let maps = self.derive_key_maps(&tree);
        let serialized = SerializedStubTree {
            bytes,
            text_len: content.len() as u64,
            content_stamp: xxh3_64(content.as_bytes()),
        };
        Ok(Some((serialized, maps)))
    }

    /// Walks the flat stub list once, letting each stub's serializer emit
    /// its index occurrences.
    pub(crate) fn derive_key_maps(&self, tree: &StubTree) -> KeyMaps {
        let mut acc = std::collections::HashMap::new();
        for (position, stub) in tree.plain_list().iter().enumerate() {
            let Some(cap) = self.registry.cap(stub.serializer) else {
                tracing::error!(
                    serializer = ?stub.serializer,
                    "stub references an unregistered serializer, skipping its occurrences"
                );
                continue;
            };
            let mut sink = KeyMapSink {
                current: StubId(position as u32),
                acc: &mut acc,
            };
            cap.index(stub.payload.as_ref(), &mut sink);
        }

        acc.into_iter()
            .map(|(index, keys)| {
                let map: KeyMap = keys
                    .into_iter()
                    .map(|(key, ids)| (key, StubIdList::from_ids(ids)))
                    .collect();
                (index, map)
            })
            .collect()
    }

    /// The locked half: writes the forward value and diffs every derived
    /// index, all under the fixed-order write locks.
    pub(crate) fn commit_update(
        &self,
        file_id: FileId,
        new: Option<(SerializedStubTree, KeyMaps)>,
    ) -> Result<()> {
        let (new_value, new_maps) = match new {
            Some((serialized, maps)) => (Some(serialized), maps),
            None => (None, KeyMaps::new()),
        };

        // Fixed global lock order: extensions sorted by index id, then the
        // forward index.
        let mut ext_guards: Vec<_> = self
            .extensions
            .iter()
            .map(|slot| slot.storage.write().unwrap())
            .collect();
        let mut forward = self.forward.write().unwrap();

        let old_maps = match forward.get(&file_id) {
            Some(old) => self.key_maps_from_bytes(&old.bytes),
            None => KeyMaps::new(),
        };

        match new_value {
            Some(serialized) => forward.insert(file_id, serialized),
            None => {
                forward.remove(&file_id);
            }
        }
        forward.save()?;

        for (slot, guard) in self.extensions.iter().zip(ext_guards.iter_mut()) {
            let changed = apply_diff(
                guard,
                file_id,
                old_maps.get(&slot.id),
                new_maps.get(&slot.id),
            );
            if changed {
                guard.save()?;
            }
        }

        // Release in reverse acquisition order.
        drop(forward);
        while ext_guards.pop().is_some() {}
        Ok(())
    }

    /// Derives the key maps the previous content contributed. An unreadable
    /// old tree (format evolution, corruption) is treated as contributing
    /// nothing and the whole index is scheduled for rebuild.
    fn key_maps_from_bytes(&self, bytes: &[u8]) -> KeyMaps {
        match self.helper.deserialize(bytes) {
            Ok(tree) => self.derive_key_maps(&tree),
            Err(e) => {
                tracing::warn!(error = %e, "previous stub tree unreadable, scheduling rebuild");
                self.scheduler.request_full();
                KeyMaps::new()
            }
        }
    }
}

/// Replaces one file's entries in one inverted index: keys only in the old
/// map are removed, keys only in the new map are added, keys with an
/// unchanged id list are left alone. Other files' entries are never touched.
pub(crate) fn apply_diff(
    storage: &mut InvertedStorage,
    file_id: FileId,
    old: Option<&KeyMap>,
    new: Option<&KeyMap>,
) -> bool {
    let empty = KeyMap::new();
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);
    let mut changed = false;

    let keys: HashSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        match (old.get(key), new.get(key)) {
            (Some(old_list), Some(new_list)) if old_list == new_list => {}
            (_, Some(new_list)) => {
                storage
                    .entry(key.clone())
                    .or_default()
                    .insert(file_id, new_list.clone());
                changed = true;
            }
            (Some(_), None) => {
                if let Entry::Occupied(mut entry) = storage.entry(key.clone()) {
                    entry.get_mut().remove(&file_id);
                    if entry.get().is_empty() {
                        entry.remove();
                    }
                    changed = true;
                }
            }
            (None, None) => unreachable!("key came from the union of old and new"),
        }
    }
    changed
}
