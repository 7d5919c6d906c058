//! Binary stub tree format.
//!
//! Per file, all roots concatenated:
//!
//! ```text
//! [varint stringTableSize]
//! stringTableSize x ([varint byteLen] utf-8 bytes)
//! [varint rootCount]
//! rootCount x pre-order (string-table ref of external id,
//!                        serializer payload,
//!                        varint childCount,
//!                        children...)
//! ```
//!
//! The string table is file-local: serializer external ids and payload names
//! are stored once per file however many stubs repeat them. The body is
//! written first into a scratch buffer so the table is complete before the
//! header is emitted.

use crate::error::{Result, StubscopeError};
use crate::registry::SerializerRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use stubscope_api::models::ids::StubId;
use stubscope_api::models::stub::StubTree;
use stubscope_api::models::varint;
use stubscope_plugin::{StringEnumerator, StubInput, StubOutput};

/// File-local interning table. Enumerating the same string twice yields the
/// same slot; the table never grows for a repeated value.
#[derive(Default)]
struct StringTable {
    strings: Vec<String>,
    slots: HashMap<String, u32>,
}

impl StringEnumerator for StringTable {
    fn enumerate(&mut self, s: &str) -> u32 {
        if let Some(slot) = self.slots.get(s) {
            return *slot;
        }
        let slot = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.slots.insert(s.to_string(), slot);
        slot
    }
}

pub struct SerializationHelper {
    registry: Arc<SerializerRegistry>,
}

impl SerializationHelper {
    pub fn new(registry: Arc<SerializerRegistry>) -> Self {
        Self { registry }
    }

    pub fn serialize(&self, tree: &StubTree) -> Result<Vec<u8>> {
        let mut table = StringTable::default();
        let mut body = Vec::new();
        for root in tree.roots() {
            self.write_root(tree, *root, &mut body, &mut table)?;
        }

        let mut out = Vec::new();
        varint::write_u64(&mut out, table.strings.len() as u64);
        for s in &table.strings {
            varint::write_u64(&mut out, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        varint::write_u64(&mut out, tree.roots().len() as u64);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Depth-first pre-order encoding of one root, iterative with an
    /// explicit stack.
    fn write_root(
        &self,
        tree: &StubTree,
        root: StubId,
        body: &mut Vec<u8>,
        table: &mut StringTable,
    ) -> Result<()> {
        let mut stack: Vec<StubId> = vec![root];
        while let Some(id) = stack.pop() {
            let stub = tree
                .get(id)
                .ok_or_else(|| StubscopeError::Internal(format!("dangling stub id {id:?}")))?;
            let cap = self.registry.cap(stub.serializer).ok_or_else(|| {
                StubscopeError::Internal(format!(
                    "stub references unregistered serializer {:?}",
                    stub.serializer
                ))
            })?;

            let mut out = StubOutput::new(body, table);
            out.write_name(cap.external_id());
            cap.serialize(stub.payload.as_ref(), &mut out)?;
            out.write_uint(stub.children.len() as u64);

            for child in stub.children.iter().rev() {
                stack.push(*child);
            }
        }
        Ok(())
    }

    /// Rebuilds a stub tree from its persisted bytes. An unknown external id
    /// surfaces as [`StubscopeError::SerializerNotFound`] naming the id it
    /// met, so a corrupted index is diagnosable; callers recover by
    /// re-indexing the file.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<StubTree> {
        let mut pos = 0usize;
        let table_len = varint::read_u64(bytes, &mut pos)?;
        // Each entry takes at least one byte, so a count beyond the remaining
        // input is corrupt; check before trusting it as a capacity.
        if table_len > (bytes.len() - pos) as u64 {
            return Err(StubscopeError::Corrupted(format!(
                "string table count {table_len} exceeds remaining input"
            )));
        }
        let mut strings = Vec::with_capacity(table_len as usize);
        for _ in 0..table_len {
            let len = varint::read_u64(bytes, &mut pos)? as usize;
            let end = pos
                .checked_add(len)
                .filter(|end| *end <= bytes.len())
                .ok_or_else(|| StubscopeError::Corrupted("truncated string table".to_string()))?;
            let s = std::str::from_utf8(&bytes[pos..end])
                .map_err(|e| StubscopeError::Corrupted(format!("invalid utf-8 in string table: {e}")))?;
            strings.push(s.to_string());
            pos = end;
        }
        let root_count = varint::read_u64(bytes, &mut pos)?;

        let mut input = StubInput::new(&bytes[pos..], &strings);
        let mut tree = StubTree::new();
        for _ in 0..root_count {
            self.read_root(&mut tree, &mut input)?;
        }
        if !input.is_exhausted() {
            return Err(StubscopeError::Corrupted(
                "trailing bytes after last stub root".to_string(),
            ));
        }
        Ok(tree)
    }

    fn read_root(&self, tree: &mut StubTree, input: &mut StubInput<'_>) -> Result<()> {
        // (stub, children still to read); mirrors the writer's pre-order.
        let mut stack: Vec<(StubId, u64)> = Vec::new();
        let root = self.read_stub(tree, None, input)?;
        stack.push(root);
        while let Some((parent, remaining)) = stack.last_mut() {
            if *remaining == 0 {
                stack.pop();
                continue;
            }
            *remaining -= 1;
            let parent = *parent;
            let next = self.read_stub(tree, Some(parent), input)?;
            stack.push(next);
        }
        Ok(())
    }

    fn read_stub(
        &self,
        tree: &mut StubTree,
        parent: Option<StubId>,
        input: &mut StubInput<'_>,
    ) -> Result<(StubId, u64)> {
        let external_id = input.read_name()?;
        let serializer =
            self.registry
                .id_of(external_id)
                .ok_or_else(|| StubscopeError::SerializerNotFound {
                    external_id: external_id.to_string(),
                })?;
        let cap = self.registry.cap(serializer).ok_or_else(|| {
            StubscopeError::SerializerNotFound {
                external_id: external_id.to_string(),
            }
        })?;
        let payload = cap.deserialize(input)?;
        let child_count = input.read_uint()?;
        let id = tree.push(parent, serializer, payload, None);
        Ok((id, child_count))
    }
}
