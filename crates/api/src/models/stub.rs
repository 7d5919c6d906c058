//! The stub tree: a lightweight, index-oriented projection of a parsed file.
//!
//! Stubs live in a single arena held by [`StubTree`]; arena order is the
//! canonical flat pre-order list, so an arena index doubles as the stub id
//! persisted in index entries. Parent and child links are arena indices,
//! never owning edges.

use crate::models::ids::{SerializerId, StubId};
use crate::models::syntax::{SyntaxKind, TextRange};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Serializer-specific data carried by a stub.
pub trait StubPayload: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Payload for stub kinds that carry no data of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyPayload;

impl StubPayload for EmptyPayload {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The syntax node a stub was built from. Present only on content-built
/// trees; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct StubData {
    pub serializer: SerializerId,
    pub payload: Arc<dyn StubPayload>,
    pub parent: Option<StubId>,
    pub children: Vec<StubId>,
    pub source: Option<SourceRef>,
}

#[derive(Debug, Default)]
pub struct StubTree {
    stubs: Vec<StubData>,
    roots: Vec<StubId>,
}

impl StubTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stub under `parent`. Callers must append in pre-order so
    /// that arena position and stub id coincide; both builders and the
    /// deserializer do.
    pub fn push(
        &mut self,
        parent: Option<StubId>,
        serializer: SerializerId,
        payload: Arc<dyn StubPayload>,
        source: Option<SourceRef>,
    ) -> StubId {
        let id = StubId(self.stubs.len() as u32);
        self.stubs.push(StubData {
            serializer,
            payload,
            parent,
            children: Vec::new(),
            source,
        });
        match parent {
            Some(p) => self.stubs[p.index()].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: StubId) -> Option<&StubData> {
        self.stubs.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    /// Root stubs, one per file view root. Root 0 is the stub binding root.
    pub fn roots(&self) -> &[StubId] {
        &self.roots
    }

    /// The flat pre-order list across all roots.
    pub fn plain_list(&self) -> &[StubData] {
        &self.stubs
    }

    /// Concatenates per-root trees into one combined tree, offsetting ids so
    /// the flat lists are laid out back to back. The first tree's root stays
    /// root 0.
    pub fn merge(trees: Vec<StubTree>) -> StubTree {
        let mut merged = StubTree::new();
        for tree in trees {
            let offset = merged.stubs.len() as u32;
            for root in &tree.roots {
                merged.roots.push(StubId(root.0 + offset));
            }
            for stub in tree.stubs {
                merged.stubs.push(StubData {
                    serializer: stub.serializer,
                    payload: stub.payload,
                    parent: stub.parent.map(|p| StubId(p.0 + offset)),
                    children: stub.children.iter().map(|c| StubId(c.0 + offset)).collect(),
                    source: stub.source,
                });
            }
        }
        merged
    }

    /// Indented dump used by mismatch diagnostics. `name_of` resolves a
    /// serializer id to its external name.
    pub fn debug_dump(&self, name_of: &dyn Fn(SerializerId) -> String) -> String {
        let mut out = String::new();
        for (i, stub) in self.stubs.iter().enumerate() {
            let mut depth = 0;
            let mut cursor = stub.parent;
            while let Some(p) = cursor {
                depth += 1;
                cursor = self.stubs[p.index()].parent;
            }
            for _ in 0..depth {
                out.push_str("  ");
            }
            out.push_str(&format!(
                "#{i} {} {:?}\n",
                name_of(stub.serializer),
                stub.payload
            ));
        }
        out
    }
}

/// An index hit resolved back to a stub, handed to query processors.
#[derive(Debug, Clone)]
pub struct ResolvedStub {
    pub file_id: crate::models::ids::FileId,
    pub stub_id: StubId,
    pub external_id: String,
    pub payload: Arc<dyn StubPayload>,
    pub source: Option<SourceRef>,
}
