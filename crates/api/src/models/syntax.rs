//! Minimal syntax-tree surface consumed from the parsing front end.
//!
//! Two shapes are supported: the owned [`SyntaxNode`] tree, and the
//! flyweight [`LightTree`] event list for files that never need a full tree
//! materialized. Stub building accepts either and must produce identical
//! output from equivalent input.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxKind(SmolStr);

impl SyntaxKind {
    pub fn new(name: &str) -> Self {
        Self(SmolStr::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// Owned syntax tree node (the "full" tree shape).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub range: TextRange,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, range: TextRange, children: Vec<SyntaxNode>) -> Self {
        Self {
            kind,
            range,
            children,
        }
    }

    pub fn leaf(kind: SyntaxKind, range: TextRange) -> Self {
        Self::new(kind, range, Vec::new())
    }
}

/// Multi-root view of one physical file: the stub binding root plus any
/// embedded-language roots.
#[derive(Debug, Clone)]
pub struct ParsedViews {
    pub primary: SyntaxNode,
    pub secondary: Vec<SyntaxNode>,
}

impl ParsedViews {
    pub fn single(primary: SyntaxNode) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
        }
    }
}

/// Flyweight parse event. `Open`/`Close` bracket composite nodes, `Token`
/// is a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightEvent {
    Open(SyntaxKind, TextRange),
    Token(SyntaxKind, TextRange),
    Close,
}

/// A node in a [`LightTree`]: the index of its `Open` or `Token` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightNode(pub usize);

/// Flat event-list representation of a parse, traversed with cursors
/// instead of materialized nodes.
#[derive(Debug, Clone, Default)]
pub struct LightTree {
    events: Vec<LightEvent>,
}

impl LightTree {
    pub fn from_events(events: Vec<LightEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[LightEvent] {
        &self.events
    }

    pub fn root(&self) -> Option<LightNode> {
        (!self.events.is_empty()).then_some(LightNode(0))
    }

    pub fn kind(&self, node: LightNode) -> &SyntaxKind {
        match &self.events[node.0] {
            LightEvent::Open(kind, _) | LightEvent::Token(kind, _) => kind,
            LightEvent::Close => panic!("close event is not a node"),
        }
    }

    pub fn range(&self, node: LightNode) -> TextRange {
        match &self.events[node.0] {
            LightEvent::Open(_, range) | LightEvent::Token(_, range) => *range,
            LightEvent::Close => panic!("close event is not a node"),
        }
    }

    /// Direct children of `node`, in source order.
    pub fn children(&self, node: LightNode) -> Vec<LightNode> {
        let mut out = Vec::new();
        if matches!(self.events[node.0], LightEvent::Token(..)) {
            return out;
        }
        let mut depth = 0usize;
        let mut i = node.0 + 1;
        while i < self.events.len() {
            match &self.events[i] {
                LightEvent::Open(..) => {
                    if depth == 0 {
                        out.push(LightNode(i));
                    }
                    depth += 1;
                }
                LightEvent::Token(..) => {
                    if depth == 0 {
                        out.push(LightNode(i));
                    }
                }
                LightEvent::Close => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
            }
            i += 1;
        }
        out
    }
}
