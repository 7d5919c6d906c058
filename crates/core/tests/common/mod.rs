//! Mock language and host plumbing shared by the integration tests.
//!
//! The "mock" language is line-based: `class Name` and `fn name` declare
//! stubs under the file root, `private ...` wraps a declaration in a
//! subtree excluded from stub building, and a `~` prefix puts the line into
//! an embedded secondary root.

#![allow(dead_code)]

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use stubscope_api::models::content::{ContentSource, FileContent};
use stubscope_api::models::ids::{FileId, FileType, IndexId};
use stubscope_api::models::stub::{EmptyPayload, StubPayload, StubTree};
use stubscope_api::models::syntax::{
    LightEvent, LightNode, LightTree, ParsedViews, SyntaxKind, SyntaxNode, TextRange,
};
use stubscope_core::{RebuildPolicy, StubEngine};
use stubscope_plugin::cap::{
    BinaryStubCap, LanguageStubCap, SerializerIds, StubIndexExtensionCap, StubKindCap,
};
use stubscope_plugin::{
    BinaryStubCaps, BoxError, IndexSink, LanguageStubCaps, StubInput, StubOutput,
};

pub const MOCK_TYPE: &str = "mock";
pub const BLOB_TYPE: &str = "blob";

pub fn name_index() -> IndexId {
    IndexId::new("mock.names")
}

pub fn class_index() -> IndexId {
    IndexId::new("mock.classes")
}

#[derive(Debug, PartialEq, Eq)]
pub struct NamePayload {
    pub name: String,
}

impl StubPayload for NamePayload {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn payload_name(payload: &dyn StubPayload) -> Option<&str> {
    payload
        .as_any()
        .downcast_ref::<NamePayload>()
        .map(|p| p.name.as_str())
}

// ---- parsing ----

pub fn parse_mock(text: &str) -> ParsedViews {
    let mut primary = Vec::new();
    let mut secondary = Vec::new();
    let mut offset = 0usize;
    for piece in text.split_inclusive('\n') {
        let line_start = offset;
        offset += piece.len();
        let content = piece.trim_end_matches('\n');
        let (bucket, body, body_start) = match content.strip_prefix('~') {
            Some(rest) => (&mut secondary, rest, line_start + 1),
            None => (&mut primary, content, line_start),
        };
        if let Some(node) = parse_decl(body, body_start as u32) {
            bucket.push(node);
        }
    }

    let end = text.len() as u32;
    let secondary = if secondary.is_empty() {
        Vec::new()
    } else {
        vec![SyntaxNode::new(
            SyntaxKind::new("file"),
            TextRange::new(0, end),
            secondary,
        )]
    };
    ParsedViews {
        primary: SyntaxNode::new(SyntaxKind::new("file"), TextRange::new(0, end), primary),
        secondary,
    }
}

fn parse_decl(body: &str, start: u32) -> Option<SyntaxNode> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (head, rest) = trimmed.split_once(' ')?;
    let rest = rest.trim();
    let rest_start = start + body.rfind(rest)? as u32;
    let node_range = TextRange::new(start, start + body.len() as u32);
    match head {
        "class" | "fn" => {
            let name_node = SyntaxNode::leaf(
                SyntaxKind::new("name"),
                TextRange::new(rest_start, rest_start + rest.len() as u32),
            );
            Some(SyntaxNode::new(SyntaxKind::new(head), node_range, vec![name_node]))
        }
        "private" => parse_decl(rest, rest_start).map(|inner| {
            SyntaxNode::new(SyntaxKind::new("private"), node_range, vec![inner])
        }),
        _ => None,
    }
}

/// Converts a full tree into the equivalent flyweight event list.
pub fn to_light(root: &SyntaxNode) -> LightTree {
    fn walk(node: &SyntaxNode, events: &mut Vec<LightEvent>) {
        if node.children.is_empty() && node.kind.as_str() == "name" {
            events.push(LightEvent::Token(node.kind.clone(), node.range));
            return;
        }
        events.push(LightEvent::Open(node.kind.clone(), node.range));
        for child in &node.children {
            walk(child, events);
        }
        events.push(LightEvent::Close);
    }
    let mut events = Vec::new();
    walk(root, &mut events);
    LightTree::from_events(events)
}

// ---- stub kinds ----

fn name_from_node(node: &SyntaxNode, text: &str) -> String {
    node.children
        .iter()
        .find(|c| c.kind.as_str() == "name")
        .map(|c| text[c.range.start as usize..c.range.end as usize].to_string())
        .unwrap_or_default()
}

fn name_from_light(tree: &LightTree, node: LightNode, text: &str) -> String {
    tree.children(node)
        .into_iter()
        .find(|c| tree.kind(*c).as_str() == "name")
        .map(|c| {
            let range = tree.range(c);
            text[range.start as usize..range.end as usize].to_string()
        })
        .unwrap_or_default()
}

fn write_named(payload: &dyn StubPayload, out: &mut StubOutput<'_>) -> Result<(), BoxError> {
    let named = payload
        .as_any()
        .downcast_ref::<NamePayload>()
        .ok_or("unexpected payload type")?;
    out.write_name(&named.name);
    Ok(())
}

fn read_named(input: &mut StubInput<'_>) -> Result<Arc<dyn StubPayload>, BoxError> {
    let name = input.read_name()?.to_string();
    Ok(Arc::new(NamePayload { name }))
}

pub struct FileKindCap;

impl StubKindCap for FileKindCap {
    fn external_id(&self) -> &str {
        "mock.file"
    }
    fn payload_from_node(&self, _: &SyntaxNode, _: &str) -> Arc<dyn StubPayload> {
        Arc::new(EmptyPayload)
    }
    fn payload_from_light(&self, _: &LightTree, _: LightNode, _: &str) -> Arc<dyn StubPayload> {
        Arc::new(EmptyPayload)
    }
    fn serialize(&self, _: &dyn StubPayload, _: &mut StubOutput<'_>) -> Result<(), BoxError> {
        Ok(())
    }
    fn deserialize(&self, _: &mut StubInput<'_>) -> Result<Arc<dyn StubPayload>, BoxError> {
        Ok(Arc::new(EmptyPayload))
    }
    fn index(&self, _: &dyn StubPayload, _: &mut dyn IndexSink) {}
}

pub struct ClassKindCap;

impl StubKindCap for ClassKindCap {
    fn external_id(&self) -> &str {
        "mock.class"
    }
    fn payload_from_node(&self, node: &SyntaxNode, text: &str) -> Arc<dyn StubPayload> {
        Arc::new(NamePayload {
            name: name_from_node(node, text),
        })
    }
    fn payload_from_light(
        &self,
        tree: &LightTree,
        node: LightNode,
        text: &str,
    ) -> Arc<dyn StubPayload> {
        Arc::new(NamePayload {
            name: name_from_light(tree, node, text),
        })
    }
    fn serialize(&self, payload: &dyn StubPayload, out: &mut StubOutput<'_>) -> Result<(), BoxError> {
        write_named(payload, out)
    }
    fn deserialize(&self, input: &mut StubInput<'_>) -> Result<Arc<dyn StubPayload>, BoxError> {
        read_named(input)
    }
    fn index(&self, payload: &dyn StubPayload, sink: &mut dyn IndexSink) {
        if let Some(name) = payload_name(payload) {
            sink.occurrence(&name_index(), name);
            sink.occurrence(&class_index(), name);
        }
    }
}

pub struct FnKindCap;

impl StubKindCap for FnKindCap {
    fn external_id(&self) -> &str {
        "mock.fn"
    }
    fn payload_from_node(&self, node: &SyntaxNode, text: &str) -> Arc<dyn StubPayload> {
        Arc::new(NamePayload {
            name: name_from_node(node, text),
        })
    }
    fn payload_from_light(
        &self,
        tree: &LightTree,
        node: LightNode,
        text: &str,
    ) -> Arc<dyn StubPayload> {
        Arc::new(NamePayload {
            name: name_from_light(tree, node, text),
        })
    }
    fn serialize(&self, payload: &dyn StubPayload, out: &mut StubOutput<'_>) -> Result<(), BoxError> {
        write_named(payload, out)
    }
    fn deserialize(&self, input: &mut StubInput<'_>) -> Result<Arc<dyn StubPayload>, BoxError> {
        read_named(input)
    }
    fn index(&self, payload: &dyn StubPayload, sink: &mut dyn IndexSink) {
        if let Some(name) = payload_name(payload) {
            sink.occurrence(&name_index(), name);
        }
    }
}

pub struct BlobKindCap;

impl StubKindCap for BlobKindCap {
    fn external_id(&self) -> &str {
        "mock.blob"
    }
    fn payload_from_node(&self, _: &SyntaxNode, _: &str) -> Arc<dyn StubPayload> {
        Arc::new(EmptyPayload)
    }
    fn payload_from_light(&self, _: &LightTree, _: LightNode, _: &str) -> Arc<dyn StubPayload> {
        Arc::new(EmptyPayload)
    }
    fn serialize(&self, payload: &dyn StubPayload, out: &mut StubOutput<'_>) -> Result<(), BoxError> {
        write_named(payload, out)
    }
    fn deserialize(&self, input: &mut StubInput<'_>) -> Result<Arc<dyn StubPayload>, BoxError> {
        read_named(input)
    }
    fn index(&self, payload: &dyn StubPayload, sink: &mut dyn IndexSink) {
        if let Some(name) = payload_name(payload) {
            sink.occurrence(&name_index(), name);
        }
    }
}

// ---- language / binary caps ----

pub struct MockLang {
    light: bool,
    parses: Arc<AtomicUsize>,
    kinds: HashMap<&'static str, Arc<dyn StubKindCap>>,
}

impl MockLang {
    pub fn new(light: bool, parses: Arc<AtomicUsize>) -> Self {
        let mut kinds: HashMap<&'static str, Arc<dyn StubKindCap>> = HashMap::new();
        kinds.insert("file", Arc::new(FileKindCap));
        kinds.insert("class", Arc::new(ClassKindCap));
        kinds.insert("fn", Arc::new(FnKindCap));
        Self {
            light,
            parses,
            kinds,
        }
    }
}

impl LanguageStubCap for MockLang {
    fn parse_views(&self, text: &str) -> Result<ParsedViews, BoxError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        Ok(parse_mock(text))
    }

    fn parse_light(&self, text: &str) -> Option<LightTree> {
        // Multi-root files need the full view parse.
        if !self.light || text.contains('~') {
            return None;
        }
        self.parses.fetch_add(1, Ordering::SeqCst);
        Some(to_light(&parse_mock(text).primary))
    }

    fn stub_kind(&self, kind: &SyntaxKind) -> Option<Arc<dyn StubKindCap>> {
        self.kinds.get(kind.as_str()).cloned()
    }

    fn skip_child_processing(&self, parent: &SyntaxKind, _child: &SyntaxKind) -> bool {
        parent.as_str() == "private"
    }
}

pub fn mock_caps_with(light: bool, stub_version: u32) -> (LanguageStubCaps, Arc<AtomicUsize>) {
    let parses = Arc::new(AtomicUsize::new(0));
    let caps = LanguageStubCaps {
        file_type: FileType::new(MOCK_TYPE),
        stub_version,
        cap: Arc::new(MockLang::new(light, parses.clone())),
        stub_kinds: vec![
            Arc::new(FileKindCap),
            Arc::new(ClassKindCap),
            Arc::new(FnKindCap),
        ],
    };
    (caps, parses)
}

pub fn mock_caps(light: bool) -> (LanguageStubCaps, Arc<AtomicUsize>) {
    mock_caps_with(light, 1)
}

pub struct MockBinary;

impl BinaryStubCap for MockBinary {
    fn build(
        &self,
        content: &FileContent,
        ids: &dyn SerializerIds,
    ) -> Result<Option<StubTree>, BoxError> {
        let name = String::from_utf8_lossy(content.as_bytes()).trim().to_string();
        if name.is_empty() {
            return Ok(None);
        }
        let serializer = ids
            .serializer_id("mock.blob")
            .ok_or("blob serializer not registered")?;
        let mut tree = StubTree::new();
        tree.push(None, serializer, Arc::new(NamePayload { name }), None);
        Ok(Some(tree))
    }
}

pub fn blob_caps() -> BinaryStubCaps {
    BinaryStubCaps {
        file_type: FileType::new(BLOB_TYPE),
        stub_version: 1,
        cap: Arc::new(MockBinary),
        stub_kinds: vec![Arc::new(BlobKindCap)],
    }
}

// ---- extensions ----

pub struct MockExtension {
    pub id: IndexId,
    pub version: u32,
}

impl StubIndexExtensionCap for MockExtension {
    fn index_id(&self) -> IndexId {
        self.id.clone()
    }
    fn version(&self) -> u32 {
        self.version
    }
}

// ---- content source ----

#[derive(Default)]
pub struct MemorySource {
    files: RwLock<HashMap<FileId, Arc<FileContent>>>,
}

impl MemorySource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, content: Arc<FileContent>) {
        self.files.write().unwrap().insert(content.file_id, content);
    }

    pub fn remove(&self, id: FileId) {
        self.files.write().unwrap().remove(&id);
    }
}

impl ContentSource for MemorySource {
    fn all_files(&self) -> Vec<Arc<FileContent>> {
        let mut files: Vec<_> = self.files.read().unwrap().values().cloned().collect();
        files.sort_by_key(|f| f.file_id);
        files
    }

    fn file(&self, id: FileId) -> Option<Arc<FileContent>> {
        self.files.read().unwrap().get(&id).cloned()
    }
}

pub fn mock_file(id: u32, text: &str) -> Arc<FileContent> {
    Arc::new(FileContent::text(
        FileId(id),
        PathBuf::from(format!("/src/f{id}.mock")),
        FileType::new(MOCK_TYPE),
        text,
    ))
}

pub fn blob_file(id: u32, bytes: &[u8]) -> Arc<FileContent> {
    Arc::new(FileContent::binary(
        FileId(id),
        PathBuf::from(format!("/lib/b{id}.blob")),
        FileType::new(BLOB_TYPE),
        bytes.to_vec(),
    ))
}

// ---- engine assembly ----

pub fn build_engine(
    dir: &Path,
    source: Arc<MemorySource>,
    light: bool,
    policy: RebuildPolicy,
) -> (StubEngine, Arc<AtomicUsize>) {
    build_engine_versions(dir, source, light, policy, 1, 1)
}

pub fn build_engine_versions(
    dir: &Path,
    source: Arc<MemorySource>,
    light: bool,
    policy: RebuildPolicy,
    lang_version: u32,
    ext_version: u32,
) -> (StubEngine, Arc<AtomicUsize>) {
    let (caps, parses) = mock_caps_with(light, lang_version);
    let engine = StubEngine::builder(dir.to_path_buf(), source)
        .with_language_caps(caps)
        .with_binary_caps(blob_caps())
        .with_extension(Arc::new(MockExtension {
            id: name_index(),
            version: ext_version,
        }))
        .with_extension(Arc::new(MockExtension {
            id: class_index(),
            version: ext_version,
        }))
        .with_rebuild_policy(policy)
        .build()
        .unwrap();
    (engine, parses)
}
