use crate::cap::{BinaryStubCap, LanguageStubCap, StubKindCap};
use stubscope_api::models::ids::FileType;
use std::sync::Arc;

#[derive(Clone)]
pub struct LanguageStubCaps {
    pub file_type: FileType,
    /// Per-language stub format version; summed into the updating index's
    /// combined version.
    pub stub_version: u32,
    pub cap: Arc<dyn LanguageStubCap>,
    /// Every stub kind this language can emit, registered with the
    /// serializer registry before any building starts.
    pub stub_kinds: Vec<Arc<dyn StubKindCap>>,
}

#[derive(Clone)]
pub struct BinaryStubCaps {
    pub file_type: FileType,
    pub stub_version: u32,
    pub cap: Arc<dyn BinaryStubCap>,
    pub stub_kinds: Vec<Arc<dyn StubKindCap>>,
}
