use stubscope_api::models::ids::IndexId;

/// A registered derived index over stub trees: key occurrences are produced
/// by [`crate::StubKindCap::index`] naming this extension's id.
pub trait StubIndexExtensionCap: Send + Sync {
    fn index_id(&self) -> IndexId;

    /// Bump on any change to key derivation; a mismatch against the on-disk
    /// stamp discards that index's data at startup.
    fn version(&self) -> u32;
}
