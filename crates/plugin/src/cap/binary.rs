use crate::BoxError;
use stubscope_api::models::content::FileContent;
use stubscope_api::models::ids::SerializerId;
use stubscope_api::models::stub::StubTree;

/// Resolves external serializer ids to their process-local small integers.
/// Implemented by the core serializer registry.
pub trait SerializerIds: Send + Sync {
    fn serializer_id(&self, external_id: &str) -> Option<SerializerId>;
}

/// Stub construction straight from file bytes, for file types with no syntax
/// tree (class files, archives, ...).
pub trait BinaryStubCap: Send + Sync {
    /// `Ok(None)` means this particular file carries nothing to index.
    fn build(
        &self,
        content: &FileContent,
        ids: &dyn SerializerIds,
    ) -> Result<Option<StubTree>, BoxError>;
}
