use crate::BoxError;
use crate::sink::IndexSink;
use crate::stream::{StubInput, StubOutput};
use stubscope_api::models::stub::StubPayload;
use stubscope_api::models::syntax::{LightNode, LightTree, SyntaxNode};
use std::sync::Arc;

/// One stub-bearing syntax kind: how its payload is extracted, persisted and
/// fed to the derived indexes.
///
/// `payload_from_node` and `payload_from_light` must agree: equivalent full
/// and flyweight parses of the same text yield equal payloads. The stub
/// builders rely on this symmetry.
pub trait StubKindCap: Send + Sync {
    /// Stable name stored in the on-disk format; never reuse a retired one.
    fn external_id(&self) -> &str;

    fn payload_from_node(&self, node: &SyntaxNode, text: &str) -> Arc<dyn StubPayload>;

    fn payload_from_light(
        &self,
        tree: &LightTree,
        node: LightNode,
        text: &str,
    ) -> Arc<dyn StubPayload>;

    fn serialize(&self, payload: &dyn StubPayload, out: &mut StubOutput<'_>)
    -> Result<(), BoxError>;

    fn deserialize(&self, input: &mut StubInput<'_>) -> Result<Arc<dyn StubPayload>, BoxError>;

    /// Emit (index, key) occurrences for the derived stub indexes.
    fn index(&self, payload: &dyn StubPayload, sink: &mut dyn IndexSink);
}
