use crate::BoxError;
use crate::cap::stub_kind::StubKindCap;
use stubscope_api::models::syntax::{LightTree, ParsedViews, SyntaxKind};
use std::sync::Arc;

pub trait LanguageStubCap: Send + Sync {
    /// Parse all language views of the file: the stub binding root first,
    /// then any embedded-language roots.
    fn parse_views(&self, text: &str) -> Result<ParsedViews, BoxError>;

    /// Flyweight parse, when the language supports one. `None` falls back to
    /// `parse_views`.
    fn parse_light(&self, _text: &str) -> Option<LightTree> {
        None
    }

    /// The stub opt-in: kinds without a capability are transparent during
    /// building (their children still attach to the nearest stubbed
    /// ancestor).
    fn stub_kind(&self, kind: &SyntaxKind) -> Option<Arc<dyn StubKindCap>>;

    /// Excludes an entire subtree from stub building. Honored identically by
    /// the full-tree and light-tree builders.
    fn skip_child_processing(&self, _parent: &SyntaxKind, _child: &SyntaxKind) -> bool {
        false
    }
}
