pub mod content;
pub mod id_list;
pub mod ids;
pub mod scope;
pub mod stub;
pub mod syntax;
pub mod varint;

pub use content::{ContentSource, FileContent, FileData};
pub use id_list::StubIdList;
pub use ids::{FileId, FileType, IndexId, SerializerId, StubId};
pub use scope::{IdFilter, SearchScope};
pub use stub::{EmptyPayload, ResolvedStub, SourceRef, StubData, StubPayload, StubTree};
pub use syntax::{LightEvent, LightNode, LightTree, ParsedViews, SyntaxKind, SyntaxNode, TextRange};
