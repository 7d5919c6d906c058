//! Capability traits a language or binary file type implements to take part
//! in stub indexing, plus the serializer stream types they encode through.

pub mod cap;
pub mod registration;
pub mod sink;
pub mod stream;

pub use cap::*;
pub use registration::{BinaryStubCaps, LanguageStubCaps};
pub use sink::IndexSink;
pub use stream::{StringEnumerator, StubInput, StubOutput};

/// Error type plugin capabilities report through; converted at the core
/// boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
