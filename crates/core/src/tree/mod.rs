pub mod build;
pub mod orchestrator;

pub use build::{DefaultStubBuilder, LightStubBuilder};
pub use orchestrator::StubTreeFactory;
