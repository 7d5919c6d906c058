//! Stub indexing engine: builds lightweight stub trees from parsed files,
//! persists them in a versioned binary format and maintains derived
//! key → stub-id indexes for project-wide lookups.

pub mod error;
pub mod index;
pub mod logging;
pub mod registry;
pub mod serialize;
pub mod storage;
pub mod tree;

mod processing;

pub use error::{Result, StubscopeError};
pub use index::{RebuildPolicy, StubEngine, StubEngineBuilder};
pub use registry::SerializerRegistry;
pub use serialize::SerializationHelper;
pub use tree::orchestrator::StubTreeFactory;
