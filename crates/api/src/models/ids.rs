use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Stable small integer identifying a file in the index storages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// Position of a stub within its file's flat pre-order stub list.
///
/// This is the cross-reference unit stored in persisted index entries:
/// two builds of byte-identical content assign identical stub ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StubId(pub u32);

impl StubId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Process-global small integer naming a registered stub serializer.
///
/// Assigned once per process by the serializer registry; never persisted
/// directly (the on-disk format stores the external id string instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializerId(pub u32);

/// Name of a derived stub index (one per registered extension).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexId(SmolStr);

impl IndexId {
    pub fn new(name: &str) -> Self {
        Self(SmolStr::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for IndexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// File type tag used to dispatch to a language or binary stub capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileType(SmolStr);

impl FileType {
    pub fn new(name: &str) -> Self {
        Self(SmolStr::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}
