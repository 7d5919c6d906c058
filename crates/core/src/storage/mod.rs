pub mod file_ids;
pub mod versioned;

pub use file_ids::FileIdRegistry;
pub use versioned::{OpenOutcome, VersionedMapStorage};

use serde::{Deserialize, Serialize};

/// Persisted per-file value of the updating index: the raw stub tree bytes
/// plus the length and content stamp used for staleness checks. The tree is
/// materialized from `bytes` only on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedStubTree {
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
    pub text_len: u64,
    pub content_stamp: u64,
}
