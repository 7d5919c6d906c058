//! Process-global serializer registry.
//!
//! External serializer ids (stable strings) are mapped to small integers
//! once per process; stubs carry only the integer. Registration is an
//! explicit startup phase: the engine builder registers every stub kind of
//! every capability before any building or deserialization starts.

use dashmap::DashMap;
use std::sync::{Arc, RwLock};
use stubscope_api::models::ids::SerializerId;
use stubscope_plugin::cap::{SerializerIds, StubKindCap};

#[derive(Default)]
pub struct SerializerRegistry {
    by_external: DashMap<String, SerializerId>,
    caps: RwLock<Vec<Arc<dyn StubKindCap>>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stub kind, assigning its process-local id. Idempotent for
    /// an already-known external id.
    pub fn register(&self, cap: Arc<dyn StubKindCap>) -> SerializerId {
        let external = cap.external_id().to_string();
        *self.by_external.entry(external).or_insert_with(|| {
            let mut caps = self.caps.write().unwrap();
            let id = SerializerId(caps.len() as u32);
            caps.push(cap);
            id
        })
    }

    pub fn id_of(&self, external_id: &str) -> Option<SerializerId> {
        self.by_external.get(external_id).map(|entry| *entry)
    }

    pub fn cap(&self, id: SerializerId) -> Option<Arc<dyn StubKindCap>> {
        self.caps.read().unwrap().get(id.0 as usize).cloned()
    }

    pub fn external_id(&self, id: SerializerId) -> Option<String> {
        self.cap(id).map(|cap| cap.external_id().to_string())
    }

    /// Name for diagnostics; never fails, unknown ids render as `#n`.
    pub fn name_of(&self, id: SerializerId) -> String {
        self.external_id(id)
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    pub fn len(&self) -> usize {
        self.caps.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SerializerIds for SerializerRegistry {
    fn serializer_id(&self, external_id: &str) -> Option<SerializerId> {
        self.id_of(external_id)
    }
}
