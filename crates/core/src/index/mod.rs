//! The stub index engine: one forward index of serialized stub trees plus
//! one derived inverted index per registered extension, updated together.

pub mod engine;
pub mod rebuild;
pub mod updating;

pub use rebuild::RebuildPolicy;

use crate::error::{Result, StubscopeError};
use crate::registry::SerializerRegistry;
use crate::serialize::SerializationHelper;
use crate::storage::{FileIdRegistry, OpenOutcome, SerializedStubTree, VersionedMapStorage};
use crate::tree::orchestrator::StubTreeFactory;
use rebuild::RebuildScheduler;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use stubscope_api::models::content::{ContentSource, FileContent};
use stubscope_api::models::id_list::StubIdList;
use stubscope_api::models::ids::{FileId, FileType, IndexId};
use stubscope_plugin::cap::StubIndexExtensionCap;
use stubscope_plugin::{BinaryStubCaps, LanguageStubCaps};

/// Base constant folded into the combined updating-index version; bump on
/// any change to the stub wire format itself.
const BASE_VERSION: u32 = 4;

pub(crate) type KeyMap = HashMap<String, StubIdList>;
pub(crate) type KeyMaps = HashMap<IndexId, KeyMap>;
pub(crate) type InvertedStorage = VersionedMapStorage<String, HashMap<FileId, StubIdList>>;
pub(crate) type ForwardStorage = VersionedMapStorage<FileId, SerializedStubTree>;

pub(crate) struct ExtensionSlot {
    pub(crate) id: IndexId,
    pub(crate) storage: RwLock<InvertedStorage>,
}

pub(crate) enum PendingChange {
    Update(Arc<FileContent>),
    Remove(FileId),
}

pub struct StubEngine {
    pub(crate) registry: Arc<SerializerRegistry>,
    pub(crate) helper: SerializationHelper,
    pub(crate) factory: StubTreeFactory,
    /// Sorted by index id; this order is the lock acquisition order for
    /// every multi-index critical section.
    pub(crate) extensions: Vec<ExtensionSlot>,
    pub(crate) forward: RwLock<ForwardStorage>,
    pub(crate) file_ids: FileIdRegistry,
    pub(crate) source: Arc<dyn ContentSource>,
    pub(crate) scheduler: RebuildScheduler,
    pub(crate) policy: RebuildPolicy,
    pub(crate) pending: Mutex<Vec<PendingChange>>,
}

impl StubEngine {
    pub fn builder(index_dir: PathBuf, source: Arc<dyn ContentSource>) -> StubEngineBuilder {
        StubEngineBuilder {
            index_dir,
            source,
            lang_caps: Vec::new(),
            bin_caps: Vec::new(),
            extensions: Vec::new(),
            policy: RebuildPolicy::Deferred,
        }
    }

    pub fn registry(&self) -> &Arc<SerializerRegistry> {
        &self.registry
    }

    pub fn file_ids(&self) -> &FileIdRegistry {
        &self.file_ids
    }

    pub(crate) fn slot(&self, index: &IndexId) -> Result<&ExtensionSlot> {
        self.extensions
            .iter()
            .find(|slot| &slot.id == index)
            .ok_or_else(|| StubscopeError::Internal(format!("unknown stub index `{index}`")))
    }
}

pub struct StubEngineBuilder {
    index_dir: PathBuf,
    source: Arc<dyn ContentSource>,
    lang_caps: Vec<LanguageStubCaps>,
    bin_caps: Vec<BinaryStubCaps>,
    extensions: Vec<Arc<dyn StubIndexExtensionCap>>,
    policy: RebuildPolicy,
}

impl StubEngineBuilder {
    pub fn with_language_caps(mut self, caps: LanguageStubCaps) -> Self {
        self.lang_caps.push(caps);
        self
    }

    pub fn with_binary_caps(mut self, caps: BinaryStubCaps) -> Self {
        self.bin_caps.push(caps);
        self
    }

    pub fn with_extension(mut self, extension: Arc<dyn StubIndexExtensionCap>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn with_rebuild_policy(mut self, policy: RebuildPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<StubEngine> {
        // Startup phase: every serializer gets its process-local id before
        // any building or deserialization can run.
        let registry = Arc::new(SerializerRegistry::new());
        for caps in &self.lang_caps {
            for kind in &caps.stub_kinds {
                registry.register(kind.clone());
            }
        }
        for caps in &self.bin_caps {
            for kind in &caps.stub_kinds {
                registry.register(kind.clone());
            }
        }

        // Adding or bumping any one language's stub format invalidates the
        // whole combined index.
        let combined_version = BASE_VERSION
            + self
                .lang_caps
                .iter()
                .map(|c| c.stub_version)
                .chain(self.bin_caps.iter().map(|c| c.stub_version))
                .sum::<u32>();

        let mut lang_map = HashMap::new();
        for caps in self.lang_caps {
            lang_map.insert(caps.file_type.clone(), caps);
        }
        let mut bin_map = HashMap::new();
        for caps in self.bin_caps {
            bin_map.insert(caps.file_type.clone(), caps);
        }

        let mut needs_rebuild = false;

        let mut extension_caps = self.extensions;
        extension_caps.sort_by_key(|cap| cap.index_id());
        let mut extensions = Vec::with_capacity(extension_caps.len());
        for cap in extension_caps {
            let id = cap.index_id();
            let dir = self.index_dir.join("indexes").join(id.as_str());
            let (storage, outcome) = InvertedStorage::open(dir, cap.version())?;
            if outcome == OpenOutcome::VersionMismatch {
                needs_rebuild = true;
            }
            extensions.push(ExtensionSlot {
                id,
                storage: RwLock::new(storage),
            });
        }

        let (forward, outcome) =
            ForwardStorage::open(self.index_dir.join("stubs"), combined_version)?;
        if outcome == OpenOutcome::VersionMismatch {
            needs_rebuild = true;
        }

        let file_ids = FileIdRegistry::open(self.index_dir.join("file_ids.bin"))?;

        let engine = StubEngine {
            helper: SerializationHelper::new(registry.clone()),
            factory: StubTreeFactory::new(registry.clone(), lang_map, bin_map),
            registry,
            extensions,
            forward: RwLock::new(forward),
            file_ids,
            source: self.source,
            scheduler: RebuildScheduler::default(),
            policy: self.policy,
            pending: Mutex::new(Vec::new()),
        };

        if needs_rebuild {
            engine.scheduler.request_full();
            if engine.policy == RebuildPolicy::Immediate {
                engine.flush_rebuilds()?;
            }
        }
        Ok(engine)
    }
}
