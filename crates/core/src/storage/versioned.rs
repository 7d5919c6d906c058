//! Minimal versioned, file-keyed persistent map.
//!
//! One directory per index, one rmp-encoded data file inside it, the
//! declared version stamped into the file. A version mismatch at open
//! discards the stale data and reports it, so the owning index can raise its
//! needs-rebuild flag; first-time creation is reported separately and
//! triggers no rebuild.

use crate::error::{Result, StubscopeError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;

const DATA_FILE: &str = "data.bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// No pre-existing data; fresh build, no rebuild flag.
    Fresh,
    /// Existing data loaded at the current version.
    Loaded,
    /// Pre-existing data was stale (version mismatch or unreadable) and has
    /// been discarded; the owner must schedule a rebuild.
    VersionMismatch,
}

#[derive(Serialize, serde::Deserialize)]
#[serde(bound(deserialize = "K: DeserializeOwned + Eq + Hash, V: DeserializeOwned"))]
struct DataFile<K: Eq + Hash, V> {
    version: u32,
    map: HashMap<K, V>,
}

#[derive(Serialize)]
struct DataFileRef<'a, K: Eq + Hash + Serialize, V: Serialize> {
    version: u32,
    map: &'a HashMap<K, V>,
}

pub struct VersionedMapStorage<K, V> {
    dir: PathBuf,
    version: u32,
    map: HashMap<K, V>,
}

impl<K, V> VersionedMapStorage<K, V>
where
    K: Eq + Hash + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    pub fn open(dir: PathBuf, version: u32) -> Result<(Self, OpenOutcome)> {
        std::fs::create_dir_all(&dir)?;
        let data_path = dir.join(DATA_FILE);
        if !data_path.exists() {
            let storage = Self {
                dir,
                version,
                map: HashMap::new(),
            };
            return Ok((storage, OpenOutcome::Fresh));
        }

        let bytes = std::fs::read(&data_path)?;
        let outcome = match rmp_serde::from_slice::<DataFile<K, V>>(&bytes) {
            Ok(file) if file.version == version => {
                let storage = Self {
                    dir,
                    version,
                    map: file.map,
                };
                return Ok((storage, OpenOutcome::Loaded));
            }
            Ok(file) => {
                tracing::warn!(
                    path = %data_path.display(),
                    found = file.version,
                    expected = version,
                    "index version mismatch, discarding on-disk data"
                );
                OpenOutcome::VersionMismatch
            }
            Err(e) => {
                tracing::warn!(
                    path = %data_path.display(),
                    error = %e,
                    "unreadable index data, discarding"
                );
                OpenOutcome::VersionMismatch
            }
        };

        std::fs::remove_file(&data_path)?;
        let storage = Self {
            dir,
            version,
            map: HashMap::new(),
        };
        Ok((storage, outcome))
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn entry(&mut self, key: K) -> std::collections::hash_map::Entry<'_, K, V> {
        self.map.entry(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    /// Atomic persist: write to a temp file, then rename over the data file.
    pub fn save(&self) -> Result<()> {
        let file = DataFileRef {
            version: self.version,
            map: &self.map,
        };
        let bytes = rmp_serde::to_vec(&file)
            .map_err(|e| StubscopeError::Storage(format!("encode failed: {e}")))?;
        let data_path = self.dir.join(DATA_FILE);
        let temp_path = data_path.with_extension("tmp");
        std::fs::write(&temp_path, bytes)?;
        std::fs::rename(temp_path, data_path)?;
        Ok(())
    }
}
