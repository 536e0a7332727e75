//! Photo list persistence.
//!
//! The scene only consumes a list of image references. Sharing a list goes
//! through a [`PhotoStore`] keyed by short random ids; named presets live in
//! a local [`PresetLibrary`].

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generators::scene_rng;

/// Opaque reference to one image (URL, data URL or path).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PhotoRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Record identifier: nine lowercase base-36 characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub const LEN: usize = 9;

    pub fn random(rng: &mut impl Rng) -> Self {
        let id = (0..Self::LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Accepts only well-formed ids; anything else cannot name a record.
    pub fn parse(id: &str) -> Option<Self> {
        let valid = id.len() == Self::LEN && id.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase());
        valid.then(|| Self(id.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no photo list stored under id {0:?}")]
    NotFound(String),
    #[error("photo store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored photo list is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Key-value storage of photo lists.
pub trait PhotoStore {
    /// Store a copy of `photos` under a fresh id.
    fn save(&mut self, photos: &[PhotoRef]) -> Result<StoreId, StoreError>;

    /// Fetch the list stored under `id`. Unknown ids yield [`StoreError::NotFound`].
    fn load(&self, id: &str) -> Result<Vec<PhotoRef>, StoreError>;
}

/// Hands out queued ids first, then random ones.
#[derive(Debug)]
struct IdSource {
    queued: VecDeque<StoreId>,
    rng: StdRng,
}

impl Default for IdSource {
    fn default() -> Self {
        Self {
            queued: VecDeque::new(),
            rng: scene_rng(None),
        }
    }
}

impl IdSource {
    fn next_unused(&mut self, taken: impl Fn(&StoreId) -> bool) -> StoreId {
        loop {
            let id = self
                .queued
                .pop_front()
                .unwrap_or_else(|| StoreId::random(&mut self.rng));
            if !taken(&id) {
                return id;
            }
            log::debug!("Store id {} already taken, drawing another", id);
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryPhotoStore {
    records: HashMap<StoreId, Vec<PhotoRef>>,
    ids: IdSource,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given ids, in order, before falling back to random ones.
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = StoreId>) -> Self {
        self.ids.queued.extend(ids);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PhotoStore for MemoryPhotoStore {
    fn save(&mut self, photos: &[PhotoRef]) -> Result<StoreId, StoreError> {
        let records = &self.records;
        let id = self.ids.next_unused(|id| records.contains_key(id));
        self.records.insert(id.clone(), photos.to_vec());
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<Vec<PhotoRef>, StoreError> {
        StoreId::parse(id)
            .and_then(|id| self.records.get(&id).cloned())
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }
}

// ============================================================================
// JSON directory store
// ============================================================================

#[derive(Serialize, Deserialize)]
struct StoredTree {
    id: StoreId,
    photos: Vec<PhotoRef>,
}

/// One `tree-<id>.json` file per record.
#[derive(Debug)]
pub struct JsonDirPhotoStore {
    root: PathBuf,
    ids: IdSource,
}

impl JsonDirPhotoStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            ids: IdSource::default(),
        })
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = StoreId>) -> Self {
        self.ids.queued.extend(ids);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &StoreId) -> PathBuf {
        self.root.join(format!("tree-{}.json", id))
    }
}

impl PhotoStore for JsonDirPhotoStore {
    fn save(&mut self, photos: &[PhotoRef]) -> Result<StoreId, StoreError> {
        let root = self.root.clone();
        let id = self
            .ids
            .next_unused(|id| root.join(format!("tree-{}.json", id)).exists());
        let record = StoredTree {
            id: id.clone(),
            photos: photos.to_vec(),
        };
        std::fs::write(self.record_path(&id), serde_json::to_vec_pretty(&record)?)?;
        log::info!("Saved {} photos as {}", photos.len(), id);
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<Vec<PhotoRef>, StoreError> {
        let Some(store_id) = StoreId::parse(id) else {
            return Err(StoreError::NotFound(id.to_owned()));
        };
        let contents = match std::fs::read(self.record_path(&store_id)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_owned()))
            }
            Err(e) => return Err(e.into()),
        };
        let record: StoredTree = serde_json::from_slice(&contents)?;
        Ok(record.photos)
    }
}

// ============================================================================
// Presets
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: StoreId,
    pub name: String,
    pub photos: Vec<PhotoRef>,
}

/// Named photo lists with an "active" pointer. Only the presets themselves
/// are persisted.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PresetLibrary {
    presets: Vec<Preset>,
    #[serde(skip)]
    active: Option<StoreId>,
    #[serde(skip)]
    ids: IdSource,
}

impl PresetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = StoreId>) -> Self {
        self.ids.queued.extend(ids);
        self
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn active(&self) -> Option<&Preset> {
        let active = self.active.as_ref()?;
        self.presets.iter().find(|p| &p.id == active)
    }

    fn find_mut(&mut self, id: &StoreId) -> Option<&mut Preset> {
        self.presets.iter_mut().find(|p| &p.id == id)
    }

    /// Add a new preset. Saving never makes the new preset active.
    pub fn save(&mut self, name: impl Into<String>, photos: &[PhotoRef]) -> StoreId {
        let presets = &self.presets;
        let id = self.ids.next_unused(|id| presets.iter().any(|p| &p.id == id));
        self.presets.push(Preset {
            id: id.clone(),
            name: name.into(),
            photos: photos.to_vec(),
        });
        self.active = None;
        id
    }

    /// Overwrite the active preset's photos. Returns false with no active preset.
    pub fn update(&mut self, photos: &[PhotoRef]) -> bool {
        let Some(active) = self.active.clone() else {
            return false;
        };
        match self.find_mut(&active) {
            Some(preset) => {
                preset.photos = photos.to_vec();
                true
            }
            None => false,
        }
    }

    /// Make `id` active and return a copy of its photos.
    pub fn load(&mut self, id: &StoreId) -> Option<Vec<PhotoRef>> {
        let photos = self.presets.iter().find(|p| &p.id == id)?.photos.clone();
        self.active = Some(id.clone());
        Some(photos)
    }

    pub fn rename(&mut self, id: &StoreId, name: impl Into<String>) -> bool {
        match self.find_mut(id) {
            Some(preset) => {
                preset.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: &StoreId) -> bool {
        let before = self.presets.len();
        self.presets.retain(|p| &p.id != id);
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        self.presets.len() != before
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let contents = std::fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    pub fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photos(names: &[&str]) -> Vec<PhotoRef> {
        names.iter().map(|n| PhotoRef::from(*n)).collect()
    }

    fn id(s: &str) -> StoreId {
        StoreId::parse(s).unwrap()
    }

    #[test]
    fn test_random_ids_are_base36() {
        let mut rng = scene_rng(Some(21));
        for _ in 0..50 {
            let id = StoreId::random(&mut rng);
            assert!(StoreId::parse(id.as_str()).is_some(), "{id} is not a valid id");
        }
        assert!(StoreId::parse("ABC123xyz").is_none());
        assert!(StoreId::parse("abc").is_none());
        assert!(StoreId::parse("../../etc").is_none());
    }

    #[test]
    fn test_memory_store_round_trip_and_not_found() {
        let mut store = MemoryPhotoStore::new().with_ids([id("abc123xyz")]);
        let saved = store.save(&photos(&["img1", "img2"])).unwrap();
        assert_eq!(saved.as_str(), "abc123xyz");
        assert_eq!(store.load("abc123xyz").unwrap(), photos(&["img1", "img2"]));
        assert!(matches!(store.load("doesnotexist"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_colliding_id_is_redrawn() {
        let mut store = MemoryPhotoStore::new().with_ids([id("aaaaaaaaa"), id("aaaaaaaaa")]);
        let first = store.save(&photos(&["a"])).unwrap();
        let second = store.save(&photos(&["b"])).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_json_dir_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonDirPhotoStore::open(dir.path()).unwrap().with_ids([id("abc123xyz")]);
        store.save(&photos(&["img1", "img2"])).unwrap();
        assert!(dir.path().join("tree-abc123xyz.json").exists());
        assert_eq!(store.load("abc123xyz").unwrap(), photos(&["img1", "img2"]));
        assert!(matches!(store.load("zzzzzzzzz"), Err(StoreError::NotFound(_))));

        std::fs::write(dir.path().join("tree-broken000.json"), b"{").unwrap();
        assert!(matches!(store.load("broken000"), Err(StoreError::Format(_))));
    }

    #[test]
    fn test_preset_lifecycle() {
        let mut lib = PresetLibrary::new().with_ids([id("preset001"), id("preset002")]);
        let a = lib.save("Family", &photos(&["a1"]));
        let b = lib.save("Friends", &photos(&["b1", "b2"]));
        assert!(lib.active().is_none());
        assert!(!lib.update(&photos(&["x"])));

        assert_eq!(lib.load(&b), Some(photos(&["b1", "b2"])));
        assert_eq!(lib.active().map(|p| p.name.as_str()), Some("Friends"));
        assert!(lib.update(&photos(&["b3"])));
        assert!(lib.rename(&a, "Relatives"));

        assert!(lib.delete(&b));
        assert!(lib.active().is_none());
        assert!(!lib.delete(&b));
        assert_eq!(lib.presets().len(), 1);
        assert_eq!(lib.presets()[0].name, "Relatives");
    }

    #[test]
    fn test_preset_library_file_keeps_presets_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        let mut lib = PresetLibrary::new().with_ids([id("preset001")]);
        let p = lib.save("Tree", &photos(&["t"]));
        lib.load(&p);
        lib.write_json_file(&path).unwrap();

        let restored = PresetLibrary::from_json_file(&path).unwrap();
        assert_eq!(restored.presets(), lib.presets());
        assert!(restored.active().is_none());
    }
}
