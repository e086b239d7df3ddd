use std::collections::HashMap;
use std::sync::Arc;

use common::TrackKey;

use crate::collection::NodeId;

/// One physical file or one subtrack of a container file.
///
/// The node ids point into the collections of the same generation.
#[derive(Clone, Debug)]
pub struct TrackEntry {
    pub key: TrackKey,
    pub file: Arc<str>,
    pub title: Option<Arc<str>>,
    pub subtrack: Option<u32>,
    pub artist: Option<NodeId>,
    pub album: Option<NodeId>,
    pub genre: Option<NodeId>,
    pub folder: Option<NodeId>,
    pub track_uri: Option<NodeId>,
}

/// The master track list plus the membership hashes built over it.
#[derive(Clone, Debug, Default)]
pub struct TrackRegistry {
    entries: Vec<TrackEntry>,
    // First entry per file only; later subtracks of the same file never
    // add a second filename entry.
    by_file: HashMap<Arc<str>, usize>,
    by_key: HashMap<TrackKey, usize>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TrackEntry) -> usize {
        let slot = self.entries.len();
        self.by_file.entry(Arc::clone(&entry.file)).or_insert(slot);
        self.by_key.entry(entry.key).or_insert(slot);
        self.entries.push(entry);
        slot
    }

    /// All entries in discovery order.
    pub fn entries(&self) -> &[TrackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.by_file.contains_key(path)
    }

    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    pub fn first_for_file(&self, path: &str) -> Option<&TrackEntry> {
        self.by_file.get(path).map(|&slot| &self.entries[slot])
    }

    pub fn contains_key(&self, key: TrackKey) -> bool {
        self.by_key.contains_key(&key)
    }

    pub fn get(&self, key: TrackKey) -> Option<&TrackEntry> {
        self.by_key.get(&key).map(|&slot| &self.entries[slot])
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_file.clear();
        self.by_key.clear();
    }
}

/// Builds the track-identity key: `"{subtrack}#{uri}"`, or the bare URI for
/// whole files.
pub fn track_uri(subtrack: Option<u32>, uri: &str) -> String {
    match subtrack {
        Some(index) => format!("{}#{}", index, uri),
        None => uri.to_string(),
    }
}
