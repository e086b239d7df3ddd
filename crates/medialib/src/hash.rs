//! Fixed-bucket hash index over nodes stored in an arena.
//!
//! Keys are `(parent, text)` pairs so one index can serve both flat
//! collections (every node hangs off the root) and the folder tree, where
//! equal text under different parents must stay distinct.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const HASH_SIZE: usize = 4096;

/// Anything stored in an arena and addressable through a [`HashIndex`].
pub trait Keyed {
    fn parent_slot(&self) -> usize;
    fn text(&self) -> &str;
}

/// Maps a key to its bucket. Stable for a given build of the crate; bucket
/// numbers are never persisted.
pub fn bucket_for(parent: usize, text: &str, buckets: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    text.hash(&mut hasher);
    (hasher.finish() % buckets.max(1) as u64) as usize
}

#[derive(Clone, Debug)]
pub struct HashIndex {
    buckets: Vec<Vec<usize>>,
    len: usize,
}

impl HashIndex {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); bucket_count.max(1)],
            len: 0,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Walks one bucket and returns the first arena slot whose key matches.
    pub fn find<T: Keyed>(&self, arena: &[T], parent: usize, text: &str) -> Option<usize> {
        let bucket = bucket_for(parent, text, self.buckets.len());
        self.buckets[bucket].iter().copied().find(|&slot| {
            arena
                .get(slot)
                .map(|entry| entry.parent_slot() == parent && entry.text() == text)
                .unwrap_or(false)
        })
    }

    /// Callers must have seen `find` fail for the same key first.
    pub fn insert(&mut self, parent: usize, text: &str, slot: usize) {
        let bucket = bucket_for(parent, text, self.buckets.len());
        self.buckets[bucket].push(slot);
        self.len += 1;
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::{bucket_for, HashIndex, Keyed};

    struct Entry {
        parent: usize,
        text: &'static str,
    }

    impl Keyed for Entry {
        fn parent_slot(&self) -> usize {
            self.parent
        }

        fn text(&self) -> &str {
            self.text
        }
    }

    #[test]
    fn bucket_is_stable_and_in_range() {
        let first = bucket_for(0, "Artist", 16);
        assert_eq!(first, bucket_for(0, "Artist", 16));
        assert!(first < 16);
    }

    #[test]
    fn find_matches_parent_and_text() {
        let arena = vec![
            Entry { parent: 0, text: "Music" },
            Entry { parent: 1, text: "Music" },
        ];
        let mut index = HashIndex::new(1);
        index.insert(0, "Music", 0);
        index.insert(1, "Music", 1);

        assert_eq!(index.find(&arena, 0, "Music"), Some(0));
        assert_eq!(index.find(&arena, 1, "Music"), Some(1));
        assert_eq!(index.find(&arena, 2, "Music"), None);
        assert_eq!(index.find(&arena, 0, "music"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn clear_keeps_bucket_count() {
        let mut index = HashIndex::new(8);
        index.insert(0, "a", 0);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.bucket_count(), 8);
    }
}
