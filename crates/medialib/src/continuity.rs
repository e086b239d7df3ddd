//! Row id continuity between two generations.
//!
//! A snapshot is captured from the previous generation's collection before
//! the new one is built. Lookups are pure: the snapshot never changes and the
//! answer only depends on the key and the track.

use std::collections::HashMap;

use common::TrackKey;

use crate::collection::{Collection, FolderReuse, NodeId};

/// Ids recovered for one flat registration. Zero means nothing matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReusedIds {
    pub node: u64,
    pub item: u64,
}

pub struct IdSnapshot<'a> {
    prev: Option<&'a Collection>,
    items: HashMap<(NodeId, TrackKey), u64>,
}

impl<'a> IdSnapshot<'a> {
    pub fn capture(prev: Option<&'a Collection>) -> Self {
        let mut items = HashMap::new();
        if let Some(collection) = prev {
            for (id, node) in collection.nodes() {
                for item in node.items() {
                    items.entry((id, item.track)).or_insert(item.row_id);
                }
            }
        }
        Self { prev, items }
    }

    pub fn empty() -> Self {
        Self::capture(None)
    }

    /// Ids of the top-level node named `key` and of its item for `track`.
    pub fn reuse_ids(&self, key: &str, track: TrackKey) -> ReusedIds {
        let Some(prev) = self.prev else {
            return ReusedIds::default();
        };
        match prev.find(key) {
            Some(node) => ReusedIds {
                node: prev.node(node).map(|n| n.row_id()).unwrap_or(0),
                item: self.item_id(node, track),
            },
            None => ReusedIds::default(),
        }
    }

    /// Ids along the same parent chain in the previous folder tree. Matching
    /// stops at the first segment that has no counterpart; everything below
    /// it is new.
    pub fn reuse_folder_ids(&self, segments: &[&str], track: TrackKey) -> FolderReuse {
        let mut reuse = FolderReuse::default();
        let Some(prev) = self.prev else {
            return reuse;
        };
        let mut current = NodeId::ROOT;
        for segment in segments {
            match prev.find_child(current, segment) {
                Some(child) => {
                    reuse
                        .nodes
                        .push(prev.node(child).map(|n| n.row_id()).unwrap_or(0));
                    current = child;
                }
                None => return reuse,
            }
        }
        if current != NodeId::ROOT {
            reuse.item = self.item_id(current, track);
        }
        reuse
    }

    fn item_id(&self, node: NodeId, track: TrackKey) -> u64 {
        self.items.get(&(node, track)).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{IdSnapshot, ReusedIds};
    use crate::collection::{Collection, CollectionKind, FolderReuse};
    use crate::ids::RowIds;
    use crate::strings::StringPool;
    use common::TrackKey;
    use std::sync::Arc;

    #[test]
    fn empty_snapshot_reuses_nothing() {
        let snapshot = IdSnapshot::empty();
        assert_eq!(snapshot.reuse_ids("A", TrackKey(1)), ReusedIds::default());
        assert_eq!(
            snapshot.reuse_folder_ids(&["a", "b"], TrackKey(1)),
            FolderReuse::default()
        );
    }

    #[test]
    fn flat_reuse_matches_text_and_track() {
        let mut albums = Collection::new(CollectionKind::Albums, 16);
        let mut ids = RowIds::new();
        let a: Arc<str> = Arc::from("A");
        albums.register(&a, TrackKey(1), 0, 0, &mut ids).unwrap();
        albums.register(&a, TrackKey(2), 0, 0, &mut ids).unwrap();

        let snapshot = IdSnapshot::capture(Some(&albums));
        assert_eq!(
            snapshot.reuse_ids("A", TrackKey(2)),
            ReusedIds { node: 1, item: 3 }
        );
        assert_eq!(
            snapshot.reuse_ids("A", TrackKey(9)),
            ReusedIds { node: 1, item: 0 }
        );
        assert_eq!(snapshot.reuse_ids("B", TrackKey(1)), ReusedIds::default());
    }

    #[test]
    fn folder_reuse_stops_at_first_unknown_segment() {
        let mut folders = Collection::new(CollectionKind::Folders, 16);
        let mut strings = StringPool::new();
        let mut ids = RowIds::new();
        folders
            .register_in_folder(
                &mut strings,
                "/a/b/x.mp3",
                '/',
                TrackKey(1),
                &FolderReuse::default(),
                &mut ids,
            )
            .unwrap();

        let snapshot = IdSnapshot::capture(Some(&folders));
        let same = snapshot.reuse_folder_ids(&["a", "b", "x.mp3"], TrackKey(1));
        assert_eq!(same.nodes, vec![1, 2, 3]);
        assert_eq!(same.item, 4);

        let moved = snapshot.reuse_folder_ids(&["a", "c", "x.mp3"], TrackKey(1));
        assert_eq!(moved.nodes, vec![1]);
        assert_eq!(moved.item, 0);
    }
}
