use std::fmt;
use std::sync::Arc;

use common::{path_segments, TrackKey};
use serde::{Deserialize, Serialize};

use crate::hash::{HashIndex, Keyed};
use crate::ids::RowIds;
use crate::strings::StringPool;
use crate::IndexError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Albums,
    Artists,
    Genres,
    Folders,
    TrackUris,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::Albums,
        CollectionKind::Artists,
        CollectionKind::Genres,
        CollectionKind::Folders,
        CollectionKind::TrackUris,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CollectionKind::Albums => "albums",
            CollectionKind::Artists => "artists",
            CollectionKind::Genres => "genres",
            CollectionKind::Folders => "folders",
            CollectionKind::TrackUris => "track_uris",
        }
    }

    pub fn is_tree(self) -> bool {
        matches!(self, CollectionKind::Folders)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Arena slot of a node inside one [`Collection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// One track reference attached to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    pub row_id: u64,
    pub track: TrackKey,
}

#[derive(Clone, Debug)]
pub struct Node {
    row_id: u64,
    text: Arc<str>,
    parent: Option<NodeId>,
    items: Vec<Item>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(row_id: u64, text: Arc<str>, parent: Option<NodeId>) -> Self {
        Self {
            row_id,
            text,
            parent,
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn row_id(&self) -> u64 {
        self.row_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Items in registration order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl Keyed for Node {
    fn parent_slot(&self) -> usize {
        self.parent.map(NodeId::index).unwrap_or(usize::MAX)
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// One indexed view: an arena of nodes under a synthetic root plus a hash
/// index keyed by `(parent, text)`.
#[derive(Clone, Debug)]
pub struct Collection {
    kind: CollectionKind,
    nodes: Vec<Node>,
    index: HashIndex,
    item_count: usize,
}

impl Collection {
    pub fn new(kind: CollectionKind, buckets: usize) -> Self {
        Self {
            kind,
            nodes: vec![Node::new(0, Arc::from(""), None)],
            index: HashIndex::new(buckets),
            item_count: 0,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Every node except the synthetic root, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(slot, node)| (NodeId(slot), node))
    }

    /// Number of nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn bucket_count(&self) -> usize {
        self.index.bucket_count()
    }

    /// Looks up a top-level node by text.
    pub fn find(&self, text: &str) -> Option<NodeId> {
        self.find_child(NodeId::ROOT, text)
    }

    pub fn find_child(&self, parent: NodeId, text: &str) -> Option<NodeId> {
        self.index.find(&self.nodes, parent.0, text).map(NodeId)
    }

    /// Follows `segments` from the root, one level per segment.
    pub fn find_path(&self, segments: &[&str]) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for segment in segments {
            current = self.find_child(current, segment)?;
        }
        if current == NodeId::ROOT {
            None
        } else {
            Some(current)
        }
    }

    /// Texts from the top level down to `id`.
    pub fn path_of(&self, id: NodeId) -> Vec<&str> {
        let mut out = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == NodeId::ROOT {
                break;
            }
            let Some(node) = self.node(current) else {
                break;
            };
            out.push(node.text());
            cursor = node.parent;
        }
        out.reverse();
        out
    }

    /// Finds or creates the top-level node for `key` and appends one item for
    /// `track`. Empty keys are skipped.
    pub fn register(
        &mut self,
        key: &Arc<str>,
        track: TrackKey,
        node_row_id: u64,
        item_row_id: u64,
        ids: &mut RowIds,
    ) -> Result<Option<NodeId>, IndexError> {
        if key.is_empty() {
            return Ok(None);
        }
        let id = self.find_or_create(NodeId::ROOT, key, node_row_id, ids)?;
        self.push_item(id, track, item_row_id, ids)?;
        Ok(Some(id))
    }

    /// Walks `path` one segment per level, creating missing directory nodes,
    /// and attaches the item to the last node only.
    pub fn register_in_folder(
        &mut self,
        strings: &mut StringPool,
        path: &str,
        separator: char,
        track: TrackKey,
        reused: &FolderReuse,
        ids: &mut RowIds,
    ) -> Result<Option<NodeId>, IndexError> {
        let segments = path_segments(path, separator);
        if segments.is_empty() {
            return Ok(None);
        }
        let mut current = NodeId::ROOT;
        for (depth, segment) in segments.iter().enumerate() {
            let desired = reused.nodes.get(depth).copied().unwrap_or(0);
            current = match self.find_child(current, segment) {
                Some(existing) => existing,
                None => {
                    let text = strings.intern(segment);
                    self.create(current, text, desired, ids)?
                }
            };
        }
        self.push_item(current, track, reused.item, ids)?;
        Ok(Some(current))
    }

    fn find_or_create(
        &mut self,
        parent: NodeId,
        key: &Arc<str>,
        desired: u64,
        ids: &mut RowIds,
    ) -> Result<NodeId, IndexError> {
        match self.find_child(parent, key) {
            Some(existing) => Ok(existing),
            None => self.create(parent, Arc::clone(key), desired, ids),
        }
    }

    fn create(
        &mut self,
        parent: NodeId,
        text: Arc<str>,
        desired: u64,
        ids: &mut RowIds,
    ) -> Result<NodeId, IndexError> {
        let row_id = ids.take(desired)?;
        let id = NodeId(self.nodes.len());
        self.index.insert(parent.0, &text, id.0);
        self.nodes.push(Node::new(row_id, text, Some(parent)));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    fn push_item(
        &mut self,
        id: NodeId,
        track: TrackKey,
        desired: u64,
        ids: &mut RowIds,
    ) -> Result<(), IndexError> {
        let row_id = ids.take(desired)?;
        self.nodes[id.0].items.push(Item { row_id, track });
        self.item_count += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0].items.clear();
        self.nodes[0].children.clear();
        self.index.clear();
        self.item_count = 0;
    }
}

/// Row ids handed to [`Collection::register_in_folder`], one per path
/// segment plus one for the leaf item. Zero means "mint a new id".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderReuse {
    pub nodes: Vec<u64>,
    pub item: u64,
}
