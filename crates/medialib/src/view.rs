use common::TrackKey;
use serde::Serialize;

use crate::collection::{CollectionKind, NodeId};
use crate::db::Database;
use crate::state::CollectionState;

/// A read-only rendering of one collection, suitable for a tree widget or a
/// JSON dump.
#[derive(Clone, Debug, Serialize)]
pub struct ViewNode {
    pub row_id: u64,
    pub text: String,
    pub selected: bool,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<ViewTrack>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewNode>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ViewTrack {
    pub row_id: u64,
    pub track: TrackKey,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub selected: bool,
}

impl Database {
    /// Renders `kind` starting at its synthetic root, whose text is the
    /// collection label.
    pub fn view(&self, kind: CollectionKind) -> ViewNode {
        self.view_with(kind, self.state())
    }

    /// Same as [`Database::view`] but takes selection and expansion from
    /// `state` instead of the generation's own.
    pub fn view_with(&self, kind: CollectionKind, state: &CollectionState) -> ViewNode {
        let mut root = self.view_node(kind, NodeId::ROOT, state);
        root.text = kind.label().to_string();
        root
    }

    fn view_node(&self, kind: CollectionKind, id: NodeId, states: &CollectionState) -> ViewNode {
        let collection = self.collection(kind);
        let Some(node) = collection.node(id) else {
            return ViewNode {
                row_id: 0,
                text: String::new(),
                selected: false,
                expanded: false,
                tracks: Vec::new(),
                children: Vec::new(),
            };
        };
        let state = states.get(node.row_id());
        let tracks = node
            .items()
            .iter()
            .map(|item| {
                let entry = self.find_track(item.track);
                ViewTrack {
                    row_id: item.row_id,
                    track: item.track,
                    path: entry.map(|e| e.file.to_string()).unwrap_or_default(),
                    title: entry.and_then(|e| e.title.as_deref().map(str::to_string)),
                    selected: states.get(item.row_id).selected,
                }
            })
            .collect();
        let children = node
            .children()
            .iter()
            .map(|child| self.view_node(kind, *child, states))
            .collect();
        ViewNode {
            row_id: node.row_id(),
            text: node.text().to_string(),
            selected: state.selected,
            expanded: state.expanded,
            tracks,
            children,
        }
    }

    pub fn view_json(&self, kind: CollectionKind) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.view(kind))
    }
}
