//! In-memory media library index.
//!
//! A [`Database`] is one generation of the index: artist, album, genre,
//! folder and track-identity collections built over a flat list of tracks.
//! [`MediaLibrary`] publishes generations atomically and carries row ids and
//! UI state from one generation to the next.

pub mod collection;
pub mod config;
pub mod continuity;
pub mod db;
pub mod hash;
pub mod ids;
pub mod registry;
pub mod state;
pub mod strings;
pub mod view;

use std::path::Path;
use std::sync::Arc;

use common::TrackHandle;
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

pub use collection::{Collection, CollectionKind, Item, Node, NodeId};
pub use config::{ConfigError, IndexConfig};
pub use db::{Database, LibraryStats, MetadataAccessor, RecordAccessor, TrackFields};
pub use registry::TrackEntry;
pub use state::{CollectionState, ItemState};
pub use view::{ViewNode, ViewTrack};

#[derive(Debug)]
pub enum IndexError {
    RowIdsExhausted,
    Accessor(String),
    Config(ConfigError),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::RowIdsExhausted => write!(f, "row id counter exhausted"),
            IndexError::Accessor(message) => write!(f, "metadata accessor error: {}", message),
            IndexError::Config(err) => write!(f, "config error: {}", err),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<ConfigError> for IndexError {
    fn from(err: ConfigError) -> Self {
        IndexError::Config(err)
    }
}

/// Owner of the published generation.
///
/// Readers take a cheap `Arc` to the current [`Database`] and never see a
/// generation that is still being built. Refreshes are serialised. Item
/// state lives beside the generation under its own lock, so toggling a
/// selection never copies the index.
pub struct MediaLibrary {
    current: RwLock<Arc<Database>>,
    state: RwLock<CollectionState>,
    refresh_lock: Mutex<()>,
}

impl MediaLibrary {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(Database::new(config))),
            state: RwLock::new(CollectionState::new()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Loads (or creates) the YAML config at `path` and starts empty. The
    /// flag is true when a default config file was written.
    pub fn open(config_path: &Path) -> Result<(Self, bool), IndexError> {
        let (config, created) = config::load_or_create_config(config_path)?;
        if created {
            info!("Created default config at {:?}", config_path);
        } else {
            info!("Loaded config from {:?}", config_path);
        }
        Ok((Self::new(config), created))
    }

    pub fn current(&self) -> Arc<Database> {
        Arc::clone(&*self.current.read())
    }

    pub fn stats(&self) -> LibraryStats {
        self.current.read().stats()
    }

    /// Builds a new generation from `tracks` and publishes it. On error the
    /// previous generation stays published.
    pub fn refresh<T, A>(&self, tracks: &[T], accessor: &A) -> Result<LibraryStats, IndexError>
    where
        T: TrackHandle,
        A: MetadataAccessor<T> + ?Sized,
    {
        let _guard = self.refresh_lock.lock();
        let previous = self.current();
        let next = match previous.rebuild(tracks, accessor) {
            Ok(next) => next,
            Err(err) => {
                warn!(
                    "Media library rebuild failed, keeping generation {}: {}",
                    previous.generation(),
                    err
                );
                return Err(err);
            }
        };
        Ok(self.publish(next))
    }

    /// Rebuilds under a new config and publishes the result.
    pub fn reconfigure<T, A>(
        &self,
        config: IndexConfig,
        tracks: &[T],
        accessor: &A,
    ) -> Result<LibraryStats, IndexError>
    where
        T: TrackHandle,
        A: MetadataAccessor<T> + ?Sized,
    {
        let _guard = self.refresh_lock.lock();
        let next = self.current().rebuild_with(config, tracks, accessor)?;
        Ok(self.publish(next))
    }

    /// Drops every track and node, publishing an empty generation. Row ids
    /// keep counting from where they were.
    pub fn reset(&self) {
        let _guard = self.refresh_lock.lock();
        let empty = self.current().cleared();
        let generation = empty.generation();
        self.publish(empty);
        info!("Media library reset to empty generation {}", generation);
    }

    /// Applies `update` to the item state.
    pub fn update_state<R>(&self, update: impl FnOnce(&mut CollectionState) -> R) -> R {
        update(&mut self.state.write())
    }

    pub fn item_state(&self, row_id: u64) -> ItemState {
        self.state.read().get(row_id)
    }

    /// Renders `kind` of the published generation with the current item
    /// state.
    pub fn view(&self, kind: CollectionKind) -> ViewNode {
        let db = self.current();
        let state = self.state.read();
        db.view_with(kind, &state)
    }

    pub fn view_json(&self, kind: CollectionKind) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.view(kind))
    }

    /// Swaps in `next`, keeping item state only for row ids that survived.
    fn publish(&self, next: Database) -> LibraryStats {
        let stats = next.stats();
        let live = next.live_row_ids();
        let mut state = self.state.write();
        *state = state.carried_over(&live);
        *self.current.write() = Arc::new(next);
        stats
    }
}

impl Default for MediaLibrary {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionKind, IndexConfig, IndexError, MediaLibrary, RecordAccessor, TrackFields};
    use common::TrackRecord;
    use std::sync::Arc;

    fn tracks() -> Vec<TrackRecord> {
        vec![
            TrackRecord::new("/m/Song1.mp3").with_artist("X").with_album("A"),
            TrackRecord::new("/m/Song2.mp3").with_artist("X").with_album("A"),
        ]
    }

    #[test]
    fn refresh_publishes_a_new_generation() {
        let library = MediaLibrary::default();
        let before = library.current();
        assert_eq!(before.stats().tracks, 0);

        let stats = library.refresh(&tracks(), &RecordAccessor).unwrap();
        assert_eq!(stats.tracks, 2);
        assert_eq!(stats.artists, 1);
        assert_eq!(stats.albums, 1);
        assert_eq!(stats.generation, 1);

        // A reader holding the old generation keeps seeing it.
        assert_eq!(before.stats().tracks, 0);
        assert!(library.current().contains_file("/m/Song2.mp3"));
    }

    #[test]
    fn failed_refresh_keeps_last_good_generation() {
        let library = MediaLibrary::default();
        library.refresh(&tracks(), &RecordAccessor).unwrap();
        let published = library.current();

        let failing = |_: &TrackRecord| -> Result<TrackFields, IndexError> {
            Err(IndexError::Accessor("unreadable".to_string()))
        };
        let result = library.refresh(&[TrackRecord::new("/m/Song3.mp3")], &failing);
        assert!(result.is_err());
        assert!(Arc::ptr_eq(&published, &library.current()));
        assert!(!library.current().contains_file("/m/Song3.mp3"));
    }

    #[test]
    fn state_edits_survive_refresh() {
        let library = MediaLibrary::default();
        library.refresh(&tracks(), &RecordAccessor).unwrap();
        let row_id = {
            let db = library.current();
            let albums = db.collection(CollectionKind::Albums);
            let id = albums.find("A").unwrap();
            albums.node(id).unwrap().row_id()
        };
        library.update_state(|state| state.set_expanded(row_id, true));
        assert!(library.item_state(row_id).expanded);

        library.refresh(&tracks(), &RecordAccessor).unwrap();
        assert!(library.item_state(row_id).expanded);
    }

    #[test]
    fn reset_empties_but_keeps_counting() {
        let library = MediaLibrary::default();
        library.refresh(&tracks(), &RecordAccessor).unwrap();
        let issued = library.stats().last_row_id;

        let generation = library.stats().generation;
        library.reset();
        let stats = library.stats();
        assert_eq!(stats.generation, generation + 1);
        assert_eq!(stats.tracks, 0);
        assert_eq!(stats.artists, 0);
        assert_eq!(stats.folders, 0);
        assert_eq!(stats.last_row_id, issued);

        library.refresh(&tracks(), &RecordAccessor).unwrap();
        let db = library.current();
        let albums = db.collection(CollectionKind::Albums);
        let album = albums.node(albums.find("A").unwrap()).unwrap();
        assert!(album.row_id() > issued);
    }

    #[test]
    fn reconfigure_applies_new_config() {
        let library = MediaLibrary::default();
        library.refresh(&tracks(), &RecordAccessor).unwrap();
        let config = IndexConfig {
            index_artists: false,
            ..IndexConfig::default()
        };
        let stats = library.reconfigure(config, &tracks(), &RecordAccessor).unwrap();
        assert_eq!(stats.artists, 0);
        assert!(!library.current().config().index_artists);
    }

    #[test]
    fn state_edits_do_not_copy_the_generation() {
        let library = MediaLibrary::default();
        library.refresh(&tracks(), &RecordAccessor).unwrap();
        let reader = library.current();
        let row_id = {
            let artists = reader.collection(CollectionKind::Artists);
            artists.node(artists.find("X").unwrap()).unwrap().row_id()
        };

        library.update_state(|state| state.set_selected(row_id, true));
        assert!(Arc::ptr_eq(&reader, &library.current()));
        assert!(library.item_state(row_id).selected);
        assert!(library.view(CollectionKind::Artists).children[0].selected);
    }

    #[test]
    fn state_of_vanished_nodes_is_dropped() {
        let library = MediaLibrary::default();
        library.refresh(&tracks(), &RecordAccessor).unwrap();
        let row_id = {
            let db = library.current();
            let albums = db.collection(CollectionKind::Albums);
            albums.node(albums.find("A").unwrap()).unwrap().row_id()
        };
        library.update_state(|state| state.set_expanded(row_id, true));

        library.refresh(&[TrackRecord::new("/m/other.mp3")], &RecordAccessor).unwrap();
        assert!(!library.item_state(row_id).expanded);
    }

    #[test]
    fn open_creates_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let (library, created) = MediaLibrary::open(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert_eq!(library.stats().tracks, 0);
    }
}
