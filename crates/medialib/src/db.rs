use std::collections::HashSet;

use common::{path_segments, TrackHandle, TrackKey, TrackRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collection::{Collection, CollectionKind, NodeId};
use crate::config::IndexConfig;
use crate::continuity::IdSnapshot;
use crate::ids::RowIds;
use crate::registry::{track_uri, TrackEntry, TrackRegistry};
use crate::state::CollectionState;
use crate::strings::StringPool;
use crate::IndexError;

/// Metadata the caller extracts from a track handle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackFields {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub folder_path: Option<String>,
    pub uri: String,
}

/// Reads the indexable fields out of a track handle. The engine never parses
/// tags itself.
pub trait MetadataAccessor<T: ?Sized> {
    fn describe(&self, track: &T) -> Result<TrackFields, IndexError>;
}

impl<T: ?Sized, F> MetadataAccessor<T> for F
where
    F: Fn(&T) -> Result<TrackFields, IndexError>,
{
    fn describe(&self, track: &T) -> Result<TrackFields, IndexError> {
        self(track)
    }
}

/// Accessor for plain [`TrackRecord`]s: the folder path is the file path and
/// the URI falls back to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordAccessor;

impl MetadataAccessor<TrackRecord> for RecordAccessor {
    fn describe(&self, track: &TrackRecord) -> Result<TrackFields, IndexError> {
        Ok(TrackFields {
            artist: track.artist.clone(),
            album: track.album.clone(),
            genre: track.genre.clone(),
            folder_path: Some(track.path.clone()),
            uri: track.uri.clone().unwrap_or_else(|| track.path.clone()),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub generation: u64,
    pub tracks: usize,
    pub files: usize,
    pub artists: usize,
    pub albums: usize,
    pub genres: usize,
    pub folders: usize,
    pub strings: usize,
    pub orphans: usize,
    pub last_row_id: u64,
}

/// One generation of the index.
#[derive(Clone, Debug)]
pub struct Database {
    config: IndexConfig,
    registry: TrackRegistry,
    albums: Collection,
    artists: Collection,
    genres: Collection,
    folders: Collection,
    track_uris: Collection,
    strings: StringPool,
    state: CollectionState,
    row_ids: RowIds,
    generation: u64,
}

impl Database {
    /// An empty generation with a fresh id counter.
    pub fn new(config: IndexConfig) -> Self {
        Self::empty_with(config, RowIds::new(), StringPool::new(), 0)
    }

    fn empty_with(
        config: IndexConfig,
        row_ids: RowIds,
        strings: StringPool,
        generation: u64,
    ) -> Self {
        let buckets = config.hash_buckets;
        Self {
            registry: TrackRegistry::new(),
            albums: Collection::new(CollectionKind::Albums, buckets),
            artists: Collection::new(CollectionKind::Artists, buckets),
            genres: Collection::new(CollectionKind::Genres, buckets),
            folders: Collection::new(CollectionKind::Folders, buckets),
            track_uris: Collection::new(CollectionKind::TrackUris, buckets),
            strings,
            state: CollectionState::new(),
            row_ids,
            generation,
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_row_id(&self) -> u64 {
        self.row_ids.last()
    }

    pub fn collection(&self, kind: CollectionKind) -> &Collection {
        match kind {
            CollectionKind::Albums => &self.albums,
            CollectionKind::Artists => &self.artists,
            CollectionKind::Genres => &self.genres,
            CollectionKind::Folders => &self.folders,
            CollectionKind::TrackUris => &self.track_uris,
        }
    }

    fn collection_mut(&mut self, kind: CollectionKind) -> &mut Collection {
        match kind {
            CollectionKind::Albums => &mut self.albums,
            CollectionKind::Artists => &mut self.artists,
            CollectionKind::Genres => &mut self.genres,
            CollectionKind::Folders => &mut self.folders,
            CollectionKind::TrackUris => &mut self.track_uris,
        }
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// All track entries in discovery order.
    pub fn tracks(&self) -> &[TrackEntry] {
        self.registry.entries()
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CollectionState {
        &mut self.state
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.registry.contains_file(path)
    }

    /// The library's copy of an external track.
    pub fn find_track(&self, key: TrackKey) -> Option<&TrackEntry> {
        self.registry.get(key)
    }

    /// Looks a track up by its synthesized identity key (see
    /// [`track_uri`](crate::registry::track_uri)).
    pub fn find_by_uri(&self, uri: &str) -> Option<&TrackEntry> {
        let node = self.track_uris.find(uri)?;
        let item = self.track_uris.node(node)?.items().first()?;
        self.registry.get(item.track)
    }

    pub fn purge_orphans(&mut self) -> usize {
        self.strings.purge_orphans()
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            generation: self.generation,
            tracks: self.registry.len(),
            files: self.registry.file_count(),
            artists: self.artists.len(),
            albums: self.albums.len(),
            genres: self.genres.len(),
            folders: self.folders.len(),
            strings: self.strings.len(),
            orphans: self.strings.orphans().len(),
            last_row_id: self.row_ids.last(),
        }
    }

    /// The empty generation that follows this one. Shares nothing with
    /// `self` but the id counter and the config.
    pub fn cleared(&self) -> Database {
        Database::empty_with(
            self.config.clone(),
            self.row_ids,
            StringPool::new(),
            self.generation + 1,
        )
    }

    /// Releases every track, node, item and string. The id counter survives
    /// so ids stay unique for the whole session.
    pub fn clear(&mut self) {
        self.registry.clear();
        for kind in CollectionKind::ALL {
            self.collection_mut(kind).clear();
        }
        self.strings.clear();
        self.state.clear();
    }

    /// Builds the next generation from `tracks`, reusing the row ids of
    /// `self` for nodes and items that still describe the same thing.
    ///
    /// `self` is only read. On error nothing is published and the caller
    /// keeps using `self`.
    pub fn rebuild<T, A>(&self, tracks: &[T], accessor: &A) -> Result<Database, IndexError>
    where
        T: TrackHandle,
        A: MetadataAccessor<T> + ?Sized,
    {
        self.rebuild_with(self.config.clone(), tracks, accessor)
    }

    /// Same as [`Database::rebuild`] but switches to a new config.
    pub fn rebuild_with<T, A>(
        &self,
        config: IndexConfig,
        tracks: &[T],
        accessor: &A,
    ) -> Result<Database, IndexError>
    where
        T: TrackHandle,
        A: MetadataAccessor<T> + ?Sized,
    {
        info!(
            "Rebuilding media library generation {} from {} tracks",
            self.generation + 1,
            tracks.len()
        );
        let mut strings = self.strings.clone();
        strings.begin_pass();
        let mut next = Database::empty_with(config, self.row_ids, strings, self.generation + 1);

        let snapshots = Snapshots {
            albums: IdSnapshot::capture(Some(&self.albums)),
            artists: IdSnapshot::capture(Some(&self.artists)),
            genres: IdSnapshot::capture(Some(&self.genres)),
            folders: IdSnapshot::capture(Some(&self.folders)),
            track_uris: IdSnapshot::capture(Some(&self.track_uris)),
        };

        let mut skipped = 0usize;
        for track in tracks {
            if !next.index_track(track, accessor, &snapshots)? {
                skipped += 1;
            }
        }

        let keep_orphans = next.config.keep_orphans;
        next.strings.end_pass(keep_orphans);
        next.state = self.state.carried_over(&next.live_row_ids());

        let stats = next.stats();
        info!(
            "Media library generation {} ready: {} tracks, {} artists, {} albums, {} genres, {} folders ({} skipped, {} orphan strings)",
            stats.generation,
            stats.tracks,
            stats.artists,
            stats.albums,
            stats.genres,
            stats.folders,
            skipped,
            stats.orphans
        );
        Ok(next)
    }

    /// Registers one track into every enabled collection. Returns false when
    /// the track was skipped as a duplicate identity or had nothing to
    /// identify it by.
    fn index_track<T, A>(
        &mut self,
        track: &T,
        accessor: &A,
        snapshots: &Snapshots<'_>,
    ) -> Result<bool, IndexError>
    where
        T: TrackHandle,
        A: MetadataAccessor<T> + ?Sized,
    {
        let key = track.key();
        let fields = accessor.describe(track)?;
        let base_uri = if fields.uri.is_empty() {
            track.path()
        } else {
            fields.uri.as_str()
        };
        if base_uri.is_empty() {
            warn!("Skipping track {} with neither URI nor path", key);
            return Ok(false);
        }
        let uri = track_uri(track.subtrack(), base_uri);

        if self.track_uris.find(&uri).is_some() || self.registry.contains_key(key) {
            warn!("Skipping duplicate track {} ({})", uri, key);
            return Ok(false);
        }

        let file = self.strings.intern(track.path());
        let title = track
            .title()
            .filter(|title| !title.is_empty())
            .map(|title| self.strings.intern(title));

        let uri_text = self.strings.intern(&uri);
        let reused = snapshots.track_uris.reuse_ids(&uri, key);
        let track_uri_node = self.track_uris.register(
            &uri_text,
            key,
            reused.node,
            reused.item,
            &mut self.row_ids,
        )?;

        let artist = if self.config.index_artists {
            self.register_flat(
                CollectionKind::Artists,
                fields.artist.as_deref(),
                key,
                &snapshots.artists,
            )?
        } else {
            None
        };
        let album = if self.config.index_albums {
            self.register_flat(
                CollectionKind::Albums,
                fields.album.as_deref(),
                key,
                &snapshots.albums,
            )?
        } else {
            None
        };
        let genre = if self.config.index_genres {
            self.register_flat(
                CollectionKind::Genres,
                fields.genre.as_deref(),
                key,
                &snapshots.genres,
            )?
        } else {
            None
        };
        let folder = match fields.folder_path.as_deref() {
            Some(path) if self.config.index_folders => {
                let path = self.config.folder_path(path);
                let segments = path_segments(path, self.config.path_separator);
                let reused = snapshots.folders.reuse_folder_ids(&segments, key);
                self.folders.register_in_folder(
                    &mut self.strings,
                    path,
                    self.config.path_separator,
                    key,
                    &reused,
                    &mut self.row_ids,
                )?
            }
            _ => None,
        };
        if folder.is_none() && self.config.index_folders {
            debug!("No folder path for {}", uri);
        }

        self.registry.push(TrackEntry {
            key,
            file,
            title,
            subtrack: track.subtrack(),
            artist,
            album,
            genre,
            folder,
            track_uri: track_uri_node,
        });
        Ok(true)
    }

    fn register_flat(
        &mut self,
        kind: CollectionKind,
        value: Option<&str>,
        track: TrackKey,
        snapshot: &IdSnapshot<'_>,
    ) -> Result<Option<NodeId>, IndexError> {
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            debug!("Track {} has no {} value", track, kind);
            return Ok(None);
        };
        let text = self.strings.intern(value);
        let reused = snapshot.reuse_ids(value, track);
        let collection = match kind {
            CollectionKind::Albums => &mut self.albums,
            CollectionKind::Artists => &mut self.artists,
            CollectionKind::Genres => &mut self.genres,
            CollectionKind::Folders => &mut self.folders,
            CollectionKind::TrackUris => &mut self.track_uris,
        };
        collection.register(&text, track, reused.node, reused.item, &mut self.row_ids)
    }

    /// Every node and item row id present in this generation.
    pub fn live_row_ids(&self) -> HashSet<u64> {
        let mut live = HashSet::new();
        for kind in CollectionKind::ALL {
            for (_, node) in self.collection(kind).nodes() {
                live.insert(node.row_id());
                live.extend(node.items().iter().map(|item| item.row_id));
            }
        }
        live
    }
}

struct Snapshots<'a> {
    albums: IdSnapshot<'a>,
    artists: IdSnapshot<'a>,
    genres: IdSnapshot<'a>,
    folders: IdSnapshot<'a>,
    track_uris: IdSnapshot<'a>,
}
