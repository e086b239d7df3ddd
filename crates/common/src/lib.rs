use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Stable surrogate identity of an externally owned track handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackKey(pub u64);

impl TrackKey {
    /// Derives a key from the file path and subtrack index, so the same file
    /// maps to the same key across scans.
    pub fn for_file(path: &str, subtrack: Option<u32>) -> Self {
        let input = match subtrack {
            Some(index) => format!("{}#{}", index, path),
            None => path.to_string(),
        };
        let hash = blake3::hash(input.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        TrackKey(u64::from_le_bytes(bytes))
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The read-only view of a track the engine needs at registration time.
pub trait TrackHandle {
    fn key(&self) -> TrackKey;
    fn path(&self) -> &str;
    fn title(&self) -> Option<&str>;
    fn subtrack(&self) -> Option<u32>;
}

/// A plain description of one track (or one subtrack of a container file).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackRecord {
    pub key: Option<TrackKey>,
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtrack: Option<u32>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

impl TrackRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_artist(mut self, artist: &str) -> Self {
        self.artist = Some(artist.to_string());
        self
    }

    pub fn with_album(mut self, album: &str) -> Self {
        self.album = Some(album.to_string());
        self
    }

    pub fn with_genre(mut self, genre: &str) -> Self {
        self.genre = Some(genre.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_subtrack(mut self, subtrack: u32) -> Self {
        self.subtrack = Some(subtrack);
        self
    }
}

impl TrackHandle for TrackRecord {
    fn key(&self) -> TrackKey {
        self.key
            .unwrap_or_else(|| TrackKey::for_file(&self.path, self.subtrack))
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn subtrack(&self) -> Option<u32> {
        self.subtrack
    }
}

/// Splits a path into its non-empty segments.
pub fn path_segments(path: &str, separator: char) -> Vec<&str> {
    path.split(separator)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Renders `path` with `/` separators, keeping a leading `/` for rooted
/// Unix-style paths.
pub fn path_to_slash_string(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir))
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let joined = parts.join("/");
    if matches!(path.components().next(), Some(Component::RootDir)) {
        format!("/{}", joined)
    } else {
        joined
    }
}
