use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hash::HASH_SIZE;

pub const CONFIG_VERSION: u32 = 1;

const DEFAULT_EXTENSIONS: [&str; 6] = ["mp3", "flac", "ogg", "opus", "m4a", "wav"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub version: u32,
    pub hash_buckets: usize,
    pub path_separator: char,
    /// Prefix removed from track paths before they enter the folder tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_root: Option<String>,
    pub index_artists: bool,
    pub index_albums: bool,
    pub index_genres: bool,
    pub index_folders: bool,
    pub keep_orphans: bool,
    pub music_root: String,
    pub extensions: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            hash_buckets: HASH_SIZE,
            path_separator: '/',
            folder_root: None,
            index_artists: true,
            index_albums: true,
            index_genres: true,
            index_folders: true,
            keep_orphans: true,
            music_root: "".to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl IndexConfig {
    /// The part of `path` that goes into the folder tree. The root is only
    /// removed on a segment boundary.
    pub fn folder_path<'a>(&self, path: &'a str) -> &'a str {
        let root = match self.folder_root.as_deref().map(str::trim) {
            Some(root) if !root.is_empty() => root.trim_end_matches(self.path_separator),
            _ => return path,
        };
        match path.strip_prefix(root) {
            Some(rest) if rest.is_empty() || rest.starts_with(self.path_separator) => rest,
            _ => path,
        }
    }

    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    fn repair(&mut self) {
        if self.version < CONFIG_VERSION {
            self.version = CONFIG_VERSION;
        }
        if self.hash_buckets == 0 {
            self.hash_buckets = HASH_SIZE;
        }
        if self.path_separator.is_whitespace() {
            self.path_separator = '/';
        }
        self.extensions.retain(|ext| !ext.trim().is_empty());
        if self.extensions.is_empty() {
            self.extensions = Self::default().extensions;
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("MEDIALIB_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Loads the config at `path`, writing the defaults there when it does not
/// exist yet. The flag is true when a new file was created.
pub fn load_or_create_config(path: &Path) -> Result<(IndexConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: IndexConfig = serde_yaml::from_str(&contents)?;
        config.repair();
        return Ok((config, false));
    }

    let config = IndexConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &IndexConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

#[cfg(test)]
mod tests {
    use super::{load_or_create_config, resolve_path, save_config, IndexConfig};
    use crate::hash::HASH_SIZE;
    use std::fs;
    use std::path::Path;

    #[test]
    fn creates_default_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert_eq!(config, IndexConfig::default());

        let (again, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(again, config);
    }

    #[test]
    fn repairs_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "hash_buckets: 0\nextensions: []\nindex_genres: false\n").unwrap();

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(config.hash_buckets, HASH_SIZE);
        assert!(config.accepts_extension("FLAC"));
        assert!(!config.index_genres);
        assert!(config.index_artists);
    }

    #[test]
    fn save_round_trips_folder_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let config = IndexConfig {
            folder_root: Some("/music".to_string()),
            ..IndexConfig::default()
        };
        save_config(&path, &config).unwrap();
        let (loaded, _) = load_or_create_config(&path).unwrap();
        assert_eq!(loaded.folder_root.as_deref(), Some("/music"));
        assert_eq!(loaded.folder_path("/music/a/b.mp3"), "/a/b.mp3");
        assert_eq!(loaded.folder_path("/other/b.mp3"), "/other/b.mp3");
    }

    #[test]
    fn folder_root_only_strips_whole_segments() {
        let config = IndexConfig {
            folder_root: Some("/music/".to_string()),
            ..IndexConfig::default()
        };
        assert_eq!(config.folder_path("/music2/a.mp3"), "/music2/a.mp3");
        assert_eq!(config.folder_path("/musical"), "/musical");
        assert_eq!(config.folder_path("/music/a.mp3"), "/a.mp3");
        assert_eq!(config.folder_path("/music"), "");
    }

    #[test]
    fn resolves_relative_to_config_dir() {
        let resolved = resolve_path(Path::new("/etc/medialib/config.yaml"), "music");
        assert_eq!(resolved, Path::new("/etc/medialib/music"));
        let absolute = resolve_path(Path::new("config.yaml"), "/srv/music");
        assert_eq!(absolute, Path::new("/srv/music"));
    }
}
