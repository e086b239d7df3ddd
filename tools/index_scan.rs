use std::env;
use std::path::{Path, PathBuf};

use common::TrackRecord;
use medialib::config::{config_path_from_env, load_or_create_config, resolve_path};
use medialib::{CollectionKind, IndexConfig, MediaLibrary, RecordAccessor};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    }

    let mut args = env::args().skip(1);
    let music_root = args
        .next()
        .or_else(|| env::var("MUSIC_ROOT").ok())
        .or_else(|| {
            let value = config.music_root.trim();
            (!value.is_empty()).then(|| resolve_path(&config_path, value).display().to_string())
        })
        .ok_or("MUSIC_ROOT not set and no path argument")?;
    let dump = args.next();

    let tracks = collect_tracks(Path::new(&music_root), &config);
    info!("Found {} audio files under {}", tracks.len(), music_root);

    let library = MediaLibrary::new(config);
    let stats = library.refresh(&tracks, &RecordAccessor)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    if let Some(name) = dump {
        let kind = CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.label() == name)
            .ok_or_else(|| format!("unknown collection {:?}", name))?;
        println!("{}", library.view_json(kind)?);
    }

    Ok(())
}

fn collect_tracks(root: &Path, config: &IndexConfig) -> Vec<TrackRecord> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| config.accepts_extension(ext))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    files
        .iter()
        .map(|file| match metadata::read_track(file) {
            Ok(record) => record,
            Err(err) => {
                warn!("Failed to read tags for {:?}: {}", file, err);
                metadata::bare_record(file)
            }
        })
        .collect()
}
