use std::path::Path;

use common::{path_to_slash_string, TrackRecord};
use lofty::error::LoftyError;
use lofty::prelude::{ItemKey, TaggedFileExt};
use lofty::tag::Tag;

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// Reads the tags the index needs from one audio file.
///
/// Files without any tag still produce a record carrying only the path and
/// URI, so they can be indexed by folder.
pub fn read_track(path: &Path) -> Result<TrackRecord, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let mut record = bare_record(path);
    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        apply_tag(&mut record, tag);
    }
    Ok(record)
}

/// A record for a file whose tags could not be read.
pub fn bare_record(path: &Path) -> TrackRecord {
    let slash_path = path_to_slash_string(path);
    let mut record = TrackRecord::new(slash_path.clone());
    record.uri = Some(slash_path);
    record
}

fn apply_tag(record: &mut TrackRecord, tag: &Tag) {
    record.title = tag_text(tag, ItemKey::TrackTitle);
    record.album = tag_text(tag, ItemKey::AlbumTitle);
    record.artist =
        tag_text(tag, ItemKey::TrackArtist).or_else(|| tag_text(tag, ItemKey::AlbumArtist));
    record.genre = tag_text(tag, ItemKey::Genre).and_then(|value| first_genre(&value));
}

fn tag_text(tag: &Tag, key: ItemKey) -> Option<String> {
    tag.get_string(&key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

/// Multi-valued genre frames are indexed under their first value only.
fn first_genre(text: &str) -> Option<String> {
    text.split(&[';', ',', '/', '|', '\0'][..])
        .map(str::trim)
        .find(|part| !part.is_empty())
        .map(|part| part.to_string())
}

#[cfg(test)]
mod tests {
    use super::{bare_record, first_genre};
    use std::path::Path;

    #[test]
    fn first_genre_skips_blank_parts() {
        assert_eq!(first_genre(" ; Jazz; Blues").as_deref(), Some("Jazz"));
        assert_eq!(first_genre("Rock").as_deref(), Some("Rock"));
        assert_eq!(first_genre(" / "), None);
    }

    #[test]
    fn bare_record_uses_path_as_uri() {
        let record = bare_record(Path::new("/music/a/b.mp3"));
        assert_eq!(record.path, "/music/a/b.mp3");
        assert_eq!(record.uri.as_deref(), Some("/music/a/b.mp3"));
        assert!(record.artist.is_none());
    }
}
