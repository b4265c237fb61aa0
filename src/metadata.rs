use std::path::{Path, PathBuf};

use audiotags::{AudioTag, AudioTagEdit, AudioTagWrite, Id3v2Tag, Tag};

use crate::filename::song_filename;
use crate::song::Song;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Song file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read or write audio tags: {0}")]
    Tag(#[from] audiotags::Error),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write title, artist and album tags to a song that has already been renamed
/// to its standard filename inside `directory`, then open up its permissions.
pub fn write_metadata(song: &Song, directory: &Path) -> Result<PathBuf, MetadataError> {
    let path = directory.join(song_filename(song));
    if !path.is_file() {
        return Err(MetadataError::FileNotFound(path));
    }

    log::debug!("Writing tags to {}", path.display());
    let mut tag = read_tag(&path)?;
    tag.set_title(&song.title);
    tag.set_artist(&song.artist);
    tag.set_album_title(&song.album);
    let path_str = path
        .to_str()
        .ok_or_else(|| MetadataError::FileNotFound(path.clone()))?;
    tag.write_to_path(path_str)?;

    allow_read_write(&path)?;
    Ok(path)
}

/// Read the file's tag. An mp3 straight from the downloader may carry no ID3
/// tag at all, in which case a fresh ID3v2 tag is started.
fn read_tag(path: &Path) -> Result<Box<dyn AudioTag + Send + Sync>, MetadataError> {
    match Tag::new().read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(audiotags::Error::Id3TagError(e)) if matches!(e.kind, id3::ErrorKind::NoTag) => {
            log::debug!("No ID3 tag in {}, starting a new one", path.display());
            Ok(Box::new(Id3v2Tag::new()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read and write for everyone, execute for no one
#[cfg(unix)]
fn allow_read_write(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn allow_read_write(path: &Path) -> std::io::Result<()> {
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_readonly(false);
    std::fs::set_permissions(path, permissions)
}
