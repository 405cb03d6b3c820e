//! ID3 tag access: identification frames in, a USLT lyrics frame out.

use std::fs;
use std::path::{Path, PathBuf};

use id3::frame::Lyrics;
use id3::{ErrorKind, Tag, TagLike, Version};
use tracing::debug;

/// Identification fields read from a track's tag container. Absent frames
/// become empty strings and are submitted to lookups as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
}

/// One read of a track's tag container.
#[derive(Debug, Clone)]
pub struct TrackRead {
    pub metadata: TrackMetadata,
    /// Whether a non-blank lyrics frame is already present.
    pub has_lyrics: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    SkippedExisting,
}

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("unreadable tag container in {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("failed to write lyrics tag to {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Read identification frames from `path`.
///
/// Fails only when the container itself is missing or corrupt; absent
/// individual frames default to empty strings.
pub fn read_track(path: &Path) -> Result<TrackRead, TagError> {
    let tag = Tag::read_from_path(path).map_err(|err| TagError::Unreadable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    let field = |value: Option<&str>| value.map(str::trim).unwrap_or("").to_string();
    let metadata = TrackMetadata {
        title: field(tag.title()),
        artist: field(tag.artist()),
        album: field(tag.album()),
        album_artist: field(tag.album_artist()),
    };
    Ok(TrackRead {
        has_lyrics: has_lyrics(&tag),
        metadata,
    })
}

fn has_lyrics(tag: &Tag) -> bool {
    tag.lyrics().any(|frame| !frame.text.trim().is_empty())
}

/// Write `text` as the track's unsynchronized lyrics frame.
///
/// Existing lyrics win unless `overwrite` is set. The tag goes onto a temp
/// copy which then replaces the original, so a failed write leaves the file
/// byte-unchanged. Every other frame is carried over untouched.
pub fn write_lyrics(path: &Path, text: &str, overwrite: bool) -> Result<WriteOutcome, TagError> {
    let write_err = |reason: String| TagError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let mut tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        // A file without a container gets a fresh tag, same as one that was
        // stripped by another tool.
        Err(err) if matches!(err.kind, ErrorKind::NoTag) => Tag::new(),
        Err(err) => return Err(write_err(err.to_string())),
    };

    if !overwrite && has_lyrics(&tag) {
        debug!(path = %path.display(), "lyrics frame already present; leaving file alone");
        return Ok(WriteOutcome::SkippedExisting);
    }

    tag.remove_all_lyrics();
    tag.add_frame(Lyrics {
        lang: "eng".to_string(),
        description: String::new(),
        text: text.to_string(),
    });

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let staged = tempfile::Builder::new()
        .prefix(".verse-")
        .tempfile_in(dir)
        .map_err(|err| write_err(err.to_string()))?;
    fs::copy(path, staged.path()).map_err(|err| write_err(err.to_string()))?;
    tag.write_to_path(staged.path(), Version::Id3v24)
        .map_err(|err| write_err(err.to_string()))?;
    staged.persist(path).map_err(|err| write_err(err.to_string()))?;
    Ok(WriteOutcome::Written)
}
