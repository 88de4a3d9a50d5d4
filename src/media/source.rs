use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::Engine as _;

use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::model::project::MediaRef;

/// Resolves media references to files that external tools can open.
///
/// Relative paths are joined onto the assets root. `data:` URLs (how the editor stores recorded
/// voice notes and uploads) are decoded once into a private temporary directory.
#[derive(Debug)]
pub struct MediaStaging {
    assets_root: PathBuf,
    staged_dir: tempfile::TempDir,
    staged: Mutex<HashMap<MediaRef, PathBuf>>,
}

impl MediaStaging {
    /// Create a staging area resolving relative paths against `assets_root`.
    pub fn new(assets_root: impl Into<PathBuf>) -> StoryboardResult<Self> {
        let staged_dir = tempfile::Builder::new()
            .prefix("storyboard-media-")
            .tempdir()
            .map_err(|e| {
                StoryboardError::Other(anyhow::anyhow!("failed to create staging dir: {e}"))
            })?;
        Ok(Self {
            assets_root: assets_root.into(),
            staged_dir,
            staged: Mutex::new(HashMap::new()),
        })
    }

    /// Root that relative media paths are resolved against.
    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    /// Return a readable file path for `media`.
    pub fn resolve(&self, media: &MediaRef) -> StoryboardResult<PathBuf> {
        if !media.is_data_url() {
            let norm = normalize_rel_path(media.as_str())?;
            return Ok(self.assets_root.join(Path::new(&norm)));
        }

        let mut staged = self
            .staged
            .lock()
            .map_err(|_| StoryboardError::Other(anyhow::anyhow!("media staging lock poisoned")))?;
        if let Some(path) = staged.get(media) {
            return Ok(path.clone());
        }

        let data = DataUrl::parse(media.as_str())?;
        let name = format!("media_{:04}.{}", staged.len(), data.extension());
        let path = self.staged_dir.path().join(name);
        std::fs::write(&path, &data.bytes).map_err(|e| {
            StoryboardError::Other(anyhow::anyhow!(
                "failed to stage media '{}': {e}",
                path.display()
            ))
        })?;
        tracing::debug!(media = %media.display_name(), path = %path.display(), "staged data url");
        staged.insert(media.clone(), path.clone());
        Ok(path)
    }
}

/// Parsed `data:` URL payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUrl {
    /// Declared MIME type (`application/octet-stream` when missing).
    pub mime: String,
    /// Decoded bytes.
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a base64 `data:` URL.
    pub fn parse(url: &str) -> StoryboardResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| StoryboardError::validation("not a data url"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| StoryboardError::validation("data url is missing ','"))?;
        let mut parts = header.split(';');
        let mime = match parts.next() {
            Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
            _ => "application/octet-stream".to_string(),
        };
        if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(StoryboardError::validation(
                "only base64 data urls are supported",
            ));
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| StoryboardError::validation(format!("invalid base64 in data url: {e}")))?;
        Ok(Self { mime, bytes })
    }

    /// File extension matching the MIME type, so ffmpeg picks the right demuxer.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "video/mp4" => "mp4",
            "video/quicktime" => "mov",
            "video/webm" | "audio/webm" => "webm",
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/ogg" => "ogg",
            "audio/mp4" | "audio/aac" | "audio/x-m4a" => "m4a",
            _ => "bin",
        }
    }
}

/// Normalize a relative asset path, rejecting absolute paths and `..`.
pub fn normalize_rel_path(source: &str) -> StoryboardResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StoryboardError::validation("media paths must be relative"));
    }
    if s.is_empty() {
        return Err(StoryboardError::validation("media path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StoryboardError::validation(
                "media paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StoryboardError::validation(
            "media path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/media/source.rs"]
mod tests;
