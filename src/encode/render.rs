use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::foundation::error::StoryboardResult;
use crate::timeline::Segment;

#[derive(Clone, Debug, PartialEq)]
/// Rendered picture part of one segment.
pub struct PictureBlob {
    /// Segment index.
    pub index: usize,
    /// Encoded part on disk.
    pub path: PathBuf,
    /// Part length in seconds.
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
/// Concatenated silent picture track.
pub struct VideoBlob {
    /// Encoded file on disk.
    pub path: PathBuf,
    /// Length in seconds.
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Mixed soundtrack as a complete WAV file.
pub struct AudioBlob {
    /// RIFF/WAVE bytes.
    pub wav: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Final deliverable.
pub struct FinalFile {
    /// Written file.
    pub path: PathBuf,
}

/// Opaque encoder used by the export pipeline.
#[async_trait]
pub trait MediaRenderer: Send + Sync {
    /// Render segment `index` as a silent picture part of exactly its resolved duration.
    async fn render_segment_picture(
        &self,
        index: usize,
        segment: &Segment,
    ) -> StoryboardResult<PictureBlob>;

    /// Join parts, in order, into one picture track.
    async fn concatenate(&self, parts: &[PictureBlob]) -> StoryboardResult<VideoBlob>;

    /// Combine the picture track with an optional soundtrack into `out`.
    async fn mux(
        &self,
        video: &VideoBlob,
        audio: Option<&AudioBlob>,
        out: &Path,
    ) -> StoryboardResult<FinalFile>;
}
