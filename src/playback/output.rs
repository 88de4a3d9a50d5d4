use tokio::sync::oneshot;

use crate::foundation::error::StoryboardResult;
use crate::model::project::{MediaKind, MediaRef};
use crate::playback::machine::EntryId;
use crate::presentation::overlay::Overlay;

#[derive(Clone, Debug, PartialEq)]
/// Everything a surface needs to render one segment entry.
pub struct SegmentEntered {
    /// Entry identity (fresh for every entry, including re-entries after seek or resume).
    pub entry: EntryId,
    /// Segment index.
    pub index: usize,
    /// Number of segments.
    pub count: usize,
    /// Segment start on the timeline, in seconds.
    pub start: f64,
    /// Resolved segment duration, in seconds.
    pub duration: f64,
    /// Intra-segment offset the entry starts at.
    pub offset: f64,
    /// Media kind shown.
    pub kind: MediaKind,
    /// Picture or video to show.
    pub media: MediaRef,
    /// Overlay text.
    pub overlay: Overlay,
}

/// Display side of a playback session.
///
/// `enter` takes the exclusive presentation lock (fullscreen), `exit` releases it.
pub trait PresentationSurface: Send {
    /// Acquire the presentation surface.
    fn enter(&mut self);
    /// Render a segment.
    fn show_segment(&mut self, entered: &SegmentEntered);
    /// Update the scrub bar; `ratio` is `elapsed / total` in `[0, 1]`.
    fn progress(&mut self, ratio: f64);
    /// Release the presentation surface.
    fn exit(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Foreground audio source of a segment.
pub enum Foreground {
    /// Voice note attached to a still.
    Voice(MediaRef),
    /// A video's own sound.
    Video(MediaRef),
}

/// A running foreground source.
pub trait ForegroundAudio: Send {
    /// Stop playback. Must be idempotent.
    fn stop(&mut self);
}

/// Handle plus the optional natural-end signal of a started source.
pub struct ForegroundPlayback {
    /// Control handle.
    pub handle: Box<dyn ForegroundAudio>,
    /// Fires once when the media plays to its end; dropped senders are ignored.
    pub ended: Option<oneshot::Receiver<()>>,
}

impl std::fmt::Debug for ForegroundPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForegroundPlayback")
            .field("ended", &self.ended.is_some())
            .finish_non_exhaustive()
    }
}

/// Starts foreground media for the driver.
pub trait ForegroundPlayer: Send {
    /// Start `source` at `offset` seconds into it.
    fn play(&mut self, source: &Foreground, offset: f64) -> StoryboardResult<ForegroundPlayback>;
}
