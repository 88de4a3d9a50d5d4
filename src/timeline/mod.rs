//! Timeline derivation: flattening, duration resolution and the cumulative index.

pub(crate) mod duration;
pub(crate) mod flatten;
pub(crate) mod index;

use crate::foundation::error::StoryboardResult;
use crate::media::service::MediaProbe;
use crate::model::project::{MediaKind, Project, Scene};
use crate::timeline::duration::{TimingPolicy, resolve_durations};
use crate::timeline::flatten::{FlatShot, flatten_scenes};
use crate::timeline::index::TimelineIndex;

#[derive(Clone, Debug)]
/// A flattened shot paired with its resolved playback duration.
pub struct Segment {
    /// Source shot and its scene.
    pub shot: FlatShot,
    /// Resolved on-screen duration in seconds (always > 0).
    pub duration: f64,
}

impl Segment {
    /// Return `true` for segments carrying a voice note or a video's own sound.
    pub fn has_foreground_audio(&self) -> bool {
        self.shot.shot.has_foreground_audio()
    }

    /// Media kind of the underlying shot.
    pub fn kind(&self) -> MediaKind {
        self.shot.shot.kind
    }
}

#[derive(Clone, Debug, Default)]
/// Session snapshot: ordered segments and the index over their durations.
///
/// Both live playback and offline mixdown read the same snapshot, so what is shown matches what is
/// heard.
pub struct Timeline {
    segments: Vec<Segment>,
    index: TimelineIndex,
}

impl Timeline {
    /// Flatten `scenes`, resolve every duration, then build the index.
    pub async fn build(
        scenes: &[Scene],
        probe: &dyn MediaProbe,
        policy: &TimingPolicy,
    ) -> StoryboardResult<Self> {
        let flat = flatten_scenes(scenes);
        let durations = resolve_durations(&flat, probe, policy).await;
        let segments = flat
            .into_iter()
            .zip(durations)
            .map(|(shot, duration)| Segment { shot, duration })
            .collect();
        Self::from_segments(segments)
    }

    /// Build a snapshot of a whole project.
    pub async fn for_project(
        project: &Project,
        probe: &dyn MediaProbe,
        policy: &TimingPolicy,
    ) -> StoryboardResult<Self> {
        Self::build(&project.scenes, probe, policy).await
    }

    /// Assemble a timeline from already resolved segments.
    pub fn from_segments(segments: Vec<Segment>) -> StoryboardResult<Self> {
        let durations: Vec<f64> = segments.iter().map(|s| s.duration).collect();
        let index = TimelineIndex::new(&durations)?;
        Ok(Self { segments, index })
    }

    /// Ordered segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Borrow one segment.
    pub fn segment(&self, i: usize) -> Option<&Segment> {
        self.segments.get(i)
    }

    /// Cumulative index.
    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Return `true` when there is nothing to play.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total duration in seconds.
    pub fn total(&self) -> f64 {
        self.index.total()
    }
}
