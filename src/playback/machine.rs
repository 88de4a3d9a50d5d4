use std::sync::Arc;
use std::time::Duration;

use crate::model::project::MediaKind;
use crate::playback::output::{Foreground, SegmentEntered};
use crate::presentation::overlay::Overlay;
use crate::timeline::Timeline;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Identity of one segment entry.
///
/// Timers and media-end signals carry the entry they were armed for; once an entry is consumed
/// (advanced, sought away from, paused, closed) its late signals are ignored.
pub struct EntryId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
/// Playback session state.
pub enum PlaybackState {
    /// Not started, or closed.
    Idle,
    /// Playing segment `index`, entered at `offset` seconds into it.
    Playing {
        /// Segment index.
        index: usize,
        /// Entry offset within the segment.
        offset: f64,
    },
    /// Paused at `offset` seconds into segment `index`.
    Paused {
        /// Segment index.
        index: usize,
        /// Pause position within the segment.
        offset: f64,
    },
    /// Ran past the last segment.
    Ended,
}

#[derive(Clone, Debug, PartialEq)]
/// Side effect requested by a transition, executed in order by the driver.
pub enum Directive {
    /// Render a segment entry.
    Show(SegmentEntered),
    /// Start the segment's foreground audio at an intra-segment offset.
    StartForeground {
        /// Entry the source belongs to.
        entry: EntryId,
        /// What to play.
        source: Foreground,
        /// Offset into the source, in seconds.
        offset: f64,
    },
    /// Stop the current foreground source, if any.
    StopForeground,
    /// Arm the single segment timer.
    ArmTimer {
        /// Entry the timer belongs to.
        entry: EntryId,
        /// Time until the segment ends.
        after: Duration,
    },
    /// Disarm the segment timer.
    CancelTimer,
    /// End the session: stop audio, reset progress, release the surface.
    Teardown,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    id: EntryId,
    index: usize,
    consumed: bool,
}

/// Segment scheduling without clocks or IO.
///
/// Every transition returns the [`Directive`]s the driver must execute. Advancement only happens
/// through [`PlaybackMachine::on_timer`] and [`PlaybackMachine::on_media_ended`], both guarded by
/// the current entry.
#[derive(Debug)]
pub struct PlaybackMachine {
    timeline: Arc<Timeline>,
    state: PlaybackState,
    current: Option<Entry>,
    next_entry: u64,
}

impl PlaybackMachine {
    /// Create an idle machine over a session snapshot.
    pub fn new(timeline: Arc<Timeline>) -> Self {
        Self {
            timeline,
            state: PlaybackState::Idle,
            current: None,
            next_entry: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Session snapshot.
    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// Entry currently armed, if it has not been consumed.
    pub fn live_entry(&self) -> Option<EntryId> {
        self.current.filter(|e| !e.consumed).map(|e| e.id)
    }

    /// Start a run at absolute time `at`, tearing down any run in progress.
    ///
    /// An empty timeline is a no-op: no directives, state stays unchanged.
    pub fn start(&mut self, at: f64) -> Vec<Directive> {
        let Some(loc) = self.timeline.index().locate(at) else {
            return Vec::new();
        };
        let mut out = self.halt();
        if matches!(self.state, PlaybackState::Playing { .. } | PlaybackState::Paused { .. }) {
            out.push(Directive::Teardown);
        }
        self.enter(loc.index, loc.offset, &mut out);
        out
    }

    /// Segment timer for `entry` expired.
    pub fn on_timer(&mut self, entry: EntryId) -> Vec<Directive> {
        self.advance(entry)
    }

    /// Foreground media of `entry` played to its end.
    ///
    /// Only a video's end finishes its segment; a still's duration already covers its voice note.
    pub fn on_media_ended(&mut self, entry: EntryId) -> Vec<Directive> {
        let is_video = self
            .current
            .and_then(|e| self.timeline.segment(e.index))
            .is_some_and(|seg| seg.kind() == MediaKind::Video);
        if !is_video {
            return Vec::new();
        }
        self.advance(entry)
    }

    /// Move past the segment of `entry`. Stale or already consumed entries are ignored.
    pub fn advance(&mut self, entry: EntryId) -> Vec<Directive> {
        let Some(cur) = self.current.as_mut() else {
            return Vec::new();
        };
        if cur.id != entry || cur.consumed || !matches!(self.state, PlaybackState::Playing { .. }) {
            tracing::trace!(entry = entry.0, "ignoring stale advance");
            return Vec::new();
        }
        cur.consumed = true;
        let next = cur.index + 1;

        let mut out = vec![Directive::CancelTimer, Directive::StopForeground];
        if next >= self.timeline.len() {
            tracing::debug!(segments = self.timeline.len(), "playback reached the end");
            self.state = PlaybackState::Ended;
            self.current = None;
            out.push(Directive::Teardown);
        } else {
            self.enter(next, 0.0, &mut out);
        }
        out
    }

    /// Jump to absolute time `t`. From `Idle` or `Ended` this starts a new run.
    pub fn seek(&mut self, t: f64) -> Vec<Directive> {
        match self.state {
            PlaybackState::Idle | PlaybackState::Ended => self.start(t),
            PlaybackState::Playing { .. } | PlaybackState::Paused { .. } => {
                let Some(loc) = self.timeline.index().locate(t) else {
                    return Vec::new();
                };
                let mut out = self.halt();
                self.enter(loc.index, loc.offset, &mut out);
                out
            }
        }
    }

    /// Jump to `ratio` of the total duration (clamped to `[0, 1]`).
    pub fn seek_ratio(&mut self, ratio: f64) -> Vec<Directive> {
        let ratio = if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        };
        self.seek(ratio * self.timeline.total())
    }

    /// Pause at `offset` seconds into the current segment.
    pub fn pause(&mut self, offset: f64) -> Vec<Directive> {
        let PlaybackState::Playing { index, .. } = self.state else {
            return Vec::new();
        };
        let duration = self.timeline.index().duration(index).unwrap_or(0.0);
        let offset = if offset.is_finite() {
            offset.clamp(0.0, duration)
        } else {
            0.0
        };
        let out = self.halt();
        self.state = PlaybackState::Paused { index, offset };
        out
    }

    /// Resume a paused run with a fresh entry at the paused position.
    pub fn resume(&mut self) -> Vec<Directive> {
        let PlaybackState::Paused { index, offset } = self.state else {
            return Vec::new();
        };
        let mut out = Vec::new();
        self.enter(index, offset, &mut out);
        out
    }

    /// Cancel everything and tear the session down.
    pub fn close(&mut self) -> Vec<Directive> {
        match self.state {
            PlaybackState::Idle => Vec::new(),
            PlaybackState::Ended => {
                self.state = PlaybackState::Idle;
                Vec::new()
            }
            PlaybackState::Playing { .. } | PlaybackState::Paused { .. } => {
                let mut out = self.halt();
                out.push(Directive::Teardown);
                self.state = PlaybackState::Idle;
                self.current = None;
                out
            }
        }
    }

    fn halt(&mut self) -> Vec<Directive> {
        match self.current.as_mut() {
            Some(cur) if !cur.consumed => {
                cur.consumed = true;
                vec![Directive::CancelTimer, Directive::StopForeground]
            }
            _ => Vec::new(),
        }
    }

    fn enter(&mut self, index: usize, offset: f64, out: &mut Vec<Directive>) {
        let Some(seg) = self.timeline.segment(index) else {
            return;
        };
        let index_ref = self.timeline.index();
        let start = index_ref.start(index).unwrap_or(0.0);
        let offset = offset.clamp(0.0, seg.duration);

        let id = EntryId(self.next_entry);
        self.next_entry += 1;
        self.current = Some(Entry {
            id,
            index,
            consumed: false,
        });
        self.state = PlaybackState::Playing { index, offset };

        let shot = &seg.shot.shot;
        tracing::debug!(entry = id.0, index, offset, shot = %shot.id, "entering segment");
        out.push(Directive::Show(SegmentEntered {
            entry: id,
            index,
            count: self.timeline.len(),
            start,
            duration: seg.duration,
            offset,
            kind: shot.kind,
            media: shot.src.clone(),
            overlay: Overlay::for_shot(&seg.shot),
        }));

        let foreground = match shot.kind {
            MediaKind::Video => Some(Foreground::Video(shot.src.clone())),
            MediaKind::Image => shot
                .voice_note()
                .map(|note| Foreground::Voice(note.audio.clone())),
        };
        if let Some(source) = foreground {
            out.push(Directive::StartForeground {
                entry: id,
                source,
                offset,
            });
        }

        out.push(Directive::ArmTimer {
            entry: id,
            after: Duration::try_from_secs_f64((seg.duration - offset).max(0.0))
                .unwrap_or(Duration::MAX),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/machine.rs"]
mod tests;
