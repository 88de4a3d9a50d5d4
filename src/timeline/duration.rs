use std::collections::HashMap;

use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::media::service::MediaProbe;
use crate::model::project::{MediaKind, MediaRef, Shot};
use crate::timeline::flatten::FlatShot;

/// Rules turning shots into on-screen durations.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TimingPolicy {
    /// Still duration used when no valid manual duration is set (project-wide floor).
    pub default_still_secs: f64,
    /// Smallest accepted manual still duration.
    pub still_min_secs: f64,
    /// Largest accepted manual still duration.
    pub still_max_secs: f64,
    /// Ceiling applied to video clips; also the fallback when probing fails.
    pub video_cap_secs: f64,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            default_still_secs: 7.0,
            still_min_secs: 1.0,
            still_max_secs: 30.0,
            video_cap_secs: 7.0,
        }
    }
}

impl TimingPolicy {
    /// Check that every bound is finite and positive.
    pub fn validate(&self) -> StoryboardResult<()> {
        let all = [
            self.default_still_secs,
            self.still_min_secs,
            self.still_max_secs,
            self.video_cap_secs,
        ];
        if all.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(StoryboardError::validation(
                "timing durations must be finite and > 0",
            ));
        }
        if self.still_min_secs > self.still_max_secs {
            return Err(StoryboardError::validation(
                "still_min_secs must be <= still_max_secs",
            ));
        }
        Ok(())
    }

    /// Base hold time of an image: the manual duration when in range, else the default.
    pub fn still_base(&self, manual: Option<f64>) -> f64 {
        match manual {
            Some(secs) if secs >= self.still_min_secs && secs <= self.still_max_secs => secs,
            _ => self.default_still_secs,
        }
    }

    /// Duration of an image shot: long enough for its voice note.
    pub fn image_duration(&self, shot: &Shot) -> f64 {
        let voice = shot
            .voice_note()
            .map(|n| n.duration)
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(0.0);
        self.still_base(shot.meta.still_secs).max(voice)
    }

    /// Duration of a video shot from its probed length, capped.
    pub fn video_duration(&self, probed: Option<f64>) -> f64 {
        match probed {
            Some(secs) if secs.is_finite() && secs > 0.0 => secs.min(self.video_cap_secs),
            _ => self.video_cap_secs,
        }
    }
}

/// Resolve the duration of every flattened shot.
///
/// Video probing is awaited for all segments before returning; a failed probe degrades to the cap.
/// Each distinct media reference is probed once.
pub async fn resolve_durations(
    flat: &[FlatShot],
    probe: &dyn MediaProbe,
    policy: &TimingPolicy,
) -> Vec<f64> {
    let mut probed: HashMap<&MediaRef, Option<f64>> = HashMap::new();
    let mut out = Vec::with_capacity(flat.len());

    for item in flat {
        let shot = &item.shot;
        let secs = match shot.kind {
            MediaKind::Image => policy.image_duration(shot),
            MediaKind::Video => {
                let intrinsic = match probed.get(&shot.src) {
                    Some(v) => *v,
                    None => {
                        let v = match probe.probe_duration(&shot.src).await {
                            Ok(secs) => Some(secs),
                            Err(e) => {
                                tracing::warn!(
                                    shot = %shot.id,
                                    media = %shot.src.display_name(),
                                    error = %e,
                                    "video probe failed; using duration cap"
                                );
                                None
                            }
                        };
                        probed.insert(&shot.src, v);
                        v
                    }
                };
                policy.video_duration(intrinsic)
            }
        };
        out.push(secs);
    }

    out
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/duration.rs"]
mod tests;
