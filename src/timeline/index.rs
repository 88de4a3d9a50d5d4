use crate::foundation::error::{StoryboardError, StoryboardResult};

/// Cumulative start-time lookup over resolved segment durations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimelineIndex {
    starts: Vec<f64>,
    durations: Vec<f64>,
    total: f64,
}

/// Position inside the timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Locator {
    /// Segment index.
    pub index: usize,
    /// Seconds since the segment start, within `[0, duration]`.
    pub offset: f64,
}

impl TimelineIndex {
    /// Build the index. Every duration must be finite and > 0.
    pub fn new(durations: &[f64]) -> StoryboardResult<Self> {
        let mut starts = Vec::with_capacity(durations.len());
        let mut acc = 0.0f64;
        for (i, &d) in durations.iter().enumerate() {
            if !d.is_finite() || d <= 0.0 {
                return Err(StoryboardError::validation(format!(
                    "segment {i} duration must be finite and > 0 (got {d})"
                )));
            }
            starts.push(acc);
            acc += d;
        }
        Ok(Self {
            starts,
            durations: durations.to_vec(),
            total: acc,
        })
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Return `true` when the index has no segments.
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Total duration in seconds.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Cumulative start times.
    pub fn starts(&self) -> &[f64] {
        &self.starts
    }

    /// Resolved durations.
    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    /// Start time of segment `i`.
    pub fn start(&self, i: usize) -> Option<f64> {
        self.starts.get(i).copied()
    }

    /// Duration of segment `i`.
    pub fn duration(&self, i: usize) -> Option<f64> {
        self.durations.get(i).copied()
    }

    /// End time of segment `i` (exclusive).
    pub fn end(&self, i: usize) -> Option<f64> {
        Some(self.start(i)? + self.duration(i)?)
    }

    /// Greatest `i` with `starts[i] <= t`, clamped to `[0, n-1]`.
    ///
    /// `t >= total` maps to the last segment; callers detect end-of-timeline themselves. Returns
    /// `None` only when the index is empty.
    pub fn segment_at(&self, t: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let t = if t.is_nan() { 0.0 } else { t };
        let count = self.starts.partition_point(|&s| s <= t);
        Some(count.saturating_sub(1).min(self.len() - 1))
    }

    /// Segment and intra-segment offset for absolute time `t`.
    pub fn locate(&self, t: f64) -> Option<Locator> {
        let index = self.segment_at(t)?;
        let offset = (t - self.starts[index]).clamp(0.0, self.durations[index]);
        let offset = if offset.is_nan() { 0.0 } else { offset };
        Some(Locator { index, offset })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/index.rs"]
mod tests;
