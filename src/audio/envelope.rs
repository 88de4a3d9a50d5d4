/// Background gain automation that dips under foreground audio.
///
/// Each window `[start, end)` ramps the gain linearly from `base` down to `ducked` over `ramp`
/// seconds after `start`, holds until `end`, then ramps back up over `ramp` seconds. Where ramps
/// of neighbouring windows overlap the deeper dip wins.
#[derive(Clone, Debug, PartialEq)]
pub struct DuckEnvelope {
    base: f32,
    ducked: f32,
    ramp_secs: f64,
    windows: Vec<(f64, f64)>,
}

impl DuckEnvelope {
    /// Constant gain, no ducking.
    pub fn constant(volume: f32) -> Self {
        Self {
            base: volume,
            ducked: volume,
            ramp_secs: 0.0,
            windows: Vec::new(),
        }
    }

    /// Duck to `volume * ratio` inside every window.
    ///
    /// Windows are sorted by start; empty or inverted windows are dropped and touching or
    /// overlapping ones are merged so back-to-back foreground segments hold the dip.
    pub fn ducked(volume: f32, ratio: f32, ramp_secs: f64, mut windows: Vec<(f64, f64)>) -> Self {
        windows.retain(|(s, e)| s.is_finite() && e.is_finite() && e > s);
        windows.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(windows.len());
        for w in windows {
            match merged.last_mut() {
                Some(last) if w.0 <= last.1 => last.1 = last.1.max(w.1),
                _ => merged.push(w),
            }
        }
        Self {
            base: volume,
            ducked: volume * ratio.clamp(0.0, 1.0),
            ramp_secs: if ramp_secs.is_finite() {
                ramp_secs.max(0.0)
            } else {
                0.0
            },
            windows: merged,
        }
    }

    /// Undimmed gain.
    pub fn base(&self) -> f32 {
        self.base
    }

    /// Fully dimmed gain.
    pub fn ducked_gain(&self) -> f32 {
        self.ducked
    }

    /// Foreground windows driving the envelope.
    pub fn windows(&self) -> &[(f64, f64)] {
        &self.windows
    }

    /// Gain at timeline time `t` seconds.
    pub fn gain_at(&self, t: f64) -> f32 {
        if self.windows.is_empty() {
            return self.base;
        }
        // Walk back from the last window starting at or before `t` while earlier windows may
        // still be releasing.
        let n = self.windows.partition_point(|w| w.0 <= t);
        let mut depth = 0.0f64;
        for &w in self.windows[..n].iter().rev() {
            if w.1 + self.ramp_secs < t {
                break;
            }
            depth = depth.max(self.depth(w, t));
        }
        self.base - (self.base - self.ducked) * depth as f32
    }

    fn depth(&self, (start, end): (f64, f64), t: f64) -> f64 {
        let r = self.ramp_secs;
        let attack = |x: f64| if r > 0.0 { (x / r).min(1.0) } else { 1.0 };
        if t < start {
            0.0
        } else if t < end {
            attack(t - start)
        } else if r > 0.0 && t < end + r {
            attack(end - start) * (1.0 - (t - end) / r)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/envelope.rs"]
mod tests;
