use crate::foundation::error::{StoryboardError, StoryboardResult};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> StoryboardResult<Self> {
        if den == 0 {
            return Err(StoryboardError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(StoryboardError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Format as `num/den`, the form `ffmpeg -r` accepts.
    pub fn to_ffmpeg_rate(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

/// Convert seconds to a sample-frame count at `sample_rate`, rounding to nearest.
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * f64::from(sample_rate)).round() as u64
}

/// Convert a sample-frame count back to seconds.
pub fn samples_to_secs(samples: u64, sample_rate: u32) -> f64 {
    (samples as f64) / f64::from(sample_rate)
}

/// Format seconds as `m:ss` (rounded to whole seconds).
pub fn format_time(secs: f64) -> String {
    let s = if secs.is_finite() {
        secs.max(0.0).round() as u64
    } else {
        0
    };
    format!("{}:{:02}", s / 60, s % 60)
}

/// Turn a free-form project name into a file stem.
///
/// Runs of characters outside `[A-Za-z0-9_-]` collapse into one `_`; the result is capped at 60
/// characters.
pub fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out.chars().take(60).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
