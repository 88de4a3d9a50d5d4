use std::path::Path;

use crate::audio::mix::MixOpts;
use crate::encode::ffmpeg::RenderOpts;
use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::playback::driver::PlaybackOpts;
use crate::timeline::duration::TimingPolicy;

/// Engine configuration. Every section and field is optional in JSON.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoryboardConfig {
    /// Segment duration rules.
    pub timing: TimingPolicy,
    /// Mixdown format and ducking.
    pub mix: MixOpts,
    /// Live playback driver settings.
    pub playback: PlaybackOpts,
    /// Film export output settings.
    pub render: RenderOpts,
}

impl StoryboardConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(s: &str) -> StoryboardResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| StoryboardError::serde(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> StoryboardResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StoryboardError::Other(anyhow::anyhow!(
                "failed to read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&text)
    }

    /// Validate every section.
    pub fn validate(&self) -> StoryboardResult<()> {
        self.timing.validate()?;
        self.mix.validate()?;
        self.playback.validate()?;
        self.render.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
