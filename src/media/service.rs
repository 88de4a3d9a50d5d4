use async_trait::async_trait;

use crate::foundation::error::StoryboardResult;
use crate::model::project::MediaRef;

#[derive(Clone, Debug, Default)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Return `true` when there is nothing to play.
    pub fn is_empty(&self) -> bool {
        self.frames() == 0 || self.sample_rate == 0
    }
}

/// Reads the intrinsic playable duration of a media reference.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration in seconds. Callers substitute a default on error.
    async fn probe_duration(&self, media: &MediaRef) -> StoryboardResult<f64>;
}

/// Decodes the audio of a media reference (audio file or a video's sound track).
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Decoded PCM. A media file without audio yields empty PCM, not an error.
    async fn decode_audio(&self, media: &MediaRef) -> StoryboardResult<AudioPcm>;
}
