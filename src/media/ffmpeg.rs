use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::media::service::{AudioDecoder, AudioPcm, MediaProbe};
use crate::media::source::MediaStaging;
use crate::model::project::MediaRef;

/// Probe and decode media through the system `ffprobe`/`ffmpeg` binaries.
#[derive(Clone, Debug)]
pub struct FfmpegMedia {
    staging: Arc<MediaStaging>,
    sample_rate: u32,
    channels: u16,
}

impl FfmpegMedia {
    /// Decode to `sample_rate`/`channels`, resolving media through `staging`.
    pub fn new(staging: Arc<MediaStaging>, sample_rate: u32, channels: u16) -> Self {
        Self {
            staging,
            sample_rate,
            channels,
        }
    }
}

#[async_trait]
impl MediaProbe for FfmpegMedia {
    async fn probe_duration(&self, media: &MediaRef) -> StoryboardResult<f64> {
        let path = self.staging.resolve(media)?;
        probe_duration_secs(&path).await
    }
}

#[async_trait]
impl AudioDecoder for FfmpegMedia {
    async fn decode_audio(&self, media: &MediaRef) -> StoryboardResult<AudioPcm> {
        let path = self.staging.resolve(media)?;
        decode_audio_f32(&path, self.sample_rate, self.channels).await
    }
}

/// Read the playable duration of a media file through `ffprobe`.
///
/// Uses the container duration and falls back to the longest stream duration.
pub async fn probe_duration_secs(source_path: &Path) -> StoryboardResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .await
        .map_err(|e| StoryboardError::probe(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(StoryboardError::probe(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| StoryboardError::probe(format!("ffprobe json parse failed: {e}")))?;
    let parse = |s: &Option<String>| s.as_deref().and_then(|v| v.parse::<f64>().ok());

    let from_format = parsed.format.as_ref().and_then(|f| parse(&f.duration));
    let from_streams = parsed
        .streams
        .iter()
        .filter_map(|s| parse(&s.duration))
        .fold(None::<f64>, |acc, d| Some(acc.map_or(d, |a| a.max(d))));

    from_format
        .or(from_streams)
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| {
            StoryboardError::probe(format!(
                "no usable duration reported for '{}'",
                source_path.display()
            ))
        })
}

/// Decode audio from a media file to interleaved `f32` PCM.
pub async fn decode_audio_f32(
    path: &Path,
    sample_rate: u32,
    channels: u16,
) -> StoryboardResult<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &channels.to_string(),
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .await
        .map_err(|e| {
            StoryboardError::decode(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        // ffmpeg reports a missing audio stream as an error; a silent clip is not a failure.
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(StoryboardError::decode(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: f32le_to_samples(&out.stdout)?,
    })
}

fn f32le_to_samples(bytes: &[u8]) -> StoryboardResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(StoryboardError::decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
