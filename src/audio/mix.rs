use std::collections::HashMap;
use std::sync::Arc;

use crate::audio::envelope::DuckEnvelope;
use crate::foundation::core::{samples_to_secs, secs_to_samples};
use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::media::service::{AudioDecoder, AudioPcm};
use crate::model::project::{BackgroundTrack, MediaKind, MediaRef};
use crate::timeline::Timeline;

/// Internal audio mixing sample rate used across decode/mix/encode.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Longest timeline a mix plan is built for, in seconds (24 h).
pub const MAX_MIX_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Mixdown settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MixOpts {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count (1 or 2).
    pub channels: u16,
    /// Background gain multiplier while foreground audio plays.
    pub duck_ratio: f32,
    /// Attack and release time of the ducking ramps, in seconds.
    pub duck_ramp_secs: f64,
}

impl Default for MixOpts {
    fn default() -> Self {
        Self {
            sample_rate: MIX_SAMPLE_RATE,
            channels: 2,
            duck_ratio: 0.25,
            duck_ramp_secs: 0.12,
        }
    }
}

impl MixOpts {
    /// Check output format and ducking parameters.
    pub fn validate(&self) -> StoryboardResult<()> {
        if self.sample_rate == 0 {
            return Err(StoryboardError::validation("mix sample_rate must be > 0"));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(StoryboardError::validation("mix channels must be 1 or 2"));
        }
        if !(0.0..=1.0).contains(&self.duck_ratio) {
            return Err(StoryboardError::validation(
                "duck_ratio must be within [0, 1]",
            ));
        }
        if !self.duck_ramp_secs.is_finite() || self.duck_ramp_secs < 0.0 {
            return Err(StoryboardError::validation(
                "duck_ramp_secs must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Gain applied to a layer.
pub enum LayerGain {
    /// Fixed linear gain.
    Constant(f32),
    /// Time-varying gain evaluated on the timeline clock.
    Envelope(DuckEnvelope),
}

impl LayerGain {
    fn at(&self, t: f64) -> f32 {
        match self {
            Self::Constant(g) => *g,
            Self::Envelope(env) => env.gain_at(t),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What a layer contributes.
pub enum LayerRole {
    /// Looped background music.
    Background,
    /// Voice note of segment `.0`.
    Voice(usize),
    /// Own sound of the video in segment `.0`.
    ClipAudio(usize),
}

#[derive(Clone, Debug)]
/// One scheduled audio contribution in timeline sample space.
pub struct MixLayer {
    /// Role of the layer.
    pub role: LayerRole,
    /// First output sample frame (inclusive).
    pub timeline_start_sample: u64,
    /// Last output sample frame (exclusive).
    pub timeline_end_sample: u64,
    /// Repeat the source until `timeline_end_sample`.
    pub looped: bool,
    /// Gain automation.
    pub gain: LayerGain,
    /// Source sample rate in Hz.
    pub source_sample_rate: u32,
    /// Source channel count.
    pub source_channels: u16,
    /// Interleaved source PCM.
    pub source_interleaved_f32: Arc<Vec<f32>>,
}

#[derive(Clone, Debug)]
/// Audio rendering plan over a whole timeline.
pub struct MixPlan {
    /// Output sample rate.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
    /// Output length in sample frames.
    pub total_samples: u64,
    /// Scheduled layers.
    pub layers: Vec<MixLayer>,
}

impl MixPlan {
    /// Return `true` when no source contributes audio.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Rendered interleaved soundtrack.
pub struct MixBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples in `[-1, 1]`.
    pub samples: Vec<f32>,
}

impl MixBuffer {
    /// Length in sample frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        samples_to_secs(self.frames() as u64, self.sample_rate)
    }
}

struct DecodeCache<'a> {
    decoder: &'a dyn AudioDecoder,
    decoded: HashMap<MediaRef, Option<Arc<AudioPcm>>>,
}

impl<'a> DecodeCache<'a> {
    fn new(decoder: &'a dyn AudioDecoder) -> Self {
        Self {
            decoder,
            decoded: HashMap::new(),
        }
    }

    /// Decode once per reference; failures are logged and yield `None` (silence).
    async fn get(&mut self, media: &MediaRef, what: &str) -> Option<Arc<AudioPcm>> {
        if let Some(hit) = self.decoded.get(media) {
            return hit.clone();
        }
        let pcm = match self.decoder.decode_audio(media).await {
            Ok(pcm) if pcm.is_empty() => {
                tracing::debug!(media = %media.display_name(), what, "no audio stream");
                None
            }
            Ok(pcm) => Some(Arc::new(pcm)),
            Err(e) => {
                tracing::warn!(
                    media = %media.display_name(),
                    what,
                    error = %e,
                    "audio decode failed; contributing silence"
                );
                None
            }
        };
        self.decoded.insert(media.clone(), pcm.clone());
        pcm
    }
}

/// Plan the mixdown of a timeline.
///
/// Lays out the looped background (ducked under every foreground segment when enabled), each
/// voice note and each video's own audio at its segment start, bounded by the segment end. Video
/// audio is never ducked. Individual decode failures only silence the affected layer.
pub async fn build_mix_plan(
    timeline: &Timeline,
    background: Option<&BackgroundTrack>,
    decoder: &dyn AudioDecoder,
    opts: &MixOpts,
) -> StoryboardResult<MixPlan> {
    opts.validate()?;
    let sr = opts.sample_rate;
    let index = timeline.index();
    if index.total() > MAX_MIX_SECS {
        return Err(StoryboardError::validation(format!(
            "timeline of {:.1}s exceeds the {MAX_MIX_SECS}s mixdown limit",
            index.total()
        )));
    }
    let total_samples = secs_to_samples(index.total(), sr);
    let mut cache = DecodeCache::new(decoder);
    let mut layers = Vec::new();

    if let Some(bg) = background
        && bg.volume > 0.0
        && total_samples > 0
        && let Some(pcm) = cache.get(&bg.src, "background").await
    {
        let gain = if bg.ducking {
            let windows = timeline
                .segments()
                .iter()
                .enumerate()
                .filter(|(_, seg)| seg.has_foreground_audio())
                .filter_map(|(i, _)| Some((index.start(i)?, index.end(i)?)))
                .collect();
            LayerGain::Envelope(DuckEnvelope::ducked(
                bg.volume,
                opts.duck_ratio,
                opts.duck_ramp_secs,
                windows,
            ))
        } else {
            LayerGain::Constant(bg.volume)
        };
        layers.push(layer_from_pcm(
            LayerRole::Background,
            0,
            total_samples,
            true,
            gain,
            &pcm,
        ));
    }

    for (i, seg) in timeline.segments().iter().enumerate() {
        let (Some(start), Some(end)) = (index.start(i), index.end(i)) else {
            continue;
        };
        let start_sample = secs_to_samples(start, sr);
        let end_sample = secs_to_samples(end, sr).min(total_samples);
        if start_sample >= end_sample {
            continue;
        }

        let shot = &seg.shot.shot;
        if let Some(note) = shot.voice_note()
            && let Some(pcm) = cache.get(&note.audio, "voice note").await
        {
            layers.push(layer_from_pcm(
                LayerRole::Voice(i),
                start_sample,
                end_sample,
                false,
                LayerGain::Constant(1.0),
                &pcm,
            ));
        }
        if shot.kind == MediaKind::Video
            && let Some(pcm) = cache.get(&shot.src, "clip audio").await
        {
            layers.push(layer_from_pcm(
                LayerRole::ClipAudio(i),
                start_sample,
                end_sample,
                false,
                LayerGain::Constant(1.0),
                &pcm,
            ));
        }
    }

    tracing::debug!(
        layers = layers.len(),
        total_samples,
        sample_rate = sr,
        "mix plan built"
    );

    Ok(MixPlan {
        sample_rate: sr,
        channels: opts.channels,
        total_samples,
        layers,
    })
}

fn layer_from_pcm(
    role: LayerRole,
    timeline_start_sample: u64,
    timeline_end_sample: u64,
    looped: bool,
    gain: LayerGain,
    pcm: &Arc<AudioPcm>,
) -> MixLayer {
    MixLayer {
        role,
        timeline_start_sample,
        timeline_end_sample,
        looped,
        gain,
        source_sample_rate: pcm.sample_rate,
        source_channels: pcm.channels,
        source_interleaved_f32: Arc::new(pcm.interleaved_f32.clone()),
    }
}

/// Render a plan into one interleaved buffer of exactly `total_samples` frames.
pub fn render_mix(plan: &MixPlan) -> MixBuffer {
    let frames = plan.total_samples as usize;
    let mut out = vec![0.0f32; frames * usize::from(plan.channels)];

    for layer in &plan.layers {
        mix_layer(&mut out, plan, layer);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    MixBuffer {
        sample_rate: plan.sample_rate,
        channels: plan.channels,
        samples: out,
    }
}

/// Plan and render in one step.
pub async fn mixdown(
    timeline: &Timeline,
    background: Option<&BackgroundTrack>,
    decoder: &dyn AudioDecoder,
    opts: &MixOpts,
) -> StoryboardResult<MixBuffer> {
    let plan = build_mix_plan(timeline, background, decoder, opts).await?;
    Ok(render_mix(&plan))
}

fn mix_layer(out: &mut [f32], plan: &MixPlan, layer: &MixLayer) {
    let end = layer.timeline_end_sample.min(plan.total_samples);
    if layer.timeline_start_sample >= end || layer.source_sample_rate == 0 {
        return;
    }

    let src = layer.source_interleaved_f32.as_ref();
    let src_ch = usize::from(layer.source_channels.max(1));
    let src_frames = src.len() / src_ch;
    if src_frames == 0 {
        return;
    }
    let out_ch = usize::from(plan.channels);

    for dst_sample in layer.timeline_start_sample..end {
        let rel_sample = dst_sample - layer.timeline_start_sample;
        let rel_sec = (rel_sample as f64) / f64::from(plan.sample_rate);

        let mut src_pos = rel_sec * f64::from(layer.source_sample_rate);
        if !src_pos.is_finite() || src_pos < 0.0 {
            break;
        }
        if layer.looped {
            src_pos %= src_frames as f64;
        }
        let src_frame0 = src_pos.floor() as usize;
        if src_frame0 >= src_frames {
            break;
        }
        let src_frame1 = if layer.looped {
            (src_frame0 + 1) % src_frames
        } else {
            (src_frame0 + 1).min(src_frames - 1)
        };
        let frac = (src_pos - src_frame0 as f64) as f32;

        let t = (dst_sample as f64) / f64::from(plan.sample_rate);
        let gain = layer.gain.at(t);
        let dst_idx = dst_sample as usize * out_ch;

        let (l, r) = if src_ch == 1 {
            let v0 = src[src_frame0];
            let v1 = src[src_frame1];
            let v = v0 + ((v1 - v0) * frac);
            (v, v)
        } else {
            let i0 = src_frame0 * src_ch;
            let i1 = src_frame1 * src_ch;
            let l0 = src[i0];
            let l1 = src[i1];
            let r0 = src[i0 + 1];
            let r1 = src[i1 + 1];
            (l0 + ((l1 - l0) * frac), r0 + ((r1 - r0) * frac))
        };

        if out_ch > 1 {
            out[dst_idx] += l * gain;
            out[dst_idx + 1] += r * gain;
        } else {
            out[dst_idx] += 0.5 * (l + r) * gain;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
