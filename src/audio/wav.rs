use std::path::Path;

use crate::audio::mix::MixBuffer;
use crate::foundation::error::{StoryboardError, StoryboardResult};

const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;

/// Serialize a mix as a canonical RIFF/WAVE file with 16-bit PCM samples.
pub fn encode_wav_pcm16(mix: &MixBuffer) -> Vec<u8> {
    let channels = mix.channels.max(1);
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = mix.sample_rate * u32::from(block_align);
    let data_len = (mix.samples.len() * 2) as u32;

    let mut out = Vec::with_capacity(HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&mix.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for &s in &mix.samples {
        out.extend_from_slice(&sample_to_i16(s).to_le_bytes());
    }
    out
}

/// Write [`encode_wav_pcm16`] output to `out_path`, creating parent directories.
pub fn write_wav_file(mix: &MixBuffer, out_path: &Path) -> StoryboardResult<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            StoryboardError::Other(anyhow::anyhow!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    std::fs::write(out_path, encode_wav_pcm16(mix)).map_err(|e| {
        StoryboardError::Other(anyhow::anyhow!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

fn sample_to_i16(s: f32) -> i16 {
    let s = if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/wav.rs"]
mod tests;
