use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::process::Command;

use crate::encode::render::{AudioBlob, FinalFile, MediaRenderer, PictureBlob, VideoBlob};
use crate::foundation::core::Fps;
use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::media::source::MediaStaging;
use crate::model::project::MediaKind;
use crate::timeline::Segment;

/// Output settings of the film export.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Replace an existing deliverable.
    pub overwrite: bool,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: Fps { num: 30, den: 1 },
            overwrite: true,
        }
    }
}

impl RenderOpts {
    /// Check frame size and rate.
    pub fn validate(&self) -> StoryboardResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StoryboardError::validation(
                "render width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(StoryboardError::validation(
                "render width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }
}

/// Return `true` when an `ffmpeg` binary can be spawned.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> StoryboardResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Letterbox filter fitting any input into `width`x`height`.
pub fn scale_pad_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2"
    )
}

/// Arguments rendering one segment into a silent H.264 part.
///
/// Stills are looped for `duration`. Videos are cut to `duration` and a clip that ends early holds
/// its last frame until then.
pub fn picture_args(
    kind: MediaKind,
    input: &Path,
    duration: f64,
    opts: &RenderOpts,
    out: &Path,
) -> Vec<OsString> {
    let secs = format!("{duration:.3}");
    let mut args: Vec<OsString> = ["-y", "-loglevel", "error"]
        .into_iter()
        .map(OsString::from)
        .collect();
    match kind {
        MediaKind::Image => {
            args.extend(["-loop", "1", "-t", secs.as_str(), "-i"].map(OsString::from));
            args.push(input.as_os_str().to_owned());
        }
        MediaKind::Video => {
            args.push("-i".into());
            args.push(input.as_os_str().to_owned());
            args.extend(["-t", secs.as_str()].map(OsString::from));
        }
    }
    let mut filter = scale_pad_filter(opts.width, opts.height);
    if kind == MediaKind::Video {
        filter.push_str(&format!(",tpad=stop_mode=clone:stop_duration={secs}"));
    }
    let rate = opts.fps.to_ffmpeg_rate();
    args.extend(
        [
            "-vf",
            filter.as_str(),
            "-r",
            rate.as_str(),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-profile:v",
            "baseline",
            "-an",
        ]
        .map(OsString::from),
    );
    args.push(out.as_os_str().to_owned());
    args
}

/// Concat-demuxer list naming every part in order.
pub fn concat_list(parts: &[PictureBlob]) -> String {
    parts
        .iter()
        .map(|p| {
            let path = p.path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{path}'\n")
        })
        .collect()
}

/// Arguments joining the parts listed in `list` without re-encoding.
pub fn concat_args(list: &Path, out: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i",
    ]
    .map(OsString::from)
    .to_vec();
    args.push(list.as_os_str().to_owned());
    args.extend(["-c", "copy"].map(OsString::from));
    args.push(out.as_os_str().to_owned());
    args
}

/// Arguments muxing the picture track with an optional WAV soundtrack.
///
/// With audio the soundtrack is encoded to AAC and the output ends with the shorter stream.
pub fn mux_args(video: &Path, audio: Option<&Path>, out: &Path, overwrite: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        (if overwrite { "-y" } else { "-n" }).into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        video.as_os_str().to_owned(),
    ];
    match audio {
        Some(audio) => {
            args.push("-i".into());
            args.push(audio.as_os_str().to_owned());
            args.extend(["-c:v", "copy", "-c:a", "aac", "-shortest"].map(OsString::from));
        }
        None => args.extend(["-c", "copy"].map(OsString::from)),
    }
    args.extend(["-movflags", "+faststart"].map(OsString::from));
    args.push(out.as_os_str().to_owned());
    args
}

/// [`MediaRenderer`] driving the system `ffmpeg` binary.
///
/// Intermediate parts live in a private temporary directory removed on drop.
#[derive(Debug)]
pub struct FfmpegRenderer {
    opts: RenderOpts,
    staging: Arc<MediaStaging>,
    work: tempfile::TempDir,
    seq: AtomicUsize,
}

impl FfmpegRenderer {
    /// Create a renderer. Fails when the settings are invalid or `ffmpeg` is missing.
    pub fn new(opts: RenderOpts, staging: Arc<MediaStaging>) -> StoryboardResult<Self> {
        opts.validate()?;
        if !is_ffmpeg_on_path() {
            return Err(StoryboardError::encode(
                "ffmpeg is required for film export, but was not found on PATH",
            ));
        }
        let work = tempfile::Builder::new()
            .prefix("storyboard-render-")
            .tempdir()
            .map_err(|e| {
                StoryboardError::Other(anyhow::anyhow!("failed to create render work dir: {e}"))
            })?;
        Ok(Self {
            opts,
            staging,
            work,
            seq: AtomicUsize::new(0),
        })
    }

    /// Output settings.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    fn work_file(&self, stem: &str, ext: &str) -> PathBuf {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        self.work.path().join(format!("{stem}_{n}.{ext}"))
    }
}

#[async_trait]
impl MediaRenderer for FfmpegRenderer {
    async fn render_segment_picture(
        &self,
        index: usize,
        segment: &Segment,
    ) -> StoryboardResult<PictureBlob> {
        let input = self.staging.resolve(&segment.shot.shot.src)?;
        let out = self.work_file(&format!("part_{index}"), "mp4");
        run_ffmpeg(picture_args(
            segment.kind(),
            &input,
            segment.duration,
            &self.opts,
            &out,
        ))
        .await?;
        Ok(PictureBlob {
            index,
            path: out,
            duration: segment.duration,
        })
    }

    async fn concatenate(&self, parts: &[PictureBlob]) -> StoryboardResult<VideoBlob> {
        if parts.is_empty() {
            return Err(StoryboardError::encode("nothing to concatenate"));
        }
        let list = self.work_file("concat", "txt");
        tokio::fs::write(&list, concat_list(parts))
            .await
            .map_err(|e| StoryboardError::encode(format!("failed to write concat list: {e}")))?;
        let out = self.work_file("temp_video", "mp4");
        run_ffmpeg(concat_args(&list, &out)).await?;
        Ok(VideoBlob {
            path: out,
            duration: parts.iter().map(|p| p.duration).sum(),
        })
    }

    async fn mux(
        &self,
        video: &VideoBlob,
        audio: Option<&AudioBlob>,
        out: &Path,
    ) -> StoryboardResult<FinalFile> {
        ensure_parent_dir(out)?;
        if !self.opts.overwrite && out.exists() {
            return Err(StoryboardError::validation(format!(
                "output file '{}' already exists",
                out.display()
            )));
        }

        let audio_path = match audio {
            Some(blob) => {
                let path = self.work_file("audio", "wav");
                tokio::fs::write(&path, &blob.wav).await.map_err(|e| {
                    StoryboardError::encode(format!("failed to write soundtrack: {e}"))
                })?;
                Some(path)
            }
            None => None,
        };
        run_ffmpeg(mux_args(
            &video.path,
            audio_path.as_deref(),
            out,
            self.opts.overwrite,
        ))
        .await?;
        Ok(FinalFile {
            path: out.to_path_buf(),
        })
    }
}

async fn run_ffmpeg(args: Vec<OsString>) -> StoryboardResult<()> {
    tracing::debug!(args = ?args, "running ffmpeg");
    let output = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            StoryboardError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StoryboardError::encode(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
