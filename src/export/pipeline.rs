use std::path::{Path, PathBuf};

use crate::audio::mix::{build_mix_plan, render_mix};
use crate::audio::wav::encode_wav_pcm16;
use crate::config::StoryboardConfig;
use crate::encode::render::{AudioBlob, MediaRenderer};
use crate::foundation::core::sanitize_file_stem;
use crate::foundation::error::{ExportStage, StoryboardResult};
use crate::media::service::{AudioDecoder, MediaProbe};
use crate::model::project::Project;
use crate::timeline::Timeline;
use crate::timeline::flatten::flatten_scenes;

/// Collaborators used by [`export_film`].
#[derive(Clone, Copy)]
pub struct ExportServices<'a> {
    /// Video duration probe.
    pub probe: &'a dyn MediaProbe,
    /// Audio decoder for the mixdown.
    pub decoder: &'a dyn AudioDecoder,
    /// Picture renderer and muxer.
    pub renderer: &'a dyn MediaRenderer,
}

/// Summary of a finished export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportReport {
    /// Written deliverable.
    pub path: PathBuf,
    /// Number of segments rendered.
    pub segments: usize,
    /// Film length in seconds.
    pub duration_secs: f64,
    /// Whether a soundtrack was muxed.
    pub with_audio: bool,
}

/// Result of [`export_film`].
#[derive(Clone, Debug, PartialEq)]
pub enum ExportOutcome {
    /// The project has no shots.
    NothingToExport,
    /// A file was written.
    Exported(ExportReport),
}

/// File name of the deliverable for a project name.
pub fn film_file_name(project_name: &str) -> String {
    let name = project_name.trim();
    let stem = sanitize_file_stem(if name.is_empty() { "storyboard" } else { name });
    format!("{stem}_film.mp4")
}

/// Export `project` into `out_dir`.
///
/// Stages:
/// 1. probing: resolve every segment duration
/// 2. mixing: plan and render the soundtrack (skipped when nothing is audible)
/// 3. encoding: render each segment picture, concatenate, mux
///
/// A failure is reported once as [`crate::StoryboardError::Export`] naming its stage.
pub async fn export_film(
    project: &Project,
    services: &ExportServices<'_>,
    config: &StoryboardConfig,
    out_dir: &Path,
) -> StoryboardResult<ExportOutcome> {
    if flatten_scenes(&project.scenes).is_empty() {
        tracing::info!(project = %project.name, "nothing to export");
        return Ok(ExportOutcome::NothingToExport);
    }

    tracing::info!(project = %project.name, stage = %ExportStage::Probing, "export stage");
    let timeline = Timeline::for_project(project, services.probe, &config.timing)
        .await
        .map_err(|e| e.at_stage(ExportStage::Probing))?;

    tracing::info!(
        segments = timeline.len(),
        total_secs = timeline.total(),
        stage = %ExportStage::Mixing,
        "export stage"
    );
    let plan = build_mix_plan(
        &timeline,
        project.background.as_ref(),
        services.decoder,
        &config.mix,
    )
    .await
    .map_err(|e| e.at_stage(ExportStage::Mixing))?;
    let audio = if plan.is_empty() {
        None
    } else {
        Some(AudioBlob {
            wav: encode_wav_pcm16(&render_mix(&plan)),
        })
    };

    tracing::info!(stage = %ExportStage::Encoding, with_audio = audio.is_some(), "export stage");
    let out = out_dir.join(film_file_name(&project.name));
    let film = encode(&timeline, services.renderer, audio.as_ref(), &out)
        .await
        .map_err(|e| e.at_stage(ExportStage::Encoding))?;

    tracing::info!(path = %film.display(), "export finished");
    Ok(ExportOutcome::Exported(ExportReport {
        path: film,
        segments: timeline.len(),
        duration_secs: timeline.total(),
        with_audio: audio.is_some(),
    }))
}

async fn encode(
    timeline: &Timeline,
    renderer: &dyn MediaRenderer,
    audio: Option<&AudioBlob>,
    out: &Path,
) -> StoryboardResult<PathBuf> {
    let mut parts = Vec::with_capacity(timeline.len());
    for (i, seg) in timeline.segments().iter().enumerate() {
        parts.push(renderer.render_segment_picture(i, seg).await?);
    }
    let video = renderer.concatenate(&parts).await?;
    Ok(renderer.mux(&video, audio, out).await?.path)
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
