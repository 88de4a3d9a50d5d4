use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storyboard::{
    ExportOutcome, ExportServices, FfmpegMedia, FfmpegRenderer, Foreground, ForegroundAudio,
    ForegroundPlayback, ForegroundPlayer, MediaStaging, PlaybackController, PlaybackState,
    PresentationSurface, Project, ProjectDocument, SegmentEntered, StoryboardConfig, Timeline,
};

#[derive(Parser, Debug)]
#[command(name = "storyboard", version)]
struct Cli {
    /// Engine configuration JSON (defaults apply when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved timeline of a project.
    Plan(PlanArgs),
    /// Render the mixed soundtrack to a WAV file.
    Mix(MixArgs),
    /// Export the film as MP4 (requires `ffmpeg` on PATH).
    Export(ExportArgs),
    /// Auto-play the project in the terminal.
    Present(PresentArgs),
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Project JSON document.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory relative media paths resolve against (defaults to the project's directory).
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct MixArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output WAV path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output directory for `<project>_film.mp4`.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct PresentArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Start position in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,
}

#[derive(serde::Serialize)]
struct PlanRow<'a> {
    index: usize,
    scene: &'a str,
    shot: &'a str,
    kind: storyboard::MediaKind,
    start: f64,
    duration: f64,
    foreground_audio: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => StoryboardConfig::from_json_file(path)?,
        None => StoryboardConfig::default(),
    };
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args, &config).await,
        Command::Mix(args) => cmd_mix(args, &config).await,
        Command::Export(args) => cmd_export(args, &config).await,
        Command::Present(args) => cmd_present(args, &config).await,
    }
}

struct Loaded {
    project: Project,
    staging: Arc<MediaStaging>,
    media: FfmpegMedia,
}

fn load(args: &ProjectArgs, config: &StoryboardConfig) -> anyhow::Result<Loaded> {
    let project = ProjectDocument::load(&args.in_path)
        .with_context(|| format!("load project '{}'", args.in_path.display()))?;
    let assets_root = match &args.assets {
        Some(dir) => dir.clone(),
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let staging = Arc::new(MediaStaging::new(assets_root)?);
    let media = FfmpegMedia::new(staging.clone(), config.mix.sample_rate, config.mix.channels);
    Ok(Loaded {
        project,
        staging,
        media,
    })
}

async fn cmd_plan(args: PlanArgs, config: &StoryboardConfig) -> anyhow::Result<()> {
    let loaded = load(&args.project, config)?;
    let timeline = Timeline::for_project(&loaded.project, &loaded.media, &config.timing).await?;

    let rows: Vec<PlanRow<'_>> = timeline
        .segments()
        .iter()
        .enumerate()
        .map(|(i, seg)| PlanRow {
            index: i,
            scene: &seg.shot.scene_name,
            shot: &seg.shot.shot.id,
            kind: seg.kind(),
            start: timeline.index().start(i).unwrap_or(0.0),
            duration: seg.duration,
            foreground_audio: seg.has_foreground_audio(),
        })
        .collect();

    if args.json {
        let out = serde_json::json!({
            "segments": rows,
            "total": timeline.total(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for row in &rows {
        println!(
            "{:>3}  {:>6}  {:>6.2}s  {:<5}  {}  {}{}",
            row.index,
            storyboard::format_time(row.start),
            row.duration,
            match row.kind {
                storyboard::MediaKind::Image => "image",
                storyboard::MediaKind::Video => "video",
            },
            row.scene,
            row.shot,
            if row.foreground_audio { "  [audio]" } else { "" },
        );
    }
    println!(
        "{} segments, total {} ({:.2}s)",
        rows.len(),
        storyboard::format_time(timeline.total()),
        timeline.total()
    );
    Ok(())
}

async fn cmd_mix(args: MixArgs, config: &StoryboardConfig) -> anyhow::Result<()> {
    let loaded = load(&args.project, config)?;
    let timeline = Timeline::for_project(&loaded.project, &loaded.media, &config.timing).await?;
    if timeline.is_empty() {
        eprintln!("nothing to mix");
        return Ok(());
    }
    let mix = storyboard::mixdown(
        &timeline,
        loaded.project.background.as_ref(),
        &loaded.media,
        &config.mix,
    )
    .await?;
    storyboard::write_wav_file(&mix, &args.out)?;
    eprintln!(
        "wrote {} ({:.2}s)",
        args.out.display(),
        mix.duration_secs()
    );
    Ok(())
}

async fn cmd_export(args: ExportArgs, config: &StoryboardConfig) -> anyhow::Result<()> {
    let loaded = load(&args.project, config)?;
    let renderer = FfmpegRenderer::new(config.render.clone(), loaded.staging.clone())?;
    let services = ExportServices {
        probe: &loaded.media,
        decoder: &loaded.media,
        renderer: &renderer,
    };
    match storyboard::export_film(&loaded.project, &services, config, &args.out_dir).await? {
        ExportOutcome::NothingToExport => eprintln!("nothing to export: add shots first"),
        ExportOutcome::Exported(report) => eprintln!(
            "wrote {} ({} segments, {})",
            report.path.display(),
            report.segments,
            storyboard::format_time(report.duration_secs)
        ),
    }
    Ok(())
}

async fn cmd_present(args: PresentArgs, config: &StoryboardConfig) -> anyhow::Result<()> {
    let loaded = load(&args.project, config)?;
    let timeline =
        Arc::new(Timeline::for_project(&loaded.project, &loaded.media, &config.timing).await?);

    let Some(controller) = PlaybackController::spawn(
        timeline,
        args.at,
        Box::new(ConsoleSurface::default()),
        Box::new(LoggingPlayer),
        &config.playback,
    ) else {
        eprintln!("nothing to present");
        return Ok(());
    };

    let mut state = controller.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() || *state.borrow() == PlaybackState::Ended {
                    break;
                }
            }
        }
    }
    controller.close().await?;
    Ok(())
}

#[derive(Default)]
struct ConsoleSurface {
    last_percent: Option<u32>,
}

impl PresentationSurface for ConsoleSurface {
    fn enter(&mut self) {
        eprintln!("presenting (ctrl-c to stop)");
    }

    fn show_segment(&mut self, e: &SegmentEntered) {
        println!(
            "[{}/{}] {}  {}  |  {}{}",
            e.index + 1,
            e.count,
            storyboard::format_time(e.start + e.offset),
            e.overlay.scene_label,
            e.overlay.camera_line,
            if e.overlay.caption.is_empty() {
                String::new()
            } else {
                format!("  |  {}", e.overlay.caption)
            },
        );
    }

    fn progress(&mut self, ratio: f64) {
        let percent = (ratio * 100.0).round() as u32;
        if self.last_percent != Some(percent) && percent.is_multiple_of(10) {
            tracing::debug!(percent, "progress");
        }
        self.last_percent = Some(percent);
    }

    fn exit(&mut self) {
        eprintln!("presentation closed");
    }
}

/// Terminal preview has no audio device; it only reports what would play.
struct LoggingPlayer;

struct NoopAudio;

impl ForegroundAudio for NoopAudio {
    fn stop(&mut self) {}
}

impl ForegroundPlayer for LoggingPlayer {
    fn play(
        &mut self,
        source: &Foreground,
        offset: f64,
    ) -> storyboard::StoryboardResult<ForegroundPlayback> {
        let (what, media) = match source {
            Foreground::Voice(m) => ("voice note", m),
            Foreground::Video(m) => ("clip audio", m),
        };
        tracing::info!(what, media = %media.display_name(), offset, "foreground audio");
        Ok(ForegroundPlayback {
            handle: Box::new(NoopAudio),
            ended: None,
        })
    }
}
