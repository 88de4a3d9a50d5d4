use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::playback::machine::{Directive, EntryId, PlaybackMachine, PlaybackState};
use crate::playback::output::{ForegroundAudio, ForegroundPlayer, PresentationSurface};
use crate::timeline::Timeline;

/// Driver settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackOpts {
    /// Period of progress reports, in milliseconds.
    pub progress_interval_ms: u64,
}

impl Default for PlaybackOpts {
    fn default() -> Self {
        Self {
            progress_interval_ms: 150,
        }
    }
}

impl PlaybackOpts {
    /// Check the progress period.
    pub fn validate(&self) -> StoryboardResult<()> {
        if self.progress_interval_ms == 0 {
            return Err(StoryboardError::validation(
                "playback progress_interval_ms must be > 0",
            ));
        }
        Ok(())
    }

    fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Command {
    Seek(f64),
    SeekRatio(f64),
    Pause,
    Resume,
    Close,
}

/// Surface and player handed back once a session is closed.
pub struct PlaybackParts {
    /// Presentation surface.
    pub surface: Box<dyn PresentationSurface>,
    /// Foreground player.
    pub player: Box<dyn ForegroundPlayer>,
}

/// Handle to one running playback session.
///
/// The session runs on its own tokio task. Dropping the handle cancels the task; use
/// [`PlaybackController::close`] to wait for teardown and get the surface back.
pub struct PlaybackController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PlaybackState>,
    task: JoinHandle<PlaybackParts>,
    guard: DropGuard,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl PlaybackController {
    /// Start playing `timeline` at absolute time `at` on the current tokio runtime.
    ///
    /// Returns `None` without spawning anything when the timeline is empty.
    pub fn spawn(
        timeline: Arc<Timeline>,
        at: f64,
        surface: Box<dyn PresentationSurface>,
        player: Box<dyn ForegroundPlayer>,
        opts: &PlaybackOpts,
    ) -> Option<Self> {
        let mut machine = PlaybackMachine::new(timeline);
        let initial = machine.start(at);
        if initial.is_empty() {
            tracing::debug!("nothing to present");
            return None;
        }

        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(machine.state());
        let cancel = CancellationToken::new();
        let session = Session {
            machine,
            surface,
            player,
            foreground: None,
            timer: None,
            cursor: None,
            entered: false,
            state: state_tx,
        };
        let task = tokio::spawn(session.run(
            initial,
            rx,
            cancel.clone(),
            opts.progress_interval(),
        ));

        Some(Self {
            commands,
            state,
            task,
            guard: cancel.drop_guard(),
        })
    }

    /// Latest published state.
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    /// Jump to absolute time `t` seconds.
    pub fn seek(&self, t: f64) {
        self.send(Command::Seek(t));
    }

    /// Jump to `ratio` of the total duration.
    pub fn seek_ratio(&self, ratio: f64) {
        self.send(Command::SeekRatio(ratio));
    }

    /// Pause at the current position.
    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    /// Resume after [`PlaybackController::pause`].
    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Tear the session down and wait for the task to finish.
    pub async fn close(self) -> StoryboardResult<PlaybackParts> {
        let Self {
            commands,
            task,
            guard,
            ..
        } = self;
        let _ = commands.send(Command::Close);
        let cancel = guard.disarm();
        let parts = task.await.map_err(|e| {
            cancel.cancel();
            StoryboardError::Other(anyhow::anyhow!("playback task failed: {e}"))
        })?;
        Ok(parts)
    }

    fn send(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            tracing::debug!(?cmd, "playback session already finished");
        }
    }
}

/// Owns at most one playback session at a time.
#[derive(Debug, Default)]
pub struct PlaybackHost {
    active: Option<PlaybackController>,
}

impl PlaybackHost {
    /// Create a host with no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully close any running session, then start a new one.
    ///
    /// Returns `Ok(None)` when `timeline` is empty.
    pub async fn present(
        &mut self,
        timeline: Arc<Timeline>,
        at: f64,
        surface: Box<dyn PresentationSurface>,
        player: Box<dyn ForegroundPlayer>,
        opts: &PlaybackOpts,
    ) -> StoryboardResult<Option<&PlaybackController>> {
        self.close().await?;
        self.active = PlaybackController::spawn(timeline, at, surface, player, opts);
        Ok(self.active.as_ref())
    }

    /// Running session, if any.
    pub fn active(&self) -> Option<&PlaybackController> {
        self.active.as_ref()
    }

    /// Close the running session, if any.
    pub async fn close(&mut self) -> StoryboardResult<Option<PlaybackParts>> {
        match self.active.take() {
            Some(controller) => controller.close().await.map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PlaybackCursor {
    index: usize,
    entry: EntryId,
    offset: f64,
    entered_at: Instant,
}

struct ArmedTimer {
    entry: EntryId,
    sleep: Pin<Box<Sleep>>,
}

struct ActiveForeground {
    entry: EntryId,
    handle: Box<dyn ForegroundAudio>,
    ended: Option<oneshot::Receiver<()>>,
}

enum Event {
    Cancelled,
    Command(Option<Command>),
    Timer(EntryId),
    MediaEnded(EntryId, bool),
    Progress,
}

struct Session {
    machine: PlaybackMachine,
    surface: Box<dyn PresentationSurface>,
    player: Box<dyn ForegroundPlayer>,
    foreground: Option<ActiveForeground>,
    timer: Option<ArmedTimer>,
    cursor: Option<PlaybackCursor>,
    entered: bool,
    state: watch::Sender<PlaybackState>,
}

impl Session {
    async fn run(
        mut self,
        initial: Vec<Directive>,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
        progress_every: Duration,
    ) -> PlaybackParts {
        self.apply(initial);
        let mut progress = tokio::time::interval(progress_every);
        progress.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => Event::Cancelled,
                cmd = commands.recv() => Event::Command(cmd),
                entry = timer_fired(&mut self.timer) => Event::Timer(entry),
                (entry, played) = foreground_ended(&mut self.foreground) => {
                    Event::MediaEnded(entry, played)
                }
                _ = progress.tick() => Event::Progress,
            };

            let directives = match event {
                Event::Cancelled | Event::Command(None) | Event::Command(Some(Command::Close)) => {
                    let directives = self.machine.close();
                    self.apply(directives);
                    break;
                }
                Event::Command(Some(cmd)) => self.handle(cmd),
                Event::Timer(entry) => {
                    self.timer = None;
                    self.machine.on_timer(entry)
                }
                Event::MediaEnded(entry, played) => {
                    if let Some(active) = self.foreground.as_mut() {
                        active.ended = None;
                    }
                    if played {
                        self.machine.on_media_ended(entry)
                    } else {
                        Vec::new()
                    }
                }
                Event::Progress => {
                    self.report_progress();
                    continue;
                }
            };
            self.apply(directives);
        }

        tracing::debug!("playback session finished");
        PlaybackParts {
            surface: self.surface,
            player: self.player,
        }
    }

    fn handle(&mut self, cmd: Command) -> Vec<Directive> {
        match cmd {
            Command::Seek(t) => self.machine.seek(t),
            Command::SeekRatio(r) => self.machine.seek_ratio(r),
            Command::Pause => {
                let offset = self.segment_offset().unwrap_or(0.0);
                self.machine.pause(offset)
            }
            Command::Resume => self.machine.resume(),
            Command::Close => self.machine.close(),
        }
    }

    fn apply(&mut self, directives: Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::Show(entered) => {
                    if !self.entered {
                        self.surface.enter();
                        self.entered = true;
                    }
                    self.cursor = Some(PlaybackCursor {
                        index: entered.index,
                        entry: entered.entry,
                        offset: entered.offset,
                        entered_at: Instant::now(),
                    });
                    self.surface.show_segment(&entered);
                }
                Directive::StartForeground {
                    entry,
                    source,
                    offset,
                } => {
                    self.stop_foreground();
                    match self.player.play(&source, offset) {
                        Ok(playback) => {
                            self.foreground = Some(ActiveForeground {
                                entry,
                                handle: playback.handle,
                                ended: playback.ended,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(
                                entry = entry.0,
                                source = ?source,
                                error = %e,
                                "foreground audio failed to start; segment plays silent"
                            );
                        }
                    }
                }
                Directive::StopForeground => self.stop_foreground(),
                Directive::ArmTimer { entry, after } => {
                    self.timer = Some(ArmedTimer {
                        entry,
                        sleep: Box::pin(tokio::time::sleep(after)),
                    });
                }
                Directive::CancelTimer => self.timer = None,
                Directive::Teardown => {
                    self.stop_foreground();
                    self.timer = None;
                    self.cursor = None;
                    self.surface.progress(0.0);
                    if self.entered {
                        self.surface.exit();
                        self.entered = false;
                    }
                }
            }
        }
        self.state.send_replace(self.machine.state());
    }

    fn stop_foreground(&mut self) {
        if let Some(mut active) = self.foreground.take() {
            active.handle.stop();
        }
    }

    /// Seconds into the current segment by the wall clock.
    fn segment_offset(&self) -> Option<f64> {
        let cursor = self.cursor?;
        if self.machine.live_entry() != Some(cursor.entry) {
            return None;
        }
        let duration = self.machine.timeline().index().duration(cursor.index)?;
        Some((cursor.offset + cursor.entered_at.elapsed().as_secs_f64()).min(duration))
    }

    fn report_progress(&mut self) {
        let index = self.machine.timeline().index();
        let position = match self.machine.state() {
            PlaybackState::Playing { index: i, .. } => self
                .segment_offset()
                .and_then(|offset| Some(index.start(i)? + offset)),
            PlaybackState::Paused { index: i, offset } => index.start(i).map(|s| s + offset),
            PlaybackState::Idle | PlaybackState::Ended => None,
        };
        let total = index.total();
        if let Some(position) = position
            && total > 0.0
        {
            self.surface.progress((position / total).clamp(0.0, 1.0));
        }
    }
}

async fn timer_fired(timer: &mut Option<ArmedTimer>) -> EntryId {
    match timer {
        Some(armed) => {
            armed.sleep.as_mut().await;
            armed.entry
        }
        None => std::future::pending().await,
    }
}

/// Resolves with the entry and whether the media really played out (a dropped sender does not).
async fn foreground_ended(foreground: &mut Option<ActiveForeground>) -> (EntryId, bool) {
    let Some(active) = foreground else {
        return std::future::pending().await;
    };
    let entry = active.entry;
    match active.ended.as_mut() {
        Some(rx) => (entry, rx.await.is_ok()),
        None => std::future::pending().await,
    }
}
