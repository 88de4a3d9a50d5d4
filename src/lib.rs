//! Storyboard film engine.
//!
//! Turns a storyboard project (scenes of still and video shots, optional voice notes, one
//! background track) into:
//!
//! - a [`Timeline`] of resolved segment durations with O(log n) seeking
//! - a live playback session ([`PlaybackController`]) reporting to a [`PresentationSurface`]
//! - an offline soundtrack ([`mixdown`]) with the background ducked under foreground audio
//! - an exported film ([`export_film`]) rendered through a [`MediaRenderer`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod audio;
pub(crate) mod config;
pub(crate) mod encode;
pub(crate) mod export;
pub(crate) mod media;
pub(crate) mod model;
pub(crate) mod playback;
pub(crate) mod presentation;
pub(crate) mod timeline;

pub use crate::foundation::core::{
    Fps, format_time, samples_to_secs, sanitize_file_stem, secs_to_samples,
};
pub use crate::foundation::error::{ExportStage, StoryboardError, StoryboardResult};

pub use crate::audio::envelope::DuckEnvelope;
pub use crate::audio::mix::{
    LayerGain, LayerRole, MAX_MIX_SECS, MIX_SAMPLE_RATE, MixBuffer, MixLayer, MixOpts, MixPlan, build_mix_plan,
    mixdown, render_mix,
};
pub use crate::audio::wav::{encode_wav_pcm16, write_wav_file};
pub use crate::config::StoryboardConfig;
pub use crate::encode::ffmpeg::{
    FfmpegRenderer, RenderOpts, concat_args, concat_list, ensure_parent_dir, is_ffmpeg_on_path,
    mux_args, picture_args, scale_pad_filter,
};
pub use crate::encode::render::{AudioBlob, FinalFile, MediaRenderer, PictureBlob, VideoBlob};
pub use crate::export::pipeline::{
    ExportOutcome, ExportReport, ExportServices, export_film, film_file_name,
};
pub use crate::media::ffmpeg::{FfmpegMedia, decode_audio_f32, probe_duration_secs};
pub use crate::media::service::{AudioDecoder, AudioPcm, MediaProbe};
pub use crate::media::source::{DataUrl, MediaStaging, normalize_rel_path};
pub use crate::model::document::{DOCUMENT_SCHEMA, ProjectDocument};
pub use crate::model::project::{
    BackgroundTrack, MAX_VOICE_NOTE_SECS, MediaKind, MediaRef, Project, Scene, Shot, ShotMeta, VoiceNote,
};
pub use crate::playback::driver::{PlaybackController, PlaybackHost, PlaybackOpts, PlaybackParts};
pub use crate::playback::machine::{Directive, EntryId, PlaybackMachine, PlaybackState};
pub use crate::playback::output::{
    Foreground, ForegroundAudio, ForegroundPlayback, ForegroundPlayer, PresentationSurface,
    SegmentEntered,
};
pub use crate::presentation::navigator::{Slide, Slideshow};
pub use crate::presentation::overlay::{DEFAULT_TRANSITION, Overlay};
pub use crate::timeline::duration::{TimingPolicy, resolve_durations};
pub use crate::timeline::flatten::{FlatShot, flatten_scenes};
pub use crate::timeline::index::{Locator, TimelineIndex};
pub use crate::timeline::{Segment, Timeline};
