use super::*;
use crate::model::project::{Scene, Shot};
use crate::timeline::Segment;
use crate::timeline::flatten::flatten_scenes;
use async_trait::async_trait;
use std::sync::Mutex;

const SR: u32 = 100;

struct TableDecoder {
    table: HashMap<String, AudioPcm>,
    calls: Mutex<Vec<String>>,
}

impl TableDecoder {
    fn new(entries: &[(&str, f32, f64)]) -> Self {
        let table = entries
            .iter()
            .map(|(name, value, secs)| {
                let frames = secs_to_samples(*secs, SR) as usize;
                (
                    (*name).to_string(),
                    AudioPcm {
                        sample_rate: SR,
                        channels: 1,
                        interleaved_f32: vec![*value; frames],
                    },
                )
            })
            .collect();
        Self {
            table,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioDecoder for TableDecoder {
    async fn decode_audio(&self, media: &MediaRef) -> StoryboardResult<AudioPcm> {
        self.calls.lock().unwrap().push(media.as_str().to_string());
        self.table
            .get(media.as_str())
            .cloned()
            .ok_or_else(|| StoryboardError::decode(format!("cannot open {}", media.as_str())))
    }
}

fn timeline(shots: Vec<(Shot, f64)>) -> Timeline {
    let (shots, durations): (Vec<_>, Vec<_>) = shots.into_iter().unzip();
    let segments = flatten_scenes(&[Scene::new("s1", "Scene", shots)])
        .into_iter()
        .zip(durations)
        .map(|(shot, duration)| Segment { shot, duration })
        .collect();
    Timeline::from_segments(segments).unwrap()
}

fn mono_opts() -> MixOpts {
    MixOpts {
        sample_rate: SR,
        channels: 1,
        duck_ratio: 0.25,
        duck_ramp_secs: 0.0,
    }
}

fn frame_at(buf: &MixBuffer, secs: f64) -> f32 {
    buf.samples[secs_to_samples(secs, buf.sample_rate) as usize * usize::from(buf.channels)]
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn default_opts_are_stereo_48k() {
    let opts = MixOpts::default();
    assert_eq!(opts.sample_rate, 48_000);
    assert_eq!(opts.channels, 2);
    assert!(opts.validate().is_ok());
    assert!(
        MixOpts {
            channels: 3,
            ..MixOpts::default()
        }
        .validate()
        .is_err()
    );
    assert!(
        MixOpts {
            duck_ratio: 1.5,
            ..MixOpts::default()
        }
        .validate()
        .is_err()
    );
}

#[tokio::test]
async fn background_ducks_under_voice_note() {
    let tl = timeline(vec![
        (Shot::image("a", "a.jpg"), 5.0),
        (Shot::image("b", "b.jpg").with_voice_note("voice.wav", 8.0), 8.0),
    ]);
    let decoder = TableDecoder::new(&[("music.mp3", 1.0, 3.0), ("voice.wav", 0.2, 8.0)]);
    let bg = BackgroundTrack::new("music.mp3");

    let buf = mixdown(&tl, Some(&bg), &decoder, &mono_opts()).await.unwrap();

    assert_eq!(buf.frames(), 1300);
    assert!(approx(buf.duration_secs() as f32, 13.0));
    // background alone, looped past its 3 s length
    assert!(approx(frame_at(&buf, 2.0), 0.6));
    assert!(approx(frame_at(&buf, 4.5), 0.6));
    // voice plus ducked background
    assert!(approx(frame_at(&buf, 10.0), 0.2 + 0.15));
}

#[tokio::test]
async fn video_audio_is_not_ducked_but_ducks_background() {
    let tl = timeline(vec![
        (Shot::image("a", "a.jpg"), 2.0),
        (Shot::video("v", "clip.mp4"), 3.0),
    ]);
    let decoder = TableDecoder::new(&[("music.mp3", 0.5, 10.0), ("clip.mp4", 0.4, 10.0)]);
    let bg = BackgroundTrack::new("music.mp3");

    let plan = build_mix_plan(&tl, Some(&bg), &decoder, &mono_opts())
        .await
        .unwrap();
    let roles: Vec<LayerRole> = plan.layers.iter().map(|l| l.role).collect();
    assert_eq!(roles, vec![LayerRole::Background, LayerRole::ClipAudio(1)]);
    assert_eq!(plan.layers[1].gain, LayerGain::Constant(1.0));

    let buf = render_mix(&plan);
    assert!(approx(frame_at(&buf, 1.0), 0.3));
    assert!(approx(frame_at(&buf, 3.0), 0.4 + 0.075));
}

#[tokio::test]
async fn foreground_layers_stop_at_segment_end() {
    let tl = timeline(vec![
        (Shot::image("a", "a.jpg").with_voice_note("long.wav", 3.0), 4.0),
        (Shot::image("b", "b.jpg"), 4.0),
    ]);
    let decoder = TableDecoder::new(&[("long.wav", 0.5, 20.0)]);

    let plan = build_mix_plan(&tl, None, &decoder, &mono_opts())
        .await
        .unwrap();
    assert_eq!(plan.layers.len(), 1);
    assert_eq!(plan.layers[0].timeline_start_sample, 0);
    assert_eq!(plan.layers[0].timeline_end_sample, 400);

    let buf = render_mix(&plan);
    assert!(approx(frame_at(&buf, 3.9), 0.5));
    assert!(approx(frame_at(&buf, 4.0), 0.0));
    assert!(approx(frame_at(&buf, 7.5), 0.0));
}

#[tokio::test]
async fn failed_decodes_become_silence_and_are_not_retried() {
    let tl = timeline(vec![
        (Shot::image("a", "a.jpg").with_voice_note("broken.wav", 2.0), 7.0),
        (Shot::image("b", "b.jpg").with_voice_note("broken.wav", 2.0), 7.0),
        (Shot::image("c", "c.jpg").with_voice_note("ok.wav", 2.0), 7.0),
    ]);
    let decoder = TableDecoder::new(&[("ok.wav", 0.3, 2.0)]);

    let plan = build_mix_plan(&tl, None, &decoder, &mono_opts())
        .await
        .unwrap();
    assert_eq!(plan.layers.len(), 1);
    assert_eq!(plan.layers[0].role, LayerRole::Voice(2));
    assert_eq!(decoder.calls(), vec!["broken.wav", "ok.wav"]);
}

#[tokio::test]
async fn no_audio_sources_give_empty_plan_of_silence() {
    let tl = timeline(vec![(Shot::image("a", "a.jpg"), 7.0)]);
    let decoder = TableDecoder::new(&[]);

    let plan = build_mix_plan(&tl, None, &decoder, &mono_opts())
        .await
        .unwrap();
    assert!(plan.is_empty());
    let buf = render_mix(&plan);
    assert_eq!(buf.frames(), 700);
    assert!(buf.samples.iter().all(|s| *s == 0.0));
}

#[tokio::test]
async fn muted_background_is_skipped() {
    let tl = timeline(vec![(Shot::image("a", "a.jpg"), 7.0)]);
    let decoder = TableDecoder::new(&[("music.mp3", 1.0, 1.0)]);
    let mut bg = BackgroundTrack::new("music.mp3");
    bg.volume = 0.0;

    let plan = build_mix_plan(&tl, Some(&bg), &decoder, &mono_opts())
        .await
        .unwrap();
    assert!(plan.is_empty());
    assert!(decoder.calls().is_empty());
}

#[tokio::test]
async fn undocked_background_keeps_constant_gain() {
    let tl = timeline(vec![(Shot::video("v", "clip.mp4"), 2.0)]);
    let decoder = TableDecoder::new(&[("music.mp3", 1.0, 5.0)]);
    let mut bg = BackgroundTrack::new("music.mp3");
    bg.ducking = false;

    let plan = build_mix_plan(&tl, Some(&bg), &decoder, &mono_opts())
        .await
        .unwrap();
    assert_eq!(plan.layers[0].gain, LayerGain::Constant(0.6));
}

#[test]
fn render_clamps_and_fans_mono_out_to_stereo() {
    let layer = |value: f32| MixLayer {
        role: LayerRole::Background,
        timeline_start_sample: 0,
        timeline_end_sample: 10,
        looped: true,
        gain: LayerGain::Constant(1.0),
        source_sample_rate: SR,
        source_channels: 1,
        source_interleaved_f32: Arc::new(vec![value; 4]),
    };
    let plan = MixPlan {
        sample_rate: SR,
        channels: 2,
        total_samples: 10,
        layers: vec![layer(0.7), layer(0.6)],
    };

    let buf = render_mix(&plan);
    assert_eq!(buf.samples.len(), 20);
    assert!(buf.samples.iter().all(|s| *s == 1.0));
}

#[test]
fn render_resamples_by_interpolation() {
    let plan = MixPlan {
        sample_rate: 4,
        channels: 1,
        total_samples: 4,
        layers: vec![MixLayer {
            role: LayerRole::Voice(0),
            timeline_start_sample: 0,
            timeline_end_sample: 4,
            looped: false,
            gain: LayerGain::Constant(1.0),
            source_sample_rate: 2,
            source_channels: 1,
            source_interleaved_f32: Arc::new(vec![0.0, 0.5]),
        }],
    };

    let buf = render_mix(&plan);
    assert_eq!(buf.samples, vec![0.0, 0.25, 0.5, 0.5]);
}

#[tokio::test]
async fn plan_rejects_timelines_beyond_the_mix_limit() {
    let decoder = TableDecoder::new(&[("v.wav", 0.5, 1.0)]);
    let tl = timeline(vec![(
        Shot::image("a", "a.jpg").with_voice_note("v.wav", 1e300),
        1e300,
    )]);
    let err = build_mix_plan(&tl, None, &decoder, &mono_opts())
        .await
        .unwrap_err();
    assert!(matches!(err, StoryboardError::Validation(_)), "{err}");
    assert!(decoder.calls().is_empty());
}
