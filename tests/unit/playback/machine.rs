use super::*;
use crate::model::project::{MediaRef, Scene, Shot};
use crate::timeline::Segment;
use crate::timeline::flatten::flatten_scenes;

fn timeline(shots: Vec<(Shot, f64)>) -> Arc<Timeline> {
    let (shots, durations): (Vec<_>, Vec<_>) = shots.into_iter().unzip();
    let segments = flatten_scenes(&[Scene::new("s1", "Scene", shots)])
        .into_iter()
        .zip(durations)
        .map(|(shot, duration)| Segment { shot, duration })
        .collect();
    Arc::new(Timeline::from_segments(segments).unwrap())
}

fn still_then_voice() -> Arc<Timeline> {
    timeline(vec![
        (Shot::image("a", "a.jpg"), 7.0),
        (Shot::image("b", "b.jpg").with_voice_note("v.wav", 5.0), 7.0),
    ])
}

fn shown(directives: &[Directive]) -> Vec<(usize, f64)> {
    directives
        .iter()
        .filter_map(|d| match d {
            Directive::Show(e) => Some((e.index, e.offset)),
            _ => None,
        })
        .collect()
}

fn armed(directives: &[Directive]) -> Option<(EntryId, Duration)> {
    directives.iter().find_map(|d| match d {
        Directive::ArmTimer { entry, after } => Some((*entry, *after)),
        _ => None,
    })
}

#[test]
fn empty_timeline_start_is_a_no_op() {
    let mut m = PlaybackMachine::new(Arc::new(Timeline::default()));
    assert!(m.start(0.0).is_empty());
    assert!(m.seek_ratio(0.5).is_empty());
    assert_eq!(m.state(), PlaybackState::Idle);
}

#[test]
fn start_enters_first_segment_and_arms_timer() {
    let mut m = PlaybackMachine::new(still_then_voice());
    let d = m.start(0.0);
    assert_eq!(shown(&d), vec![(0, 0.0)]);
    let (entry, after) = armed(&d).unwrap();
    assert_eq!(after, Duration::from_secs(7));
    assert_eq!(m.live_entry(), Some(entry));
    assert!(!d.iter().any(|d| matches!(d, Directive::StartForeground { .. })));
    assert_eq!(
        m.state(),
        PlaybackState::Playing {
            index: 0,
            offset: 0.0
        }
    );
}

#[test]
fn start_mid_segment_resumes_voice_at_offset() {
    let mut m = PlaybackMachine::new(still_then_voice());
    let d = m.start(8.0);
    assert_eq!(shown(&d), vec![(1, 1.0)]);
    assert!(d.contains(&Directive::StartForeground {
        entry: m.live_entry().unwrap(),
        source: Foreground::Voice(MediaRef::new("v.wav")),
        offset: 1.0,
    }));
    assert_eq!(armed(&d).unwrap().1, Duration::from_secs(6));
}

#[test]
fn show_carries_overlay_and_position() {
    let mut m = PlaybackMachine::new(still_then_voice());
    let d = m.start(7.5);
    let Directive::Show(e) = &d[0] else {
        panic!("expected Show first, got {d:?}");
    };
    assert_eq!(e.count, 2);
    assert_eq!(e.start, 7.0);
    assert_eq!(e.duration, 7.0);
    assert_eq!(e.media.as_str(), "b.jpg");
    assert_eq!(e.overlay.scene_label, "Scene");
}

#[test]
fn timer_advances_exactly_once() {
    let mut m = PlaybackMachine::new(still_then_voice());
    let first = armed(&m.start(0.0)).unwrap().0;

    let d = m.on_timer(first);
    assert_eq!(d[..2], [Directive::CancelTimer, Directive::StopForeground]);
    assert_eq!(shown(&d), vec![(1, 0.0)]);

    assert!(m.on_timer(first).is_empty());
    assert!(m.on_media_ended(first).is_empty());
}

#[test]
fn seek_to_same_position_does_not_double_advance() {
    let mut m = PlaybackMachine::new(still_then_voice());
    let first = armed(&m.start(0.0)).unwrap().0;
    let d = m.seek(0.0);
    assert_eq!(d[..2], [Directive::CancelTimer, Directive::StopForeground]);
    let second = armed(&d).unwrap().0;
    assert_ne!(first, second);

    // the timer armed before the seek fires late
    assert!(m.on_timer(first).is_empty());
    assert_eq!(
        m.state(),
        PlaybackState::Playing {
            index: 0,
            offset: 0.0
        }
    );

    assert_eq!(shown(&m.on_timer(second)), vec![(1, 0.0)]);
}

#[test]
fn voice_end_does_not_cut_the_still_short() {
    let mut m = PlaybackMachine::new(still_then_voice());
    m.start(7.0);
    let entry = m.live_entry().unwrap();
    assert!(m.on_media_ended(entry).is_empty());
    assert_eq!(m.live_entry(), Some(entry));
}

#[test]
fn video_end_advances() {
    let mut m = PlaybackMachine::new(timeline(vec![
        (Shot::video("v", "v.mp4"), 4.0),
        (Shot::image("a", "a.jpg"), 7.0),
    ]));
    let d = m.start(0.0);
    let entry = m.live_entry().unwrap();
    assert!(d.contains(&Directive::StartForeground {
        entry,
        source: Foreground::Video(MediaRef::new("v.mp4")),
        offset: 0.0,
    }));
    assert_eq!(shown(&m.on_media_ended(entry)), vec![(1, 0.0)]);
    assert!(m.on_timer(entry).is_empty());
}

#[test]
fn running_past_the_end_tears_down() {
    let mut m = PlaybackMachine::new(still_then_voice());
    m.start(8.0);
    let d = m.on_timer(m.live_entry().unwrap());
    assert_eq!(
        d,
        vec![
            Directive::CancelTimer,
            Directive::StopForeground,
            Directive::Teardown
        ]
    );
    assert_eq!(m.state(), PlaybackState::Ended);
    assert_eq!(m.live_entry(), None);
}

#[test]
fn seek_after_end_starts_a_new_run() {
    let mut m = PlaybackMachine::new(still_then_voice());
    m.start(13.0);
    m.on_timer(m.live_entry().unwrap());
    let d = m.seek_ratio(0.0);
    assert_eq!(shown(&d), vec![(0, 0.0)]);
    assert!(!d.contains(&Directive::Teardown));
}

#[test]
fn seek_ratio_clamps() {
    let mut m = PlaybackMachine::new(still_then_voice());
    m.start(0.0);
    assert_eq!(shown(&m.seek_ratio(0.5)), vec![(1, 0.0)]);
    assert_eq!(shown(&m.seek_ratio(7.0)), vec![(1, 7.0)]);
    assert_eq!(shown(&m.seek_ratio(f64::NAN)), vec![(0, 0.0)]);
}

#[test]
fn restart_while_playing_tears_down_first() {
    let mut m = PlaybackMachine::new(still_then_voice());
    m.start(0.0);
    let d = m.start(8.0);
    assert_eq!(
        d[..3],
        [
            Directive::CancelTimer,
            Directive::StopForeground,
            Directive::Teardown
        ]
    );
    assert_eq!(shown(&d), vec![(1, 1.0)]);
}

#[test]
fn pause_and_resume_reenter_at_offset() {
    let mut m = PlaybackMachine::new(still_then_voice());
    m.start(7.0);
    let before = m.live_entry().unwrap();
    let d = m.pause(2.5);
    assert_eq!(d, vec![Directive::CancelTimer, Directive::StopForeground]);
    assert_eq!(
        m.state(),
        PlaybackState::Paused {
            index: 1,
            offset: 2.5
        }
    );
    assert!(m.on_timer(before).is_empty());
    assert!(m.pause(1.0).is_empty());

    let d = m.resume();
    assert_eq!(shown(&d), vec![(1, 2.5)]);
    assert_eq!(armed(&d).unwrap().1, Duration::from_secs_f64(4.5));
    assert_ne!(m.live_entry(), Some(before));
}

#[test]
fn close_cancels_everything() {
    let mut m = PlaybackMachine::new(still_then_voice());
    m.start(0.0);
    let entry = m.live_entry().unwrap();
    assert_eq!(
        m.close(),
        vec![
            Directive::CancelTimer,
            Directive::StopForeground,
            Directive::Teardown
        ]
    );
    assert_eq!(m.state(), PlaybackState::Idle);
    assert!(m.on_timer(entry).is_empty());
    assert!(m.close().is_empty());
}

#[test]
fn enormous_segment_arms_a_saturated_timer() {
    let mut m = PlaybackMachine::new(timeline(vec![(
        Shot::image("a", "a.jpg").with_voice_note("v.wav", 1e300),
        1e300,
    )]));
    let d = m.start(0.0);
    assert_eq!(shown(&d), vec![(0, 0.0)]);
    assert_eq!(armed(&d).unwrap().1, Duration::MAX);
}
