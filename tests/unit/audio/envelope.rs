use super::*;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn constant_envelope_ignores_time() {
    let env = DuckEnvelope::constant(0.6);
    assert_eq!(env.gain_at(0.0), 0.6);
    assert_eq!(env.gain_at(123.0), 0.6);
    assert!(env.windows().is_empty());
}

#[test]
fn ducks_only_under_foreground_windows() {
    // image 5 s, image with voice note 8 s, video 7 s
    let env = DuckEnvelope::ducked(0.6, 0.25, 0.12, vec![(5.0, 13.0), (13.0, 20.0)]);
    assert!(approx(env.gain_at(2.0), 0.6));
    assert!(approx(env.gain_at(10.0), 0.15));
    assert!(approx(env.gain_at(16.0), 0.15));
    // back-to-back windows keep the dip held across the boundary
    assert!(approx(env.gain_at(13.0), 0.15));
    assert!(approx(env.gain_at(13.05), 0.15));
    assert!(approx(env.gain_at(21.0), 0.6));
}

#[test]
fn attack_and_release_are_linear() {
    let env = DuckEnvelope::ducked(1.0, 0.0, 1.0, vec![(2.0, 6.0)]);
    assert!(approx(env.gain_at(2.0), 1.0));
    assert!(approx(env.gain_at(2.5), 0.5));
    assert!(approx(env.gain_at(3.0), 0.0));
    assert!(approx(env.gain_at(6.0), 0.0));
    assert!(approx(env.gain_at(6.25), 0.25));
    assert!(approx(env.gain_at(7.0), 1.0));
}

#[test]
fn release_of_short_window_starts_from_reached_depth() {
    let env = DuckEnvelope::ducked(1.0, 0.0, 1.0, vec![(0.0, 0.5)]);
    assert!(approx(env.gain_at(0.5), 0.5));
    assert!(approx(env.gain_at(1.0), 0.75));
    assert!(approx(env.gain_at(1.5), 1.0));
}

#[test]
fn zero_ramp_switches_instantly() {
    let env = DuckEnvelope::ducked(0.8, 0.5, 0.0, vec![(1.0, 2.0)]);
    assert!(approx(env.gain_at(0.999), 0.8));
    assert!(approx(env.gain_at(1.0), 0.4));
    assert!(approx(env.gain_at(1.999), 0.4));
    assert!(approx(env.gain_at(2.0), 0.8));
}

#[test]
fn invalid_windows_are_dropped_and_rest_sorted() {
    let env = DuckEnvelope::ducked(
        1.0,
        0.5,
        0.1,
        vec![(8.0, 9.0), (3.0, 3.0), (f64::NAN, 4.0), (1.0, 2.0)],
    );
    assert_eq!(env.windows(), &[(1.0, 2.0), (8.0, 9.0)]);
    assert_eq!(env.base(), 1.0);
    assert_eq!(env.ducked_gain(), 0.5);
}

#[test]
fn touching_windows_merge() {
    let env = DuckEnvelope::ducked(1.0, 0.5, 0.1, vec![(13.0, 20.0), (5.0, 13.0), (25.0, 26.0)]);
    assert_eq!(env.windows(), &[(5.0, 20.0), (25.0, 26.0)]);
}
