use super::*;
use crate::model::project::{Scene, Shot};
use crate::timeline::flatten::flatten_scenes;

fn overlay_of(shot: Shot) -> Overlay {
    let flat = flatten_scenes(&[Scene::new("s1", "Opening", vec![shot])]);
    Overlay::for_shot(&flat[0])
}

#[test]
fn defaults_render_cut_and_empty_caption() {
    let o = overlay_of(Shot::image("a", "a.jpg"));
    assert_eq!(o.scene_label, "Opening");
    assert_eq!(o.camera_line, "50mm · MS • Cut");
    assert_eq!(o.caption, "");
}

#[test]
fn dialogue_wins_over_notes() {
    let mut shot = Shot::video("v", "v.mp4");
    shot.meta.lens = "35mm".to_string();
    shot.meta.shot_type = "CU".to_string();
    shot.meta.transition = "Dissolve".to_string();
    shot.meta.notes = "handheld".to_string();
    let o = overlay_of(shot.clone());
    assert_eq!(o.camera_line, "35mm · CU • Dissolve");
    assert_eq!(o.caption, "handheld");

    shot.meta.dialogue = "We're late.".to_string();
    assert_eq!(overlay_of(shot).caption, "We're late.");
}

#[test]
fn blank_transition_falls_back_to_cut() {
    let mut shot = Shot::image("a", "a.jpg");
    shot.meta.transition = "  ".to_string();
    assert!(overlay_of(shot).camera_line.ends_with("• Cut"));
}
