use super::*;

#[test]
fn shot_parses_editor_json_with_null_meta_fields_defaulted() {
    let json = r#"{
        "id": "s_1",
        "type": "image",
        "src": "frames/a.jpg",
        "filename": "a.jpg",
        "meta": { "lens": "35mm", "voiceNote": { "dataUrl": "vo/a.webm", "duration": 3.5, "mime": "audio/webm" } }
    }"#;
    let shot: Shot = serde_json::from_str(json).unwrap();
    assert_eq!(shot.kind, MediaKind::Image);
    assert_eq!(shot.meta.lens, "35mm");
    assert_eq!(shot.meta.shot_type, "MS");
    assert_eq!(shot.meta.transition, "Cut");
    let note = shot.voice_note().unwrap();
    assert_eq!(note.audio.as_str(), "vo/a.webm");
    assert!((note.duration - 3.5).abs() < 1e-12);
    assert!(shot.has_foreground_audio());
}

#[test]
fn scene_keeps_empty_slots_as_none() {
    let json = r#"{ "id": "sc", "name": "Intro", "shots": [null, { "id": "s", "type": "video", "src": "c.mp4" }, null] }"#;
    let scene: Scene = serde_json::from_str(json).unwrap();
    assert_eq!(scene.shots.len(), 3);
    assert!(scene.shots[0].is_none());
    assert_eq!(scene.shots[1].as_ref().unwrap().kind, MediaKind::Video);
}

#[test]
fn media_ref_display_name_hides_data_payload() {
    let r = MediaRef::new("data:audio/webm;base64,AAAA");
    assert!(r.is_data_url());
    assert_eq!(r.display_name(), "data:audio/webm;base64,<27 bytes>");
    assert_eq!(MediaRef::new("a.wav").display_name(), "a.wav");
}

#[test]
fn validate_rejects_duplicate_ids() {
    let project = Project {
        name: "p".into(),
        scenes: vec![Scene::new(
            "a",
            "A",
            vec![Shot::image("s", "1.jpg"), Shot::image("s", "2.jpg")],
        )],
        background: None,
    };
    let err = project.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate shot id"));
}

#[test]
fn validate_rejects_out_of_range_background_volume() {
    let mut bg = BackgroundTrack::new("music.mp3");
    bg.volume = 1.5;
    let project = Project {
        name: "p".into(),
        scenes: vec![],
        background: Some(bg),
    };
    assert!(project.validate().is_err());
}

#[test]
fn validate_rejects_negative_voice_duration() {
    let project = Project {
        name: "p".into(),
        scenes: vec![Scene::new(
            "a",
            "A",
            vec![Shot::image("s", "1.jpg").with_voice_note("v.wav", -1.0)],
        )],
        background: None,
    };
    assert!(project.validate().is_err());
}

#[test]
fn validate_rejects_voice_note_longer_than_a_day() {
    let json = r#"{
        "scenes": [{ "id": "a", "name": "A", "shots": [{
            "id": "s", "type": "image", "src": "1.jpg",
            "meta": { "voiceNote": { "dataUrl": "v.wav", "duration": 1e300 } }
        }] }]
    }"#;
    let project: Project = serde_json::from_str(json).unwrap();
    assert!(project.validate().is_err());

    let at_limit = Project {
        name: "p".into(),
        scenes: vec![Scene::new(
            "a",
            "A",
            vec![Shot::image("s", "1.jpg").with_voice_note("v.wav", MAX_VOICE_NOTE_SECS)],
        )],
        background: None,
    };
    assert!(at_limit.validate().is_ok());
}

#[test]
fn background_defaults_enable_ducking() {
    let bg: BackgroundTrack = serde_json::from_str(r#"{ "src": "m.mp3" }"#).unwrap();
    assert!(bg.ducking);
    assert!((bg.volume - 0.6).abs() < 1e-6);
}
