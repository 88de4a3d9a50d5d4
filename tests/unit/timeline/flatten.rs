use super::*;

fn scene(id: &str, slots: Vec<Option<Shot>>) -> Scene {
    Scene {
        id: id.to_string(),
        name: id.to_uppercase(),
        shots: slots,
    }
}

#[test]
fn empty_input_yields_empty_output() {
    assert!(flatten_scenes(&[]).is_empty());
    assert!(flatten_scenes(&[scene("a", vec![None, None])]).is_empty());
}

#[test]
fn drops_empty_slots_and_preserves_order() {
    let scenes = vec![
        scene(
            "a",
            vec![
                None,
                Some(Shot::image("1", "1.jpg")),
                None,
                Some(Shot::video("2", "2.mp4")),
            ],
        ),
        scene("b", vec![]),
        scene("c", vec![Some(Shot::image("3", "3.jpg")), None]),
    ];
    let flat = flatten_scenes(&scenes);
    let ids: Vec<&str> = flat.iter().map(|f| f.shot.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(flat[0].scene_name, "A");
    assert_eq!(flat[2].scene_index, 2);
    assert_eq!(flat[2].scene_id, "c");
}

#[test]
fn output_is_a_snapshot() {
    let mut scenes = vec![scene("a", vec![Some(Shot::image("1", "1.jpg"))])];
    let flat = flatten_scenes(&scenes);
    scenes[0].shots.clear();
    scenes[0].name = "renamed".into();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].scene_name, "A");
}
