use super::*;

#[test]
fn film_file_name_is_sanitized() {
    assert_eq!(film_file_name("My Film: take 2"), "My_Film_take_2_film.mp4");
    assert_eq!(film_file_name("   "), "storyboard_film.mp4");
    assert_eq!(film_file_name(""), "storyboard_film.mp4");
}
