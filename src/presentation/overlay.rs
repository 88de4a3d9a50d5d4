use crate::timeline::flatten::FlatShot;

/// Default transition label when a shot carries none.
pub const DEFAULT_TRANSITION: &str = "Cut";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
/// Text drawn over a presented shot.
pub struct Overlay {
    /// Top-left: scene name.
    pub scene_label: String,
    /// Top-right: `"{lens} · {shot type} • {transition}"`.
    pub camera_line: String,
    /// Bottom: dialogue, else notes, else empty.
    pub caption: String,
}

impl Overlay {
    /// Build the overlay for one flattened shot.
    pub fn for_shot(flat: &FlatShot) -> Self {
        let meta = &flat.shot.meta;
        let transition = if meta.transition.trim().is_empty() {
            DEFAULT_TRANSITION
        } else {
            meta.transition.as_str()
        };
        let caption = if !meta.dialogue.is_empty() {
            meta.dialogue.clone()
        } else {
            meta.notes.clone()
        };
        Self {
            scene_label: flat.scene_name.clone(),
            camera_line: format!("{} · {} • {transition}", meta.lens, meta.shot_type),
            caption,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/overlay.rs"]
mod tests;
