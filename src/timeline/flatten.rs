use crate::model::project::{Scene, Shot};

#[derive(Clone, Debug, PartialEq)]
/// A non-empty shot together with the scene that owns it.
pub struct FlatShot {
    /// Position of the owning scene in the project.
    pub scene_index: usize,
    /// Owning scene id.
    pub scene_id: String,
    /// Owning scene name (overlay label).
    pub scene_name: String,
    /// Snapshot of the shot.
    pub shot: Shot,
}

/// Flatten the scene tree into play order, dropping empty slots.
///
/// Scene order and intra-scene order are preserved. The result owns its shots, so later edits to
/// `scenes` do not affect it.
pub fn flatten_scenes(scenes: &[Scene]) -> Vec<FlatShot> {
    scenes
        .iter()
        .enumerate()
        .flat_map(|(scene_index, scene)| {
            scene.shots.iter().flatten().map(move |shot| FlatShot {
                scene_index,
                scene_id: scene.id.clone(),
                scene_name: scene.name.clone(),
                shot: shot.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/flatten.rs"]
mod tests;
