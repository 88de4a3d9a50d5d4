//! Storyboard data model: projects, scenes, shots and the JSON document they travel in.

pub(crate) mod document;
pub(crate) mod project;
