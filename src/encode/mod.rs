//! Film encoding: the renderer boundary and its `ffmpeg` implementation.

pub(crate) mod ffmpeg;
pub(crate) mod render;
