//! Offline audio mixdown: ducking envelope, mix planning/rendering and WAV serialization.

pub(crate) mod envelope;
pub(crate) mod mix;
pub(crate) mod wav;
