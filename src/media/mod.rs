//! Media boundary: probe/decode service traits, `data:` URL staging and the `ffmpeg` backed
//! implementations.

pub(crate) mod ffmpeg;
pub(crate) mod service;
pub(crate) mod source;
