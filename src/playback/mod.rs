//! Real-time playback: a pure scheduling state machine and the tokio task that drives it.

pub(crate) mod driver;
pub(crate) mod machine;
pub(crate) mod output;
