//! Manual presentation: overlay text and slide-by-slide navigation.

pub(crate) mod navigator;
pub(crate) mod overlay;
