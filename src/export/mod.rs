//! Film export: probe, mix and encode a project into one deliverable.

pub(crate) mod pipeline;
