/// Convenience result type used across the crate.
pub type StoryboardResult<T> = Result<T, StoryboardError>;

/// Pipeline stage reported by a failed export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportStage {
    /// Resolving segment durations (video probing).
    Probing,
    /// Building and rendering the audio mixdown.
    Mixing,
    /// Rendering, concatenating or muxing through the encoder.
    Encoding,
}

impl std::fmt::Display for ExportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Probing => "probing",
            Self::Mixing => "mixing",
            Self::Encoding => "encoding",
        })
    }
}

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum StoryboardError {
    /// Invalid user-provided project or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Media metadata could not be read.
    #[error("probe error: {0}")]
    Probe(String),

    /// An audio asset could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The external encoder failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// An export failed; carries the stage so callers can report it in one message.
    #[error("export failed while {stage}: {message}")]
    Export {
        /// Stage that failed.
        stage: ExportStage,
        /// Rendered underlying error.
        message: String,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoryboardError {
    /// Build a [`StoryboardError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StoryboardError::Probe`] value.
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Build a [`StoryboardError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`StoryboardError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`StoryboardError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Wrap `self` as the failure of an export `stage`.
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn at_stage(self, stage: ExportStage) -> Self {
        match self {
            Self::Export { .. } => self,
            other => Self::Export {
                stage,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
