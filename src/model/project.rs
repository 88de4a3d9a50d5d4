use std::collections::HashSet;

use crate::foundation::error::{StoryboardError, StoryboardResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Kind of media a shot displays.
pub enum MediaKind {
    /// Still image, held for a resolved duration.
    Image,
    /// Video clip whose own audio is foreground.
    Video,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
/// Opaque media handle: a relative asset path or a `data:` URL.
pub struct MediaRef(pub String);

impl MediaRef {
    /// Create a media reference from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the raw reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `true` when this reference embeds its bytes as a `data:` URL.
    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Short form for logs; data URLs are not printed in full.
    pub fn display_name(&self) -> String {
        if self.is_data_url() {
            let head = self.0.split(',').next().unwrap_or("data:");
            format!("{head},<{} bytes>", self.0.len())
        } else {
            self.0.clone()
        }
    }
}

/// Longest voice note a project may carry, in seconds (24 h).
pub const MAX_VOICE_NOTE_SECS: f64 = 24.0 * 60.0 * 60.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A recorded voice-over attached to a shot.
pub struct VoiceNote {
    /// Audio reference.
    #[serde(rename = "dataUrl", alias = "src")]
    pub audio: MediaRef,
    /// Known length in seconds.
    pub duration: f64,
    /// Optional MIME type recorded with the note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Cinematography metadata plus the scheduling attachments of a shot.
pub struct ShotMeta {
    /// Lens label, e.g. `50mm`.
    #[serde(default = "default_lens")]
    pub lens: String,
    /// Shot type label, e.g. `MS`.
    #[serde(default = "default_shot_type")]
    pub shot_type: String,
    /// Camera movements (`Pan`, `Tilt`, ...).
    #[serde(default)]
    pub movements: Vec<String>,
    /// Transition-out label.
    #[serde(default = "default_transition")]
    pub transition: String,
    /// Dialogue text.
    #[serde(default)]
    pub dialogue: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
    /// Optional voice-over.
    #[serde(default)]
    pub voice_note: Option<VoiceNote>,
    /// Manually set still duration in seconds (images only).
    #[serde(default, rename = "duration", skip_serializing_if = "Option::is_none")]
    pub still_secs: Option<f64>,
}

fn default_lens() -> String {
    "50mm".to_string()
}

fn default_shot_type() -> String {
    "MS".to_string()
}

fn default_transition() -> String {
    "Cut".to_string()
}

impl Default for ShotMeta {
    fn default() -> Self {
        Self {
            lens: default_lens(),
            shot_type: default_shot_type(),
            movements: Vec::new(),
            transition: default_transition(),
            dialogue: String::new(),
            notes: String::new(),
            voice_note: None,
            still_secs: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One storyboard frame.
pub struct Shot {
    /// Identifier, unique within a project.
    pub id: String,
    /// Media kind.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Media reference.
    pub src: MediaRef,
    /// Original file name, used for labels.
    #[serde(default)]
    pub filename: String,
    /// Metadata and attachments.
    #[serde(default)]
    pub meta: ShotMeta,
}

impl Shot {
    /// Create an image shot with default metadata.
    pub fn image(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(id, MediaKind::Image, src)
    }

    /// Create a video shot with default metadata.
    pub fn video(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(id, MediaKind::Video, src)
    }

    fn new(id: impl Into<String>, kind: MediaKind, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            src: MediaRef::new(src),
            filename: String::new(),
            meta: ShotMeta::default(),
        }
    }

    /// Attach a voice note of `duration` seconds.
    pub fn with_voice_note(mut self, audio: impl Into<String>, duration: f64) -> Self {
        self.meta.voice_note = Some(VoiceNote {
            audio: MediaRef::new(audio),
            duration,
            mime: None,
        });
        self
    }

    /// Set a manual still duration.
    pub fn with_still_secs(mut self, secs: f64) -> Self {
        self.meta.still_secs = Some(secs);
        self
    }

    /// Borrow the attached voice note, if any.
    pub fn voice_note(&self) -> Option<&VoiceNote> {
        self.meta.voice_note.as_ref()
    }

    /// Return `true` when the shot contributes foreground audio (video sound or a voice note).
    pub fn has_foreground_audio(&self) -> bool {
        self.kind == MediaKind::Video || self.meta.voice_note.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Named ordered group of shot slots; `None` is an empty editing slot.
pub struct Scene {
    /// Scene identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Shot slots in order.
    #[serde(default)]
    pub shots: Vec<Option<Shot>>,
}

impl Scene {
    /// Create a scene from filled shots.
    pub fn new(id: impl Into<String>, name: impl Into<String>, shots: Vec<Shot>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shots: shots.into_iter().map(Some).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Project-wide background music.
pub struct BackgroundTrack {
    /// Audio reference.
    pub src: MediaRef,
    /// Linear gain in `[0, 1]`.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Lower the music while foreground audio plays.
    #[serde(default = "default_ducking")]
    pub ducking: bool,
}

fn default_volume() -> f32 {
    0.6
}

fn default_ducking() -> bool {
    true
}

impl BackgroundTrack {
    /// Background track with default volume and ducking enabled.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: MediaRef::new(src),
            volume: default_volume(),
            ducking: default_ducking(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// A storyboard project: the scene tree plus optional background music.
pub struct Project {
    /// Project name.
    #[serde(rename = "projectName", default)]
    pub name: String,
    /// Ordered scenes.
    pub scenes: Vec<Scene>,
    /// Optional background track.
    #[serde(
        rename = "backgroundMusic",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub background: Option<BackgroundTrack>,
}

impl Project {
    /// Check the invariants the scheduler and mixer rely on.
    pub fn validate(&self) -> StoryboardResult<()> {
        let mut ids = HashSet::new();
        for scene in &self.scenes {
            for shot in scene.shots.iter().flatten() {
                if shot.id.is_empty() {
                    return Err(StoryboardError::validation(format!(
                        "shot in scene '{}' has an empty id",
                        scene.name
                    )));
                }
                if !ids.insert(shot.id.as_str()) {
                    return Err(StoryboardError::validation(format!(
                        "duplicate shot id '{}'",
                        shot.id
                    )));
                }
                if let Some(secs) = shot.meta.still_secs
                    && !secs.is_finite()
                {
                    return Err(StoryboardError::validation(format!(
                        "shot '{}' still duration must be finite",
                        shot.id
                    )));
                }
                if let Some(note) = &shot.meta.voice_note
                    && !(note.duration.is_finite()
                        && (0.0..=MAX_VOICE_NOTE_SECS).contains(&note.duration))
                {
                    return Err(StoryboardError::validation(format!(
                        "shot '{}' voice note duration must be within [0, {MAX_VOICE_NOTE_SECS}] seconds",
                        shot.id
                    )));
                }
            }
        }
        if let Some(bg) = &self.background
            && !(0.0..=1.0).contains(&bg.volume)
        {
            return Err(StoryboardError::validation(
                "background volume must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/project.rs"]
mod tests;
