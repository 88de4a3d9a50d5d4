use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{StoryboardError, StoryboardResult};
use crate::model::project::Project;

/// Schema tag written by the storyboard editor.
pub const DOCUMENT_SCHEMA: &str = "storyboard_v4";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// On-disk JSON form of a project.
///
/// Parsing is lenient: only `scenes` is required, unknown keys such as `exportedAt` are ignored.
pub struct ProjectDocument {
    /// Schema tag, when present.
    #[serde(default)]
    pub schema: Option<String>,
    /// The project itself.
    #[serde(flatten)]
    pub project: Project,
}

impl ProjectDocument {
    /// Wrap a project with the current schema tag.
    pub fn new(project: Project) -> Self {
        Self {
            schema: Some(DOCUMENT_SCHEMA.to_string()),
            project,
        }
    }

    /// Parse and validate a project document.
    pub fn from_json_str(s: &str) -> StoryboardResult<Project> {
        let doc: ProjectDocument = serde_json::from_str(s)
            .map_err(|e| StoryboardError::serde(format!("invalid project JSON: {e}")))?;
        doc.into_project()
    }

    /// Read, parse and validate a project document from disk.
    pub fn load(path: &Path) -> StoryboardResult<Project> {
        let f = File::open(path).map_err(|e| {
            StoryboardError::validation(format!("failed to open project '{}': {e}", path.display()))
        })?;
        let doc: ProjectDocument = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            StoryboardError::serde(format!("invalid project JSON '{}': {e}", path.display()))
        })?;
        doc.into_project()
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> StoryboardResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoryboardError::serde(e.to_string()))
    }

    fn into_project(self) -> StoryboardResult<Project> {
        if let Some(schema) = self.schema.as_deref()
            && !schema.starts_with("storyboard_")
        {
            return Err(StoryboardError::validation(format!(
                "unsupported project schema '{schema}'"
            )));
        }
        self.project.validate()?;
        Ok(self.project)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/document.rs"]
mod tests;
