//! Saved-project payloads as served to the project view page.
//!
//! The API wraps results in `{ success, message, data, error }`, but older
//! endpoints return the project bare, so both shapes are accepted. The
//! diagram itself lives in `project_data`, stored either as a nested object
//! or as a JSON-encoded string.

#[cfg(test)]
#[path = "project_test.rs"]
mod project_test;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::scene::{SceneError, SceneModel};

/// Title shown when a project has none.
pub const UNTITLED: &str = "Untitled Character Diagram";

/// Author label shown when a project has no author name.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Error returned when a project payload cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The response body was not valid JSON or not a project object.
    #[error("failed to decode project: {0}")]
    Decode(#[from] serde_json::Error),
    /// The embedded `project_data` string was not valid JSON.
    #[error("failed to decode diagram: {0}")]
    Scene(#[from] SceneError),
    /// The API reported a failure.
    #[error("project request failed: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "authorName")]
    author_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    user_id: Option<String>,
    #[serde(default)]
    project_data: Option<Value>,
}

/// A project ready for display.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    pub title: Option<String>,
    pub author_name: Option<String>,
    /// Owner's user id, in decimal form when the API sends a number.
    pub user_id: Option<String>,
    pub scene: SceneModel,
}

impl ProjectDocument {
    /// Decode a project response body.
    ///
    /// # Errors
    ///
    /// See [`ProjectDocument::from_response_value`]; also fails when `raw`
    /// is not JSON.
    pub fn from_response_json(raw: &str) -> Result<Self, ProjectError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_response_value(value)
    }

    /// Decode an already-parsed project response.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectError::Api`] when the envelope reports
    /// `success: false`, [`ProjectError::Decode`] when the payload is not a
    /// project object, and [`ProjectError::Scene`] when a string
    /// `project_data` is not valid JSON.
    pub fn from_response_value(mut value: Value) -> Result<Self, ProjectError> {
        if value.is_object() {
            let envelope = Envelope::deserialize(&value)?;
            if envelope.success == Some(false) {
                let reason = envelope.error.or(envelope.message).unwrap_or_else(|| "unknown error".to_owned());
                return Err(ProjectError::Api(reason));
            }
        }

        let payload = match value.get_mut("data").map(Value::take) {
            Some(data) if is_truthy(&data) => data,
            _ => value,
        };
        let record = ProjectRecord::deserialize(payload)?;

        let scene = match record.project_data {
            Some(Value::String(raw)) if !raw.is_empty() => SceneModel::from_json(&raw)?,
            Some(data @ Value::Object(_)) => SceneModel::from_value(&data),
            Some(Value::Null | Value::String(_)) | None => {
                log::debug!("project has no diagram data");
                SceneModel::default()
            }
            Some(other) => {
                log::warn!("ignoring project_data of unexpected shape: {other}");
                SceneModel::default()
            }
        };

        Ok(Self { title: record.title, author_name: record.author_name, user_id: record.user_id, scene })
    }

    /// Title for display, falling back to [`UNTITLED`].
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(UNTITLED)
    }

    /// Author name for display, falling back to [`UNKNOWN_AUTHOR`].
    #[must_use]
    pub fn author_label(&self) -> &str {
        self.author_name.as_deref().filter(|a| !a.is_empty()).unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Whether the signed-in viewer owns this project. Anonymous viewers and
    /// projects without an owner never match.
    #[must_use]
    pub fn is_owner(&self, viewer_id: Option<&str>) -> bool {
        match (viewer_id, self.user_id.as_deref()) {
            (Some(viewer), Some(owner)) => viewer == owner,
            _ => false,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
