//! GraphQL input types and boundary validation.
//!
//! Inputs are typed and checked here, before any orchestration or upstream
//! call runs. Validation failures surface as `VALIDATION_FAILED` errors.
//! Each input serializes straight into the JSON body its upstream service
//! expects, so `None` fields are skipped rather than sent as nulls.

use {async_graphql::InputObject, serde::Serialize};

use vellum_common::{GatewayError, GatewayResult};

use crate::scalars::Json;

/// Serialize a typed input into the JSON body an upstream service expects.
pub(crate) fn to_body<T: Serialize>(input: &T) -> GatewayResult<serde_json::Value> {
    serde_json::to_value(input)
        .map_err(|e| GatewayError::Internal(format!("failed to encode request: {e}")))
}

pub(crate) fn require_nonempty(field: &str, value: &str) -> GatewayResult<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: i32) -> GatewayResult<()> {
    if value < 1 {
        return Err(GatewayError::validation(format!("{field} must be positive")));
    }
    Ok(())
}

/// Tension is a 0 to 10 scale owned by the memory service.
pub(crate) fn require_tension(value: f64) -> GatewayResult<()> {
    if !(0.0..=10.0).contains(&value) {
        return Err(GatewayError::validation(
            "tensionLevel must be between 0 and 10",
        ));
    }
    Ok(())
}

// ── Accounts ────────────────────────────────────────────────────────────────

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RegisterInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("email", &self.email)?;
        require_nonempty("password", &self.password)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("email", &self.email)?;
        require_nonempty("password", &self.password)
    }
}

// ── Documents ───────────────────────────────────────────────────────────────

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentInput {
    pub project_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Json>,
}

impl CreateDocumentInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("projectId", &self.project_id)?;
        require_nonempty("title", &self.title)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Json>,
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChapterInput {
    /// Explicit ordinal; omitted means "append after the last chapter".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<i32>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl CreateChapterInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("title", &self.title)?;
        if let Some(n) = self.chapter_number {
            require_positive("chapterNumber", n)?;
        }
        Ok(())
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChapterInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSceneInput {
    /// Explicit ordinal; omitted means "append after the last scene".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[graphql(name = "type")]
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub scene_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Json>,
}

impl CreateSceneInput {
    pub fn validate(&self) -> GatewayResult<()> {
        if let Some(n) = self.scene_number {
            require_positive("sceneNumber", n)?;
        }
        Ok(())
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSceneInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[graphql(name = "type")]
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub scene_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Json>,
}

// ── Memory ──────────────────────────────────────────────────────────────────

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCharacterInput {
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Json>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Json>,
}

impl CreateCharacterInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("projectId", &self.project_id)?;
        require_nonempty("name", &self.name)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationInput {
    pub chapter_number: i32,
    pub scene_number: i32,
    pub observation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_type: Option<String>,
}

impl ObservationInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_positive("chapterNumber", self.chapter_number)?;
        require_positive("sceneNumber", self.scene_number)?;
        require_nonempty("observation", &self.observation)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlotInput {
    pub project_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central_conflict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Json>,
}

impl CreatePlotInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("projectId", &self.project_id)?;
        require_nonempty("title", &self.title)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotPointInput {
    pub chapter_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_number: Option<i32>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

impl PlotPointInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_positive("chapterNumber", self.chapter_number)?;
        require_nonempty("description", &self.description)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneInput {
    pub chapter_number: i32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achieved_at: Option<String>,
}

impl MilestoneInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_positive("chapterNumber", self.chapter_number)?;
        require_nonempty("description", &self.description)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub name: String,
    #[graphql(name = "type")]
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_locations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significance: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Json>,
}

impl LocationInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("name", &self.name)
    }
}

// ── Generation ──────────────────────────────────────────────────────────────

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextInput {
    pub project_id: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Json>,
}

impl GenerateTextInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("projectId", &self.project_id)?;
        require_nonempty("prompt", &self.prompt)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSceneInput {
    pub project_id: String,
    pub document_id: String,
    pub chapter_number: i32,
    pub scene_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidelines: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Json>,
}

impl GenerateSceneInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("projectId", &self.project_id)?;
        require_nonempty("documentId", &self.document_id)?;
        require_positive("chapterNumber", self.chapter_number)?;
        require_positive("sceneNumber", self.scene_number)
    }
}

#[derive(Debug, InputObject, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWritingInput {
    pub project_id: String,
    pub document_id: String,
    pub chapter_number: i32,
    pub scene_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_length: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Json>,
}

impl ContinueWritingInput {
    pub fn validate(&self) -> GatewayResult<()> {
        require_nonempty("projectId", &self.project_id)?;
        require_nonempty("documentId", &self.document_id)?;
        require_positive("chapterNumber", self.chapter_number)?;
        require_positive("sceneNumber", self.scene_number)?;
        if let Some(length) = self.continuation_length {
            require_positive("continuationLength", length)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn validation_rejects_blank_identifiers() {
        let input = CreateDocumentInput {
            project_id: "  ".into(),
            title: "The Lighthouse".into(),
            subtitle: None,
            description: None,
            genre: None,
            tags: None,
            settings: None,
        };
        let err = input.validate().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert!(err.to_string().contains("projectId"));
    }

    #[test]
    fn validation_rejects_non_positive_ordinals() {
        let input = GenerateSceneInput {
            project_id: "p1".into(),
            document_id: "d1".into(),
            chapter_number: 0,
            scene_number: 1,
            guidelines: None,
            parameters: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn tension_bounds_are_inclusive() {
        assert!(require_tension(0.0).is_ok());
        assert!(require_tension(10.0).is_ok());
        assert!(require_tension(10.5).is_err());
        assert!(require_tension(-0.1).is_err());
    }

    #[test]
    fn bodies_skip_unset_fields() {
        let input = CreateSceneInput {
            scene_number: None,
            title: None,
            content: "The keeper climbed the stairs.".into(),
            scene_type: Some("ACTION".into()),
            characters: None,
            location: None,
            time_of_day: None,
            mood: None,
            metadata: None,
        };
        let body = to_body(&input).unwrap();
        assert_eq!(body["content"], "The keeper climbed the stairs.");
        assert_eq!(body["type"], "ACTION");
        assert!(body.get("sceneNumber").is_none());
        assert!(body.get("title").is_none());
    }
}
