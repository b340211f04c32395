//! GraphQL output types.
//!
//! These types are deserialized from the JSON values returned by upstream
//! services. They use `#[derive(SimpleObject)]` for output types; fields use
//! `serde` for deserialization and `async-graphql` for schema generation.
//! Payloads whose shape belongs to an upstream service (state blobs, facts,
//! style guidelines) stay behind the `Json` scalar.

use {
    async_graphql::{ComplexObject, Enum, SimpleObject},
    serde::Deserialize,
};

use crate::scalars::Json;

// ── Accounts ────────────────────────────────────────────────────────────────

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub subscription_tier: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Project memberships; populated once the project service lands.
    #[serde(default)]
    pub projects: Vec<Json>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

// ── Documents ───────────────────────────────────────────────────────────────

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
#[graphql(complex)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub settings: Option<Json>,
    #[serde(default)]
    pub metadata: Option<Json>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[ComplexObject]
impl Document {
    /// Total word count across every chapter, derived from scene contents.
    async fn current_word_count(&self) -> i32 {
        self.chapters.iter().map(Chapter::scene_word_count).sum()
    }
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
#[graphql(complex)]
pub struct Chapter {
    #[serde(default)]
    pub chapter_number: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub status: Option<String>,
}

#[ComplexObject]
impl Chapter {
    /// Word count summed from this chapter's scenes.
    async fn word_count(&self) -> i32 {
        self.scene_word_count()
    }
}

impl Chapter {
    pub(crate) fn scene_word_count(&self) -> i32 {
        self.scenes.iter().map(|scene| scene.word_count).sum()
    }
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub scene_number: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "type")]
    #[graphql(name = "type")]
    pub scene_type: Option<String>,
    #[serde(default)]
    pub word_count: i32,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub metadata: Option<Json>,
}

// ── Character memory ────────────────────────────────────────────────────────

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterMemory {
    pub character_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub current_state: Option<CharacterState>,
    #[serde(default)]
    pub observations: Vec<CharacterObservation>,
    #[serde(default)]
    pub reflections: Vec<CharacterReflection>,
    #[serde(default)]
    pub executed_actions: Vec<CharacterAction>,
    #[serde(default)]
    pub relationships: Vec<CharacterRelationship>,
    #[serde(default)]
    pub timeline_summary: Option<Json>,
    #[serde(default)]
    pub metadata: Option<Json>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterState {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub emotional_state: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterObservation {
    #[serde(default)]
    pub observation_id: String,
    #[serde(default)]
    pub chapter_number: i32,
    #[serde(default)]
    pub scene_number: i32,
    #[serde(default)]
    pub observation: String,
    #[serde(default)]
    pub observation_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterReflection {
    #[serde(default)]
    pub reflection_id: String,
    #[serde(default)]
    pub reflection: String,
    #[serde(default)]
    pub emotional_impact: Option<String>,
    #[serde(default)]
    pub decisions_influenced: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterAction {
    #[serde(default)]
    pub action_id: String,
    #[serde(default)]
    pub chapter_number: i32,
    #[serde(default)]
    pub scene_number: i32,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRelationship {
    #[serde(default)]
    pub target_character_id: String,
    #[serde(default)]
    pub target_character_name: Option<String>,
    #[serde(default)]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dynamics: Vec<RelationshipDynamic>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDynamic {
    #[serde(default)]
    pub chapter_number: i32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub change: Option<String>,
}

// ── Plot memory ─────────────────────────────────────────────────────────────

/// A plot thread after normalization. The memory service speaks an older
/// dialect (`threadName`, `premise`, `centralConflict`, milestones); the
/// orchestration layer maps those onto this shape before deserialization.
#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotMemory {
    pub plot_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub story_arc: String,
    #[serde(default)]
    pub current_state: PlotState,
    #[serde(default)]
    pub key_moments: Vec<KeyMoment>,
    #[serde(default)]
    pub involved_characters: Vec<PlotCharacter>,
    #[serde(default)]
    pub conflicts: Vec<PlotConflict>,
    #[serde(default)]
    pub related_subplots: Vec<String>,
    #[serde(default)]
    pub foreshadowing: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Json>,
}

#[derive(Debug, Default, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotState {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tension_level: f64,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMoment {
    #[serde(default)]
    pub moment_id: Option<String>,
    #[serde(default)]
    pub chapter_number: i32,
    #[serde(default)]
    pub scene_number: i32,
    #[serde(default)]
    pub moment_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotCharacter {
    #[serde(default)]
    pub character_id: String,
    #[serde(default)]
    pub character_name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotConflict {
    #[serde(default, rename = "type")]
    #[graphql(name = "type")]
    pub conflict_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub resolution: Option<String>,
}

// ── World memory ────────────────────────────────────────────────────────────

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldMemory {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub category: String,
    /// Facts are free-form records owned by the memory service.
    #[serde(default)]
    pub facts: Vec<Json>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<Json>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub location_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    #[graphql(name = "type")]
    pub location_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub current_state: Option<Json>,
    #[serde(default)]
    pub history: Vec<Json>,
    #[serde(default)]
    pub connected_locations: Vec<String>,
    #[serde(default)]
    pub significance: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Json>,
}

// ── Generation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub status: Option<GenerationStatus>,
    #[serde(default)]
    pub generated_text: String,
    #[serde(default)]
    pub word_count: i32,
    #[serde(default)]
    pub tokens_used: i32,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub parameters: Json,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub chapter_number: i32,
    #[serde(default)]
    pub scene_number: i32,
    #[serde(default)]
    pub characters: Vec<CharacterMemory>,
    #[serde(default)]
    pub active_plots: Vec<PlotMemory>,
    #[serde(default)]
    pub current_location: Option<Location>,
    #[serde(default)]
    pub recent_events: Vec<String>,
    #[serde(default)]
    pub style_guidelines: Option<Json>,
}

// ── Subscription events ─────────────────────────────────────────────────────

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationProgressEvent {
    pub request_id: String,
    #[serde(default)]
    pub progress: i32,
    pub status: GenerationStatus,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneUpdatedEvent {
    pub document_id: String,
    #[serde(default)]
    pub chapter_number: i32,
    #[serde(default)]
    pub scene_number: i32,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorEvent {
    pub document_id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, SimpleObject, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorEvent {
    pub document_id: String,
    pub user_id: String,
    #[serde(default)]
    pub position: Option<Json>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn word_counts_derive_from_scenes() {
        let document: Document = serde_json::from_value(json!({
            "id": "doc-1",
            "projectId": "p1",
            "title": "The Lighthouse",
            "chapters": [
                {
                    "chapterNumber": 1,
                    "title": "Arrival",
                    "scenes": [
                        { "sceneNumber": 1, "content": "a", "wordCount": 120 },
                        { "sceneNumber": 2, "content": "b", "wordCount": 80 },
                    ],
                },
                {
                    "chapterNumber": 2,
                    "title": "The Storm",
                    "scenes": [
                        { "sceneNumber": 1, "content": "c", "wordCount": 50 },
                    ],
                },
            ],
        }))
        .unwrap();

        let per_chapter: Vec<i32> = document
            .chapters
            .iter()
            .map(Chapter::scene_word_count)
            .collect();
        assert_eq!(per_chapter, vec![200, 50]);
    }

    #[test]
    fn sparse_service_payloads_deserialize() {
        let character: CharacterMemory = serde_json::from_value(json!({
            "characterId": "c1",
        }))
        .unwrap();
        assert_eq!(character.character_id, "c1");
        assert!(character.observations.is_empty());
        assert!(character.current_state.is_none());

        let scene: Scene = serde_json::from_value(json!({
            "sceneNumber": 3,
            "type": "DIALOGUE",
        }))
        .unwrap();
        assert_eq!(scene.scene_type.as_deref(), Some("DIALOGUE"));
        assert_eq!(scene.word_count, 0);
    }

    #[test]
    fn generation_status_uses_wire_spelling() {
        let status: GenerationStatus = serde_json::from_value(json!("IN_PROGRESS")).unwrap();
        assert_eq!(status, GenerationStatus::InProgress);
        let status: GenerationStatus = serde_json::from_value(json!("COMPLETED")).unwrap();
        assert_eq!(status, GenerationStatus::Completed);
    }
}
