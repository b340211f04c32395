//! GraphQL mutation resolvers.
//!
//! Typed inputs are validated here, before any service call; everything
//! after validation is one orchestration method per field.

use async_graphql::{Context, Object, Result};

use crate::{
    error::{from_service, from_service_json, gql_err},
    inputs::{
        ContinueWritingInput, CreateCharacterInput, CreateChapterInput, CreateDocumentInput,
        CreatePlotInput, CreateSceneInput, GenerateSceneInput, GenerateTextInput, LocationInput,
        LoginInput, MilestoneInput, ObservationInput, PlotPointInput, RegisterInput,
        UpdateChapterInput, UpdateDocumentInput, UpdateSceneInput, require_nonempty,
        require_positive, require_tension, to_body,
    },
    ops,
    scalars::Json,
    types::{
        AuthPayload, Chapter, CharacterMemory, Document, GenerationResult, Location, PlotMemory,
        Scene, WorldMemory,
    },
};

/// Root mutation type.
#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    // ── Accounts ────────────────────────────────────────────────────────

    /// Create an account and sign in.
    async fn register(&self, ctx: &Context<'_>, input: RegisterInput) -> Result<AuthPayload> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.register(
                &identity,
                &input.email,
                &input.password,
                input.display_name.as_deref().unwrap_or_default(),
            )
            .await,
        )
    }

    /// Sign in with email and password.
    async fn login(&self, ctx: &Context<'_>, input: LoginInput) -> Result<AuthPayload> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(ops.login(&identity, &input.email, &input.password).await)
    }

    /// Trade a refresh token for a fresh session.
    async fn refresh_token(&self, ctx: &Context<'_>, token: String) -> Result<AuthPayload> {
        require_nonempty("token", &token).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(ops.refresh_token(&identity, &token).await)
    }

    /// End the current session.
    async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.logout(&identity).await)
    }

    // ── Documents ───────────────────────────────────────────────────────

    /// Start a new document in a project.
    async fn create_document(
        &self,
        ctx: &Context<'_>,
        input: CreateDocumentInput,
    ) -> Result<Document> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(ops.create_document(&identity, &input.project_id, body).await)
    }

    /// Update document metadata.
    async fn update_document(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateDocumentInput,
    ) -> Result<Document> {
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(ops.update_document(&identity, &id, body).await)
    }

    /// Delete a document. Owner only.
    async fn delete_document(&self, ctx: &Context<'_>, id: String) -> Result<bool> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.delete_document(&identity, &id).await)
    }

    /// Add a chapter, appending after the last one unless the input names
    /// an ordinal.
    async fn create_chapter(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        input: CreateChapterInput,
    ) -> Result<Chapter> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(
            ops.create_chapter(&identity, &document_id, input.chapter_number, body)
                .await,
        )
    }

    /// Update a chapter's title or summary.
    async fn update_chapter(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        chapter_number: i32,
        input: UpdateChapterInput,
    ) -> Result<Chapter> {
        require_positive("chapterNumber", chapter_number).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(
            ops.update_chapter(&identity, &document_id, chapter_number, body)
                .await,
        )
    }

    /// Remove a chapter and its scenes.
    async fn delete_chapter(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        chapter_number: i32,
    ) -> Result<bool> {
        require_positive("chapterNumber", chapter_number).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(ops.delete_chapter(&identity, &document_id, chapter_number).await)
    }

    /// Add a scene to a chapter, appending unless the input names an
    /// ordinal.
    async fn create_scene(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        chapter_number: i32,
        input: CreateSceneInput,
    ) -> Result<Scene> {
        require_positive("chapterNumber", chapter_number).map_err(gql_err)?;
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(
            ops.create_scene(&identity, &document_id, chapter_number, input.scene_number, body)
                .await,
        )
    }

    /// Rewrite a scene's content or framing.
    async fn update_scene(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        chapter_number: i32,
        scene_number: i32,
        input: UpdateSceneInput,
    ) -> Result<Scene> {
        require_positive("chapterNumber", chapter_number).map_err(gql_err)?;
        require_positive("sceneNumber", scene_number).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(
            ops.update_scene(&identity, &document_id, chapter_number, scene_number, body)
                .await,
        )
    }

    /// Remove a scene.
    async fn delete_scene(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        chapter_number: i32,
        scene_number: i32,
    ) -> Result<bool> {
        require_positive("chapterNumber", chapter_number).map_err(gql_err)?;
        require_positive("sceneNumber", scene_number).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.delete_scene(&identity, &document_id, chapter_number, scene_number)
                .await,
        )
    }

    // ── Character memory ────────────────────────────────────────────────

    /// Track a new character.
    async fn create_character(
        &self,
        ctx: &Context<'_>,
        input: CreateCharacterInput,
    ) -> Result<CharacterMemory> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(ops.create_character(&identity, &input.project_id, body).await)
    }

    /// Replace a character's current state.
    async fn update_character_state(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        character_id: String,
        state: Json,
    ) -> Result<CharacterMemory> {
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.update_character_state(&identity, &project_id, &character_id, state.0)
                .await,
        )
    }

    /// Append an observation to a character's memory.
    async fn add_character_observation(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        character_id: String,
        input: ObservationInput,
    ) -> Result<CharacterMemory> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(
            ops.add_observation(&identity, &project_id, &character_id, body)
                .await,
        )
    }

    // ── Plot memory ─────────────────────────────────────────────────────

    /// Open a new plot thread.
    async fn create_plot(&self, ctx: &Context<'_>, input: CreatePlotInput) -> Result<PlotMemory> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(ops.create_plot(&identity, &input.project_id, body).await)
    }

    /// Record a plot development.
    async fn add_plot_point(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        plot_id: String,
        input: PlotPointInput,
    ) -> Result<PlotMemory> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(
            ops.add_plot_point(&identity, &project_id, &plot_id, body)
                .await,
        )
    }

    /// Mark a milestone on a plot thread.
    async fn add_plot_milestone(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        plot_id: String,
        input: MilestoneInput,
    ) -> Result<PlotMemory> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(
            ops.add_plot_milestone(&identity, &project_id, &plot_id, body)
                .await,
        )
    }

    /// Set narrative tension for a chapter, on a 0 to 10 scale.
    async fn update_plot_tension(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        plot_id: String,
        chapter_number: i32,
        tension_level: f64,
    ) -> Result<PlotMemory> {
        require_positive("chapterNumber", chapter_number).map_err(gql_err)?;
        require_tension(tension_level).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.update_plot_tension(&identity, &project_id, &plot_id, chapter_number, tension_level)
                .await,
        )
    }

    // ── World memory ────────────────────────────────────────────────────

    /// Record a fact under a world category.
    async fn add_world_fact(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        category: String,
        fact: Json,
    ) -> Result<WorldMemory> {
        require_nonempty("category", &category).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.add_world_fact(&identity, &project_id, &category, &fact.0)
                .await,
        )
    }

    /// Add a location to the world.
    async fn add_location(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        input: LocationInput,
    ) -> Result<Location> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        let body = to_body(&input).map_err(gql_err)?;
        from_service(ops.add_location(&identity, &project_id, body).await)
    }

    /// Ask the memory service for contradictions in the world record.
    async fn validate_world_consistency(
        &self,
        ctx: &Context<'_>,
        project_id: String,
    ) -> Result<Json> {
        let (ops, identity) = ops!(ctx);
        from_service_json(ops.validate_world_consistency(&identity, &project_id).await)
    }

    // ── Generation ──────────────────────────────────────────────────────

    /// Generate prose from a prompt. Blocks until the AI service answers.
    async fn generate_text(
        &self,
        ctx: &Context<'_>,
        input: GenerateTextInput,
    ) -> Result<GenerationResult> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(ops.generate_text(&identity, input).await)
    }

    /// Draft a scene in the background. Returns an in-progress receipt;
    /// follow the draft through the generation progress subscription.
    async fn generate_scene(
        &self,
        ctx: &Context<'_>,
        input: GenerateSceneInput,
    ) -> Result<GenerationResult> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(ops.generate_scene(&identity, input).await)
    }

    /// Continue a scene from its current text and save the appended
    /// result.
    async fn continue_writing(
        &self,
        ctx: &Context<'_>,
        input: ContinueWritingInput,
    ) -> Result<GenerationResult> {
        input.validate().map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service(ops.continue_writing(&identity, input).await)
    }
}
