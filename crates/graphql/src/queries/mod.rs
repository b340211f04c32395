//! GraphQL query resolvers.
//!
//! Resolvers stay declarative: pull the shared handle, validate arguments,
//! call one orchestration method, and shape the response. Access checks
//! live behind the orchestration layer, never here.

use async_graphql::{Context, Object, Result};

use crate::{
    error::{from_service, from_service_json, gql_err},
    inputs::{require_nonempty, require_positive},
    ops,
    scalars::Json,
    types::{
        Chapter, CharacterMemory, Document, GenerationContext, Location, PlotMemory, Scene, User,
        WorldMemory,
    },
};

/// Root query type.
#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    // ── Accounts ────────────────────────────────────────────────────────

    /// The authenticated account.
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.me(&identity).await)
    }

    /// Look up an account by id.
    async fn user(&self, ctx: &Context<'_>, id: String) -> Result<User> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.user_by_id(&identity, &id).await)
    }

    // ── Documents ───────────────────────────────────────────────────────

    /// A single document with its chapter tree.
    async fn document(&self, ctx: &Context<'_>, id: String) -> Result<Document> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.document(&identity, &id).await)
    }

    /// All documents in a project.
    async fn documents(&self, ctx: &Context<'_>, project_id: String) -> Result<Vec<Document>> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.documents(&identity, &project_id).await)
    }

    /// One chapter of a document.
    async fn chapter(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        chapter_number: i32,
    ) -> Result<Chapter> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.chapter(&identity, &document_id, chapter_number).await)
    }

    /// One scene of a chapter.
    async fn scene(
        &self,
        ctx: &Context<'_>,
        document_id: String,
        chapter_number: i32,
        scene_number: i32,
    ) -> Result<Scene> {
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.scene(&identity, &document_id, chapter_number, scene_number)
                .await,
        )
    }

    // ── Character memory ────────────────────────────────────────────────

    /// A character's full memory record.
    async fn character(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        character_id: String,
    ) -> Result<CharacterMemory> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.character(&identity, &project_id, &character_id).await)
    }

    /// Every character tracked for a project. Empty when the memory
    /// service is unreachable.
    async fn characters(
        &self,
        ctx: &Context<'_>,
        project_id: String,
    ) -> Result<Vec<CharacterMemory>> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.characters(&identity, &project_id).await)
    }

    /// Chronological events for a character, newest last.
    async fn character_timeline(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        character_id: String,
        limit: Option<i32>,
    ) -> Result<Json> {
        if let Some(limit) = limit {
            require_positive("limit", limit).map_err(gql_err)?;
        }
        let (ops, identity) = ops!(ctx);
        from_service_json(
            ops.character_timeline(&identity, &project_id, &character_id, limit)
                .await,
        )
    }

    // ── Plot memory ─────────────────────────────────────────────────────

    /// A single plot thread.
    async fn plot(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        plot_id: String,
    ) -> Result<PlotMemory> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.plot(&identity, &project_id, &plot_id).await)
    }

    /// Every plot thread in a project. Empty when the memory service is
    /// unreachable.
    async fn plots(&self, ctx: &Context<'_>, project_id: String) -> Result<Vec<PlotMemory>> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.plots(&identity, &project_id).await)
    }

    /// The project's main plot thread, when one is flagged.
    async fn main_plot(
        &self,
        ctx: &Context<'_>,
        project_id: String,
    ) -> Result<Option<PlotMemory>> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.main_plot(&identity, &project_id).await)
    }

    /// Plot threads still in motion.
    async fn active_plots(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        chapter_number: Option<i32>,
    ) -> Result<Vec<PlotMemory>> {
        // Accepted for API compatibility; the memory service does not
        // filter activity by chapter yet.
        let _ = chapter_number;
        let (ops, identity) = ops!(ctx);
        from_service(ops.active_plots(&identity, &project_id).await)
    }

    // ── World memory ────────────────────────────────────────────────────

    /// World fact records grouped by category.
    async fn world_memory(
        &self,
        ctx: &Context<'_>,
        project_id: String,
    ) -> Result<Vec<WorldMemory>> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.world_memory(&identity, &project_id).await)
    }

    /// Flattened world facts, optionally scoped to one category.
    async fn world_facts(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        category: Option<String>,
    ) -> Result<Vec<Json>> {
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.world_facts(&identity, &project_id, category.as_deref())
                .await,
        )
    }

    /// A named location and its connections.
    async fn location(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        location_id: String,
    ) -> Result<Location> {
        let (ops, identity) = ops!(ctx);
        from_service(ops.location(&identity, &project_id, &location_id).await)
    }

    // ── Generation support ──────────────────────────────────────────────

    /// The assembled memory context the AI service would receive for a
    /// scene.
    async fn generation_context(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        scene_id: String,
        chapter_number: i32,
        scene_number: i32,
    ) -> Result<GenerationContext> {
        let (ops, identity) = ops!(ctx);
        from_service(
            ops.generation_context(&identity, &project_id, &scene_id, chapter_number, scene_number)
                .await,
        )
    }

    /// Free-text search across a project's memories.
    async fn search_memory(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        query: String,
        #[graphql(name = "type")] kind: Option<String>,
    ) -> Result<Json> {
        require_nonempty("query", &query).map_err(gql_err)?;
        let (ops, identity) = ops!(ctx);
        from_service_json(
            ops.search_memory(&identity, &project_id, &query, kind.as_deref())
                .await,
        )
    }
}
