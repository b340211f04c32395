//! Document operations.
//!
//! Access control resolves the document first: the project a document
//! belongs to is not trusted from the caller, it is read off the fetched
//! record. Reads need Viewer, writes need Editor, and deleting a whole
//! document needs Owner.

use serde_json::Value;
use vellum_common::{GatewayResult, ProjectRole, RequestContext};

use super::Ops;

impl Ops {
    /// Fetch a document and authorize the caller against its project.
    async fn authorize_document(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        min_role: ProjectRole,
    ) -> GatewayResult<Value> {
        let user = ctx.require_user()?;
        let document = self.backends.document.get_document(ctx, document_id).await?;
        let project_id = document
            .get("projectId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.check_project_access(user, project_id, min_role)?;
        Ok(document)
    }

    pub async fn document(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value> {
        self.authorize_document(ctx, id, ProjectRole::Viewer).await
    }

    pub async fn documents(&self, ctx: &RequestContext, project_id: &str) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        self.backends.document.list_documents(ctx, project_id).await
    }

    pub async fn chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, document_id, ProjectRole::Viewer)
            .await?;
        self.backends
            .document
            .get_chapter(ctx, document_id, chapter_number)
            .await
    }

    pub async fn scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
        scene_number: i32,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, document_id, ProjectRole::Viewer)
            .await?;
        self.backends
            .document
            .get_scene(ctx, document_id, chapter_number, scene_number)
            .await
    }

    pub async fn create_document(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        self.backends.document.create_document(ctx, body).await
    }

    pub async fn update_document(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, id, ProjectRole::Editor).await?;
        self.backends.document.update_document(ctx, id, body).await
    }

    pub async fn delete_document(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value> {
        self.authorize_document(ctx, id, ProjectRole::Owner).await?;
        self.backends.document.delete_document(ctx, id).await?;
        Ok(Value::Bool(true))
    }

    /// Create a chapter, assigning the next ordinal when the input does not
    /// carry one.
    pub async fn create_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        requested_number: Option<i32>,
        body: Value,
    ) -> GatewayResult<Value> {
        let document = self
            .authorize_document(ctx, document_id, ProjectRole::Editor)
            .await?;
        let chapter_number = match requested_number {
            Some(n) => n,
            None => next_ordinal(&document, "chapters"),
        };
        self.backends
            .document
            .create_chapter(ctx, document_id, chapter_number, body)
            .await
    }

    pub async fn update_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, document_id, ProjectRole::Editor)
            .await?;
        self.backends
            .document
            .update_chapter(ctx, document_id, chapter_number, body)
            .await
    }

    pub async fn delete_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, document_id, ProjectRole::Editor)
            .await?;
        self.backends
            .document
            .delete_chapter(ctx, document_id, chapter_number)
            .await?;
        Ok(Value::Bool(true))
    }

    /// Create a scene, assigning the next ordinal within the chapter when
    /// the input does not carry one.
    pub async fn create_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
        requested_number: Option<i32>,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, document_id, ProjectRole::Editor)
            .await?;
        let scene_number = match requested_number {
            Some(n) => n,
            None => {
                self.next_scene_ordinal(ctx, document_id, chapter_number)
                    .await
            },
        };
        self.backends
            .document
            .create_scene(ctx, document_id, chapter_number, scene_number, body)
            .await
    }

    pub async fn update_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
        scene_number: i32,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, document_id, ProjectRole::Editor)
            .await?;
        self.backends
            .document
            .update_scene(ctx, document_id, chapter_number, scene_number, body)
            .await
    }

    pub async fn delete_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
        scene_number: i32,
    ) -> GatewayResult<Value> {
        self.authorize_document(ctx, document_id, ProjectRole::Editor)
            .await?;
        self.backends
            .document
            .delete_scene(ctx, document_id, chapter_number, scene_number)
            .await?;
        Ok(Value::Bool(true))
    }

    /// A chapter that cannot be fetched reads as empty, so the first scene
    /// of a fresh chapter lands at ordinal 1.
    async fn next_scene_ordinal(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter_number: i32,
    ) -> i32 {
        match self
            .backends
            .document
            .get_chapter(ctx, document_id, chapter_number)
            .await
        {
            Ok(chapter) => next_ordinal(&chapter, "scenes"),
            Err(e) => {
                tracing::debug!(document_id, chapter_number, error = %e, "scene ordinal defaulting to 1");
                1
            },
        }
    }
}

fn next_ordinal(parent: &Value, key: &str) -> i32 {
    let existing = parent
        .get(key)
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    i32::try_from(existing).map_or(i32::MAX, |n| n.saturating_add(1))
}
