//! Document service adapter: documents, chapters, and scenes.
//!
//! Chapters and scenes are addressed by ordinal within their parent, not by
//! id; the route shapes below are the service's contract.

use async_trait::async_trait;
use serde_json::Value;
use vellum_common::{GatewayResult, RequestContext};

use crate::http::ServiceClient;

#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn get_document(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value>;
    async fn create_document(&self, ctx: &RequestContext, body: Value) -> GatewayResult<Value>;
    async fn update_document(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn delete_document(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value>;
    async fn list_documents(&self, ctx: &RequestContext, project_id: &str)
    -> GatewayResult<Value>;

    async fn get_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
    ) -> GatewayResult<Value>;
    async fn create_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn update_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn delete_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
    ) -> GatewayResult<Value>;

    async fn get_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
    ) -> GatewayResult<Value>;
    async fn create_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn update_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn delete_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
    ) -> GatewayResult<Value>;
}

pub struct HttpDocumentApi {
    client: ServiceClient,
}

impl HttpDocumentApi {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            client: ServiceClient::new("document", base_url, http),
        }
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn get_document(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value> {
        self.client.get(&format!("/document/{id}"), ctx).await
    }

    async fn create_document(&self, ctx: &RequestContext, body: Value) -> GatewayResult<Value> {
        self.client.post("/document", ctx, body).await
    }

    async fn update_document(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client.put(&format!("/document/{id}"), ctx, body).await
    }

    async fn delete_document(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value> {
        self.client.delete(&format!("/document/{id}"), ctx).await
    }

    async fn list_documents(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        self.client
            .get(&format!("/documents?projectId={project_id}"), ctx)
            .await
    }

    async fn get_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
    ) -> GatewayResult<Value> {
        self.client
            .get(&format!("/chapter/{document_id}/{chapter}"), ctx)
            .await
    }

    async fn create_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client
            .post(&format!("/chapter/{document_id}/{chapter}"), ctx, body)
            .await
    }

    async fn update_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client
            .put(&format!("/chapter/{document_id}/{chapter}"), ctx, body)
            .await
    }

    async fn delete_chapter(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
    ) -> GatewayResult<Value> {
        self.client
            .delete(&format!("/chapter/{document_id}/{chapter}"), ctx)
            .await
    }

    async fn get_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
    ) -> GatewayResult<Value> {
        self.client
            .get(&format!("/scene/{document_id}/{chapter}/{scene}"), ctx)
            .await
    }

    async fn create_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client
            .post(&format!("/scene/{document_id}/{chapter}/{scene}"), ctx, body)
            .await
    }

    async fn update_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client
            .put(&format!("/scene/{document_id}/{chapter}/{scene}"), ctx, body)
            .await
    }

    async fn delete_scene(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        chapter: i32,
        scene: i32,
    ) -> GatewayResult<Value> {
        self.client
            .delete(&format!("/scene/{document_id}/{chapter}/{scene}"), ctx)
            .await
    }
}
