//! Memory service adapter: character, plot, and world-building state.
//!
//! Character listing is scoped by the `X-Project-ID` header rather than a
//! query parameter, so [`MemoryApi::characters_for_project`] rescopes the
//! request context to the project named in the operation arguments.

use async_trait::async_trait;
use serde_json::{Value, json};
use vellum_common::{GatewayResult, RequestContext};

use crate::http::ServiceClient;

#[async_trait]
pub trait MemoryApi: Send + Sync {
    async fn create_character(&self, ctx: &RequestContext, body: Value) -> GatewayResult<Value>;
    async fn characters_for_project(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value>;
    async fn character(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value>;
    async fn update_character_state(
        &self,
        ctx: &RequestContext,
        id: &str,
        state: Value,
    ) -> GatewayResult<Value>;
    async fn add_observation(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn character_timeline(
        &self,
        ctx: &RequestContext,
        id: &str,
        limit: Option<i32>,
    ) -> GatewayResult<Value>;

    async fn create_plot(&self, ctx: &RequestContext, body: Value) -> GatewayResult<Value>;
    async fn plots_for_project(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value>;
    async fn plot(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
    ) -> GatewayResult<Value>;
    async fn add_plot_point(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn add_milestone(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        milestone: Value,
    ) -> GatewayResult<Value>;
    async fn update_tension(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        chapter_number: i32,
        tension_level: f64,
    ) -> GatewayResult<Value>;

    async fn world(&self, ctx: &RequestContext, project_id: &str) -> GatewayResult<Value>;
    async fn add_world_fact(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        category: &str,
        fact: &Value,
    ) -> GatewayResult<Value>;
    async fn add_location(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        body: Value,
    ) -> GatewayResult<Value>;
    async fn location(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        location_id: &str,
    ) -> GatewayResult<Value>;
    async fn validate_consistency(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value>;

    async fn story_context(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        scene_id: &str,
        chapter: i32,
        scene: i32,
    ) -> GatewayResult<Value>;
    async fn search(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        query: &str,
        kind: Option<&str>,
    ) -> GatewayResult<Value>;
}

pub struct HttpMemoryApi {
    client: ServiceClient,
}

impl HttpMemoryApi {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            client: ServiceClient::new("memory", base_url, http),
        }
    }
}

#[async_trait]
impl MemoryApi for HttpMemoryApi {
    async fn create_character(&self, ctx: &RequestContext, body: Value) -> GatewayResult<Value> {
        self.client.post("/memory/characters", ctx, body).await
    }

    async fn characters_for_project(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        let scoped = ctx.with_project(project_id);
        self.client.get("/memory/characters", &scoped).await
    }

    async fn character(&self, ctx: &RequestContext, id: &str) -> GatewayResult<Value> {
        self.client.get(&format!("/memory/characters/{id}"), ctx).await
    }

    async fn update_character_state(
        &self,
        ctx: &RequestContext,
        id: &str,
        state: Value,
    ) -> GatewayResult<Value> {
        self.client
            .put(&format!("/memory/characters/{id}/state"), ctx, state)
            .await
    }

    async fn add_observation(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client
            .post(&format!("/memory/characters/{id}/observations"), ctx, body)
            .await
    }

    async fn character_timeline(
        &self,
        ctx: &RequestContext,
        id: &str,
        limit: Option<i32>,
    ) -> GatewayResult<Value> {
        let path = match limit {
            Some(limit) => format!("/memory/characters/{id}/timeline?limit={limit}"),
            None => format!("/memory/characters/{id}/timeline"),
        };
        self.client.get(&path, ctx).await
    }

    async fn create_plot(&self, ctx: &RequestContext, body: Value) -> GatewayResult<Value> {
        self.client.post("/memory/plot", ctx, body).await
    }

    async fn plots_for_project(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        self.client.get(&format!("/memory/plot/{project_id}"), ctx).await
    }

    async fn plot(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
    ) -> GatewayResult<Value> {
        self.client
            .get(&format!("/memory/plot/{project_id}/{plot_id}"), ctx)
            .await
    }

    async fn add_plot_point(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client
            .post(
                &format!("/memory/plot/{project_id}/threads/{plot_id}/points"),
                ctx,
                body,
            )
            .await
    }

    async fn add_milestone(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        milestone: Value,
    ) -> GatewayResult<Value> {
        self.client
            .post(
                &format!("/memory/plot/{project_id}/milestones"),
                ctx,
                json!({ "plotId": plot_id, "milestone": milestone }),
            )
            .await
    }

    async fn update_tension(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        chapter_number: i32,
        tension_level: f64,
    ) -> GatewayResult<Value> {
        self.client
            .put(
                &format!("/memory/plot/{project_id}/threads/{plot_id}/tension"),
                ctx,
                json!({ "chapterNumber": chapter_number, "tensionLevel": tension_level }),
            )
            .await
    }

    async fn world(&self, ctx: &RequestContext, project_id: &str) -> GatewayResult<Value> {
        self.client.get(&format!("/memory/world/{project_id}"), ctx).await
    }

    async fn add_world_fact(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        category: &str,
        fact: &Value,
    ) -> GatewayResult<Value> {
        self.client
            .post(
                &format!("/memory/world/{project_id}/facts"),
                ctx,
                json!({ "category": category, "fact": fact }),
            )
            .await
    }

    async fn add_location(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.client
            .post(&format!("/memory/world/{project_id}/locations"), ctx, body)
            .await
    }

    async fn location(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        location_id: &str,
    ) -> GatewayResult<Value> {
        self.client
            .get(&format!("/memory/world/{project_id}/locations/{location_id}"), ctx)
            .await
    }

    async fn validate_consistency(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        self.client
            .post(&format!("/memory/world/{project_id}/validate"), ctx, json!({}))
            .await
    }

    async fn story_context(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        scene_id: &str,
        chapter: i32,
        scene: i32,
    ) -> GatewayResult<Value> {
        self.client
            .get(
                &format!("/memory/context/{project_id}/{scene_id}?chapter={chapter}&scene={scene}"),
                ctx,
            )
            .await
    }

    async fn search(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        query: &str,
        kind: Option<&str>,
    ) -> GatewayResult<Value> {
        let mut body = json!({ "projectId": project_id, "query": query });
        if let Some(kind) = kind {
            body["type"] = json!(kind);
        }
        self.client.post("/memory/search", ctx, body).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn character_listing_is_scoped_by_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/memory/characters")
            .match_header("x-project-id", "proj-override")
            .with_status(200)
            .with_body(r#"[{"id":"c1"}]"#)
            .create_async()
            .await;

        let ctx = RequestContext::anonymous().with_project("proj-from-request");
        let api = HttpMemoryApi::new(&server.url(), reqwest::Client::new());
        let value = api
            .characters_for_project(&ctx, "proj-override")
            .await
            .unwrap();
        assert_eq!(value[0]["id"], "c1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn timeline_query_param_only_sent_when_limited() {
        let mut server = mockito::Server::new_async().await;
        let unbounded = server
            .mock("GET", "/memory/characters/c1/timeline")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let bounded = server
            .mock("GET", "/memory/characters/c1/timeline?limit=25")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let ctx = RequestContext::anonymous();
        let api = HttpMemoryApi::new(&server.url(), reqwest::Client::new());
        api.character_timeline(&ctx, "c1", None).await.unwrap();
        api.character_timeline(&ctx, "c1", Some(25)).await.unwrap();
        unbounded.assert_async().await;
        bounded.assert_async().await;
    }

    #[tokio::test]
    async fn milestone_payload_wraps_plot_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/memory/plot/p1/milestones")
            .match_body(Matcher::Json(json!({
                "plotId": "thread-1",
                "milestone": { "name": "betrayal", "chapter": 12 },
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let api = HttpMemoryApi::new(&server.url(), reqwest::Client::new());
        api.add_milestone(
            &RequestContext::anonymous(),
            "p1",
            "thread-1",
            json!({ "name": "betrayal", "chapter": 12 }),
        )
        .await
        .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn search_omits_type_when_unset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/memory/search")
            .match_body(Matcher::Json(json!({
                "projectId": "p1",
                "query": "lighthouse",
            })))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let api = HttpMemoryApi::new(&server.url(), reqwest::Client::new());
        api.search(&RequestContext::anonymous(), "p1", "lighthouse", None)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn story_context_carries_ordinals_in_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/memory/context/p1/scene-4?chapter=2&scene=4")
            .with_status(200)
            .with_body(r#"{"summary":"storm rising"}"#)
            .create_async()
            .await;

        let api = HttpMemoryApi::new(&server.url(), reqwest::Client::new());
        let value = api
            .story_context(&RequestContext::anonymous(), "p1", "scene-4", 2, 4)
            .await
            .unwrap();
        assert_eq!(value["summary"], "storm rising");
        mock.assert_async().await;
    }
}
