//! Generation operations: text drafts, scene drafts, and continuations.
//!
//! Scene drafting runs in the background. The mutation returns an
//! in-progress receipt immediately; the draft task reports through a
//! request-scoped progress topic and finishes with exactly one terminal
//! event. Scene write-back and milestone recording are best effort and
//! never turn a finished draft into a failure.

use std::sync::Arc;

use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use serde_json::{Value, json};
use vellum_backends::{GenerationKind, count_tokens};
use vellum_common::{GatewayResult, ProjectRole, RequestContext};

use super::{Ops, memory::find_main_thread, now_iso};
use crate::{
    events,
    inputs::{ContinueWritingInput, GenerateSceneInput, GenerateTextInput, to_body},
};

/// Model name reported to clients until the AI service starts returning one.
pub(crate) const GENERATION_MODEL: &str = "gemini-pro";

impl Ops {
    /// One-shot prose generation. Blocks until the AI service answers.
    pub async fn generate_text(
        &self,
        ctx: &RequestContext,
        input: GenerateTextInput,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, &input.project_id, ProjectRole::Editor)?;
        let ctx = ctx.with_project(input.project_id.as_str());

        let request = to_body(&input)?;
        let mut response = self
            .backends
            .generation
            .generate(&ctx, GenerationKind::Text, request)
            .await?;
        fill_usage_counts(&mut response);

        match response.get("requestId").and_then(Value::as_str) {
            Some(request_id) if !request_id.is_empty() => {
                self.events.publish(
                    events::generation_progress(request_id),
                    progress_event(request_id, 100, "COMPLETED"),
                );
            },
            _ => {
                tracing::warn!("generation response missing requestId, skipping progress event");
            },
        }
        Ok(response)
    }

    /// Kick off a scene draft and return a receipt immediately.
    ///
    /// The caller subscribes to generation progress with the returned
    /// `requestId` to follow the draft.
    pub async fn generate_scene(
        self: &Arc<Self>,
        ctx: &RequestContext,
        input: GenerateSceneInput,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, &input.project_id, ProjectRole::Editor)?;

        let request_id = new_request_id();
        let parameters = input
            .parameters
            .clone()
            .map(|p| p.0)
            .unwrap_or_else(|| json!({}));

        let ops = Arc::clone(self);
        let task_ctx = ctx.with_project(input.project_id.as_str());
        let task_id = request_id.clone();
        self.spawner.spawn(Box::pin(async move {
            ops.run_scene_draft(task_ctx, task_id, input).await;
        }));

        Ok(json!({
            "requestId": request_id,
            "status": "IN_PROGRESS",
            "generatedText": "",
            "wordCount": 0,
            "tokensUsed": 0,
            "model": GENERATION_MODEL,
            "parameters": parameters,
        }))
    }

    /// Extend an existing scene with AI-written prose.
    ///
    /// The scene is fetched before the AI call so a bad address fails fast
    /// instead of burning generation quota, and so the service sees the
    /// current text it is continuing from.
    pub async fn continue_writing(
        &self,
        ctx: &RequestContext,
        input: ContinueWritingInput,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, &input.project_id, ProjectRole::Editor)?;
        let ctx = ctx.with_project(input.project_id.as_str());

        let scene = self
            .backends
            .document
            .get_scene(&ctx, &input.document_id, input.chapter_number, input.scene_number)
            .await?;
        let current = scene
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let mut request = to_body(&input)?;
        request["currentContent"] = Value::String(current.clone());
        let mut response = self
            .backends
            .generation
            .generate(&ctx, GenerationKind::Continue, request)
            .await?;
        fill_usage_counts(&mut response);

        let generated = response
            .get("generatedText")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if generated.is_empty() {
            return Ok(response);
        }

        let appended = format!("{current} {generated}");
        self.backends
            .document
            .update_scene(
                &ctx,
                &input.document_id,
                input.chapter_number,
                input.scene_number,
                json!({ "content": appended }),
            )
            .await?;
        self.events.publish(
            events::scene_updated(&input.document_id),
            json!({
                "documentId": input.document_id,
                "chapterNumber": input.chapter_number,
                "sceneNumber": input.scene_number,
                "content": appended,
            }),
        );
        Ok(response)
    }

    // ── Background draft task ───────────────────────────────────────────

    async fn run_scene_draft(
        self: Arc<Self>,
        ctx: RequestContext,
        request_id: String,
        input: GenerateSceneInput,
    ) {
        let topic = events::generation_progress(&request_id);
        self.events
            .publish(topic.clone(), progress_event(&request_id, 0, "IN_PROGRESS"));

        let mut request = match to_body(&input) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(request_id, error = %e, "scene draft request could not be encoded");
                self.events
                    .publish(topic, progress_event(&request_id, 0, "FAILED"));
                return;
            },
        };
        if let Some(context) = self.scene_context(&ctx, &input).await {
            request["context"] = context;
        }

        let response = match self
            .backends
            .generation
            .generate(&ctx, GenerationKind::Scene, request)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(request_id, error = %e, "scene draft failed");
                self.events
                    .publish(topic, progress_event(&request_id, 0, "FAILED"));
                return;
            },
        };

        let generated = response
            .get("generatedText")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !generated.is_empty() {
            self.write_back_scene(&ctx, &input, generated).await;
            self.record_draft_milestone(&ctx, &input).await;
        }

        self.events
            .publish(topic, progress_event(&request_id, 100, "COMPLETED"));
    }

    /// Assemble memory context for the draft. Missing scenes or an offline
    /// memory service degrade to a context-free generation.
    async fn scene_context(
        &self,
        ctx: &RequestContext,
        input: &GenerateSceneInput,
    ) -> Option<Value> {
        let scene = match self
            .backends
            .document
            .get_scene(ctx, &input.document_id, input.chapter_number, input.scene_number)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "scene lookup failed, generating without story context");
                return None;
            },
        };
        let scene_id = scene
            .get("id")
            .or_else(|| scene.get("sceneId"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| {
                format!(
                    "{}-{}-{}",
                    input.document_id, input.chapter_number, input.scene_number
                )
            });

        match self
            .backends
            .memory
            .story_context(
                ctx,
                &input.project_id,
                &scene_id,
                input.chapter_number,
                input.scene_number,
            )
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "story context unavailable, generating without it");
                None
            },
        }
    }

    async fn write_back_scene(
        &self,
        ctx: &RequestContext,
        input: &GenerateSceneInput,
        content: &str,
    ) {
        let update = self
            .backends
            .document
            .update_scene(
                ctx,
                &input.document_id,
                input.chapter_number,
                input.scene_number,
                json!({ "content": content }),
            )
            .await;
        match update {
            Ok(_) => {
                self.events.publish(
                    events::scene_updated(&input.document_id),
                    json!({
                        "documentId": input.document_id,
                        "chapterNumber": input.chapter_number,
                        "sceneNumber": input.scene_number,
                        "content": content,
                    }),
                );
            },
            Err(e) => {
                tracing::warn!(error = %e, "scene write-back failed, skipping scene event");
            },
        }
    }

    /// Note the draft on the main plot thread, when one exists.
    async fn record_draft_milestone(&self, ctx: &RequestContext, input: &GenerateSceneInput) {
        let plots = self.plots_or_empty(ctx, &input.project_id).await;
        let Some(plot_id) = find_main_thread(&plots)
            .and_then(|plot| plot.get("plotId"))
            .and_then(Value::as_str)
        else {
            return;
        };

        let milestone = json!({
            "chapterNumber": input.chapter_number,
            "description": format!(
                "Generated scene {} of chapter {}",
                input.scene_number, input.chapter_number
            ),
            "achievedAt": now_iso(),
        });
        if let Err(e) = self
            .backends
            .memory
            .add_milestone(ctx, &input.project_id, plot_id, milestone)
            .await
        {
            tracing::warn!(error = %e, "draft milestone not recorded");
        }
    }
}

fn progress_event(request_id: &str, progress: i32, status: &str) -> Value {
    json!({
        "requestId": request_id,
        "progress": progress,
        "status": status,
    })
}

/// Derive `wordCount` and `tokensUsed` from the generated text when the AI
/// service leaves them out. Tokens use the four-characters-per-token
/// approximation.
fn fill_usage_counts(response: &mut Value) {
    let text = response
        .get("generatedText")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    if text.is_empty() {
        return;
    }
    let Some(fields) = response.as_object_mut() else {
        return;
    };
    if fields.get("wordCount").and_then(Value::as_i64).unwrap_or(0) == 0 {
        let words = i32::try_from(text.split_whitespace().count()).unwrap_or(i32::MAX);
        fields.insert("wordCount".to_owned(), json!(words));
    }
    if fields.get("tokensUsed").and_then(Value::as_i64).unwrap_or(0) == 0 {
        fields.insert("tokensUsed".to_owned(), json!(count_tokens(&text)));
    }
}

fn new_request_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("scene_{}_{suffix}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn request_ids_carry_prefix_timestamp_and_suffix() {
        let id = new_request_id();
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts[0], "scene");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 9);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn progress_events_name_the_request() {
        let event = progress_event("req-9", 100, "COMPLETED");
        assert_eq!(event["requestId"], "req-9");
        assert_eq!(event["progress"], 100);
        assert_eq!(event["status"], "COMPLETED");
    }

    #[test]
    fn missing_usage_counts_come_from_the_text() {
        let mut response =
            json!({ "generatedText": "Seven words of freshly generated prose here." });
        fill_usage_counts(&mut response);
        assert_eq!(response["wordCount"], 7);
        assert_eq!(response["tokensUsed"], 11);
    }

    #[test]
    fn service_usage_counts_are_kept() {
        let mut response = json!({
            "generatedText": "brief",
            "wordCount": 120,
            "tokensUsed": 480,
        });
        fill_usage_counts(&mut response);
        assert_eq!(response["wordCount"], 120);
        assert_eq!(response["tokensUsed"], 480);
    }

    #[test]
    fn empty_generations_stay_uncounted() {
        let mut response = json!({ "generatedText": "", "status": "FAILED" });
        fill_usage_counts(&mut response);
        assert!(response.get("wordCount").is_none());
        assert!(response.get("tokensUsed").is_none());
    }
}
