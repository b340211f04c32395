//! AI generation service adapter.
//!
//! The service exposes one endpoint; the request's `type` field selects
//! freeform text, a full scene draft, or a continuation of existing prose.

use async_trait::async_trait;
use serde_json::{Value, json};
use vellum_common::{GatewayResult, RequestContext};

use crate::http::ServiceClient;

/// Discriminator for the generation request's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Text,
    Scene,
    Continue,
}

impl GenerationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Scene => "scene",
            Self::Continue => "continue",
        }
    }
}

#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// `POST /generate` with a `{prompt, context, parameters, type}` body.
    /// `request` carries everything but `type`, which is set from `kind`.
    async fn generate(
        &self,
        ctx: &RequestContext,
        kind: GenerationKind,
        request: Value,
    ) -> GatewayResult<Value>;
}

/// Local token estimate: roughly four characters per token. Good enough for
/// quota previews without a round trip to the AI service.
#[must_use]
pub fn count_tokens(text: &str) -> i32 {
    i32::try_from(text.chars().count().div_ceil(4)).unwrap_or(i32::MAX)
}

pub struct HttpGenerationApi {
    client: ServiceClient,
}

impl HttpGenerationApi {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            client: ServiceClient::new("ai", base_url, http),
        }
    }
}

#[async_trait]
impl GenerationApi for HttpGenerationApi {
    async fn generate(
        &self,
        ctx: &RequestContext,
        kind: GenerationKind,
        mut request: Value,
    ) -> GatewayResult<Value> {
        if let Some(obj) = request.as_object_mut() {
            obj.insert("type".to_string(), json!(kind.as_str()));
        }
        self.client.post("/generate", ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use mockito::Matcher;

    use super::*;

    #[test]
    fn token_count_rounds_up() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("abcd"), 1);
        assert_eq!(count_tokens("abcde"), 2);
        assert_eq!(count_tokens(&"x".repeat(400)), 100);
    }

    #[test]
    fn token_count_uses_characters_not_bytes() {
        // Four code points, six bytes.
        assert_eq!(count_tokens("déjà"), 1);
    }

    #[tokio::test]
    async fn kind_becomes_the_type_discriminator() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generate")
            .match_body(Matcher::Json(json!({
                "prompt": "the tide turned",
                "type": "continue",
            })))
            .with_status(200)
            .with_body(r#"{"generatedText":"and the tide turned.","wordCount":4}"#)
            .create_async()
            .await;

        let api = HttpGenerationApi::new(&server.url(), reqwest::Client::new());
        let value = api
            .generate(
                &RequestContext::anonymous(),
                GenerationKind::Continue,
                json!({"prompt": "the tide turned"}),
            )
            .await
            .unwrap();
        assert_eq!(value["wordCount"], 4);
        mock.assert_async().await;
    }
}
