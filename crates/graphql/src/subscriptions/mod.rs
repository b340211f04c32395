//! GraphQL subscription resolvers.
//!
//! Subscriptions bridge from the gateway's broadcast bus. Each field
//! filters by topic and the caller's arguments, then deserializes the
//! payload into its typed event; malformed payloads and delivery lag are
//! logged without ending the stream. Every field requires an
//! authenticated caller at registration time.

use std::sync::Arc;

use {
    async_graphql::{Context, Result, Subscription},
    serde::de::DeserializeOwned,
    serde_json::Value,
    tokio::sync::broadcast,
    tokio_stream::Stream,
    vellum_common::RequestContext,
};

use crate::{
    context::{GqlContext, request_context},
    error::gql_err,
    events,
    types::{
        CharacterMemory, CollaboratorEvent, CursorEvent, Document, GenerationProgressEvent,
        PlotMemory, SceneUpdatedEvent,
    },
};

/// Root subscription type.
#[derive(Default)]
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// A document's metadata or structure changed.
    async fn document_updated(
        &self,
        ctx: &Context<'_>,
        document_id: String,
    ) -> Result<impl Stream<Item = Document>> {
        let (mut rx, _) = subscribe_authed(ctx)?;
        Ok(async_stream::stream! {
            while let Some((topic, payload)) = next_event(&mut rx).await {
                if topic == events::DOCUMENT_UPDATED
                    && payload.get("id").and_then(Value::as_str) == Some(document_id.as_str())
                    && let Some(document) = decode::<Document>(payload)
                {
                    yield document;
                }
            }
        })
    }

    /// Scene content changed in a document, including AI write-backs.
    async fn scene_updated(
        &self,
        ctx: &Context<'_>,
        document_id: String,
    ) -> Result<impl Stream<Item = SceneUpdatedEvent>> {
        let (mut rx, _) = subscribe_authed(ctx)?;
        let wanted = events::scene_updated(&document_id);
        Ok(async_stream::stream! {
            while let Some((topic, payload)) = next_event(&mut rx).await {
                if topic == wanted
                    && payload.get("documentId").and_then(Value::as_str)
                        == Some(document_id.as_str())
                    && let Some(event) = decode::<SceneUpdatedEvent>(payload)
                {
                    yield event;
                }
            }
        })
    }

    /// A character's memory record changed.
    async fn character_updated(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        character_id: String,
    ) -> Result<impl Stream<Item = CharacterMemory>> {
        let (mut rx, _) = subscribe_authed(ctx)?;
        Ok(async_stream::stream! {
            while let Some((topic, payload)) = next_event(&mut rx).await {
                if topic == events::CHARACTER_UPDATED
                    && payload.get("projectId").and_then(Value::as_str)
                        == Some(project_id.as_str())
                    && payload.get("characterId").and_then(Value::as_str)
                        == Some(character_id.as_str())
                    && let Some(character) = decode::<CharacterMemory>(payload)
                {
                    yield character;
                }
            }
        })
    }

    /// A plot thread changed.
    async fn plot_updated(
        &self,
        ctx: &Context<'_>,
        project_id: String,
        plot_id: String,
    ) -> Result<impl Stream<Item = PlotMemory>> {
        let (mut rx, _) = subscribe_authed(ctx)?;
        Ok(async_stream::stream! {
            while let Some((topic, payload)) = next_event(&mut rx).await {
                if topic == events::PLOT_UPDATED
                    && payload.get("projectId").and_then(Value::as_str)
                        == Some(project_id.as_str())
                    && payload.get("plotId").and_then(Value::as_str) == Some(plot_id.as_str())
                    && let Some(plot) = decode::<PlotMemory>(payload)
                {
                    yield plot;
                }
            }
        })
    }

    /// Progress of one background generation request, ending with a
    /// terminal status.
    async fn generation_progress(
        &self,
        ctx: &Context<'_>,
        request_id: String,
    ) -> Result<impl Stream<Item = GenerationProgressEvent>> {
        let (mut rx, _) = subscribe_authed(ctx)?;
        let wanted = events::generation_progress(&request_id);
        Ok(async_stream::stream! {
            while let Some((topic, payload)) = next_event(&mut rx).await {
                if topic == wanted
                    && payload.get("requestId").and_then(Value::as_str)
                        == Some(request_id.as_str())
                    && let Some(event) = decode::<GenerationProgressEvent>(payload)
                {
                    yield event;
                }
            }
        })
    }

    /// Someone opened a document for editing.
    async fn collaborator_joined(
        &self,
        ctx: &Context<'_>,
        document_id: String,
    ) -> Result<impl Stream<Item = CollaboratorEvent>> {
        collaborator_stream(ctx, events::COLLABORATOR_JOINED, document_id).await
    }

    /// Someone closed a document.
    async fn collaborator_left(
        &self,
        ctx: &Context<'_>,
        document_id: String,
    ) -> Result<impl Stream<Item = CollaboratorEvent>> {
        collaborator_stream(ctx, events::COLLABORATOR_LEFT, document_id).await
    }

    /// Another collaborator's cursor moved. The caller's own cursor
    /// events are suppressed.
    async fn cursor_moved(
        &self,
        ctx: &Context<'_>,
        document_id: String,
    ) -> Result<impl Stream<Item = CursorEvent>> {
        let (mut rx, identity) = subscribe_authed(ctx)?;
        let viewer = identity.user_id().map(str::to_owned);
        Ok(async_stream::stream! {
            while let Some((topic, payload)) = next_event(&mut rx).await {
                if topic == events::CURSOR_MOVED
                    && payload.get("documentId").and_then(Value::as_str)
                        == Some(document_id.as_str())
                    && payload.get("userId").and_then(Value::as_str) != viewer.as_deref()
                    && let Some(event) = decode::<CursorEvent>(payload)
                {
                    yield event;
                }
            }
        })
    }
}

// ── Shared stream plumbing ──────────────────────────────────────────────────

/// Authenticate the caller and open a bus receiver.
fn subscribe_authed(
    ctx: &Context<'_>,
) -> Result<(broadcast::Receiver<(String, Value)>, RequestContext)> {
    let identity = request_context(ctx);
    identity.require_user().map_err(gql_err)?;
    let c = ctx.data::<Arc<GqlContext>>()?;
    Ok((c.subscribe(), identity))
}

/// Next event from the bus. A lagging subscriber logs how far it fell
/// behind and keeps reading; `None` means the bus closed.
async fn next_event(rx: &mut broadcast::Receiver<(String, Value)>) -> Option<(String, Value)> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "subscription lagged behind the event bus");
            },
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

async fn collaborator_stream(
    ctx: &Context<'_>,
    wanted: &'static str,
    document_id: String,
) -> Result<impl Stream<Item = CollaboratorEvent>> {
    let (mut rx, _) = subscribe_authed(ctx)?;
    Ok(async_stream::stream! {
        while let Some((topic, payload)) = next_event(&mut rx).await {
            if topic == wanted
                && payload.get("documentId").and_then(Value::as_str)
                    == Some(document_id.as_str())
                && let Some(event) = decode::<CollaboratorEvent>(payload)
            {
                yield event;
            }
        }
    })
}

fn decode<T: DeserializeOwned>(payload: Value) -> Option<T> {
    match serde_json::from_value(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed event payload");
            None
        },
    }
}
