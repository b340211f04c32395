//! Memory operations: characters, plots, and world state.
//!
//! Listing queries degrade to empty collections when the memory service is
//! unreachable, so a story dashboard renders without its sidebars instead
//! of failing whole-page. Single-record lookups and writes propagate
//! errors.
//!
//! The memory service speaks an older thread dialect for plots
//! (`threadName`, `premise`, `centralConflict`, milestones). Every plot
//! that leaves this module is normalized onto the public shape first.

use serde_json::{Map, Value, json};
use vellum_common::{GatewayResult, ProjectRole, RequestContext};

use super::{Ops, now_iso};

impl Ops {
    // ── Characters ──────────────────────────────────────────────────────

    pub async fn create_character(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        self.backends.memory.create_character(ctx, body).await
    }

    pub async fn character(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        character_id: &str,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        self.backends.memory.character(ctx, character_id).await
    }

    pub async fn characters(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        match self
            .backends
            .memory
            .characters_for_project(ctx, project_id)
            .await
        {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(project_id, error = %e, "character listing unavailable, returning empty");
                Ok(json!([]))
            },
        }
    }

    pub async fn update_character_state(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        character_id: &str,
        state: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        self.backends
            .memory
            .update_character_state(ctx, character_id, state)
            .await
    }

    pub async fn add_observation(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        character_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        self.backends
            .memory
            .add_observation(ctx, character_id, body)
            .await
    }

    pub async fn character_timeline(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        character_id: &str,
        limit: Option<i32>,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        self.backends
            .memory
            .character_timeline(ctx, character_id, limit)
            .await
    }

    // ── Plots ───────────────────────────────────────────────────────────

    pub async fn create_plot(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        let mut value = self.backends.memory.create_plot(ctx, body).await?;
        normalize_plot(&mut value);
        Ok(value)
    }

    pub async fn plot(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        let mut value = self.backends.memory.plot(ctx, project_id, plot_id).await?;
        normalize_plot(&mut value);
        Ok(value)
    }

    pub async fn plots(&self, ctx: &RequestContext, project_id: &str) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        let mut value = self.plots_or_empty(ctx, project_id).await;
        normalize_plots(&mut value);
        Ok(value)
    }

    /// The main plot is the thread flagged `MAIN` by the memory service.
    pub async fn main_plot(&self, ctx: &RequestContext, project_id: &str) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        let plots = self.plots_or_empty(ctx, project_id).await;
        let Some(mut plot) = find_main_thread(&plots).cloned() else {
            return Ok(Value::Null);
        };
        normalize_plot(&mut plot);
        Ok(plot)
    }

    /// Threads that are neither completed nor in resolution.
    pub async fn active_plots(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        let plots = self.plots_or_empty(ctx, project_id).await;
        let mut active: Vec<Value> = plots
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter(|plot| {
                        let status = plot.get("status").and_then(Value::as_str).unwrap_or_default();
                        status != "COMPLETED" && status != "RESOLUTION"
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for plot in &mut active {
            normalize_plot(plot);
        }
        Ok(Value::Array(active))
    }

    pub async fn add_plot_point(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        let mut value = self
            .backends
            .memory
            .add_plot_point(ctx, project_id, plot_id, body)
            .await?;
        normalize_plot(&mut value);
        Ok(value)
    }

    pub async fn add_plot_milestone(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        milestone: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        let mut value = self
            .backends
            .memory
            .add_milestone(ctx, project_id, plot_id, milestone)
            .await?;
        normalize_plot(&mut value);
        Ok(value)
    }

    pub async fn update_plot_tension(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        plot_id: &str,
        chapter_number: i32,
        tension_level: f64,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        let mut value = self
            .backends
            .memory
            .update_tension(ctx, project_id, plot_id, chapter_number, tension_level)
            .await?;
        normalize_plot(&mut value);
        Ok(value)
    }

    // ── World ───────────────────────────────────────────────────────────

    pub async fn world_memory(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        self.backends.memory.world(ctx, project_id).await
    }

    /// Flatten fact records across world categories, optionally keeping a
    /// single category.
    pub async fn world_facts(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        category: Option<&str>,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        let memories = self.backends.memory.world(ctx, project_id).await?;

        let mut facts: Vec<Value> = Vec::new();
        if let Some(records) = memories.as_array() {
            for record in records {
                let record_category = record.get("category").and_then(Value::as_str);
                if category.is_none_or(|want| record_category == Some(want)) {
                    if let Some(items) = record.get("facts").and_then(Value::as_array) {
                        facts.extend(items.iter().cloned());
                    }
                }
            }
        }
        Ok(Value::Array(facts))
    }

    pub async fn add_world_fact(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        category: &str,
        fact: &Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        self.backends
            .memory
            .add_world_fact(ctx, project_id, category, fact)
            .await
    }

    pub async fn add_location(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        body: Value,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Editor)?;
        self.backends.memory.add_location(ctx, project_id, body).await
    }

    pub async fn location(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        location_id: &str,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        self.backends
            .memory
            .location(ctx, project_id, location_id)
            .await
    }

    pub async fn validate_world_consistency(
        &self,
        ctx: &RequestContext,
        project_id: &str,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        self.backends.memory.validate_consistency(ctx, project_id).await
    }

    // ── Context & search ────────────────────────────────────────────────

    pub async fn generation_context(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        scene_id: &str,
        chapter_number: i32,
        scene_number: i32,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        let mut value = self
            .backends
            .memory
            .story_context(ctx, project_id, scene_id, chapter_number, scene_number)
            .await?;
        if let Some(plots) = value.get_mut("activePlots") {
            normalize_plots(plots);
        }
        Ok(value)
    }

    pub async fn search_memory(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        query: &str,
        kind: Option<&str>,
    ) -> GatewayResult<Value> {
        self.authorize_project(ctx, project_id, ProjectRole::Viewer)?;
        self.backends.memory.search(ctx, project_id, query, kind).await
    }

    // ── Shared helpers ──────────────────────────────────────────────────

    pub(crate) async fn plots_or_empty(&self, ctx: &RequestContext, project_id: &str) -> Value {
        match self.backends.memory.plots_for_project(ctx, project_id).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(project_id, error = %e, "plot listing unavailable, returning empty");
                json!([])
            },
        }
    }
}

pub(crate) fn find_main_thread(plots: &Value) -> Option<&Value> {
    plots.as_array()?.iter().find(|plot| {
        plot.get("threadType").and_then(Value::as_str) == Some("MAIN")
    })
}

pub(crate) fn normalize_plots(value: &mut Value) {
    if let Some(items) = value.as_array_mut() {
        for plot in items {
            normalize_plot(plot);
        }
    }
}

/// Map a thread record onto the public plot shape in place.
///
/// Fallback order follows the service's own precedence: `threadName` over
/// `title`, `premise` over `description`, `centralConflict` over
/// `storyArc`. Raw keys stay on the record; the typed layer ignores them.
pub(crate) fn normalize_plot(plot: &mut Value) {
    let now = now_iso();
    let Some(obj) = plot.as_object_mut() else {
        return;
    };

    let title = coalesce_str(obj, &["threadName", "title"])
        .unwrap_or_else(|| "Untitled Plot".to_owned());
    let description = coalesce_str(obj, &["premise", "description"]).unwrap_or_default();
    let story_arc = coalesce_str(obj, &["centralConflict", "storyArc"]).unwrap_or_default();

    if is_absent(obj.get("currentState")) {
        let state = json!({
            "status": coalesce_str(obj, &["status"]).unwrap_or_else(|| "SETUP".to_owned()),
            "tensionLevel": obj.get("tensionLevel").and_then(Value::as_f64).unwrap_or(0.0),
            "lastUpdated": coalesce_str(obj, &["updatedAt"]).unwrap_or(now),
        });
        obj.insert("currentState".to_owned(), state);
    }

    if is_absent(obj.get("keyMoments")) {
        let moments: Vec<Value> = obj
            .get("milestones")
            .and_then(Value::as_array)
            .map(|milestones| milestones.iter().map(milestone_to_moment).collect())
            .unwrap_or_default();
        obj.insert("keyMoments".to_owned(), Value::Array(moments));
    }

    if is_absent(obj.get("conflicts")) {
        let central = coalesce_str(obj, &["centralConflict"]).unwrap_or_default();
        obj.insert(
            "conflicts".to_owned(),
            json!([{
                "type": "CENTRAL",
                "description": central,
                "resolved": false,
                "resolution": Value::Null,
            }]),
        );
    }

    for key in ["involvedCharacters", "relatedSubplots", "foreshadowing"] {
        if is_absent(obj.get(key)) {
            obj.insert(key.to_owned(), json!([]));
        }
    }
    if is_absent(obj.get("metadata")) {
        obj.insert("metadata".to_owned(), json!({}));
    }

    obj.insert("title".to_owned(), Value::String(title));
    obj.insert("description".to_owned(), Value::String(description));
    obj.insert("storyArc".to_owned(), Value::String(story_arc));
}

fn milestone_to_moment(milestone: &Value) -> Value {
    json!({
        "momentId": milestone.get("milestoneId").cloned().unwrap_or(Value::Null),
        "chapterNumber": milestone.get("chapterNumber").cloned().unwrap_or(Value::Null),
        "sceneNumber": 0,
        "momentType": "MILESTONE",
        "description": milestone.get("description").cloned().unwrap_or(Value::Null),
        "impact": milestone.get("impact").cloned().unwrap_or(Value::Null),
        "timestamp": milestone.get("achievedAt").cloned().unwrap_or(Value::Null),
    })
}

/// First key holding a non-empty string.
fn coalesce_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    })
}

fn is_absent(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_null)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn thread_dialect_maps_onto_plot_shape() {
        let mut plot = json!({
            "plotId": "pl-1",
            "projectId": "p1",
            "threadName": "The Betrayal",
            "premise": "An ally turns",
            "centralConflict": "Loyalty against survival",
            "status": "RISING",
            "tensionLevel": 6.5,
            "updatedAt": "2025-04-01T00:00:00.000Z",
            "milestones": [
                {
                    "milestoneId": "m1",
                    "chapterNumber": 3,
                    "description": "The letter is found",
                    "impact": "HIGH",
                    "achievedAt": "2025-04-02T00:00:00.000Z",
                },
            ],
        });
        normalize_plot(&mut plot);

        assert_eq!(plot["title"], "The Betrayal");
        assert_eq!(plot["description"], "An ally turns");
        assert_eq!(plot["storyArc"], "Loyalty against survival");
        assert_eq!(plot["currentState"]["status"], "RISING");
        assert_eq!(plot["currentState"]["tensionLevel"], 6.5);
        assert_eq!(plot["currentState"]["lastUpdated"], "2025-04-01T00:00:00.000Z");
        assert_eq!(plot["keyMoments"][0]["momentId"], "m1");
        assert_eq!(plot["keyMoments"][0]["sceneNumber"], 0);
        assert_eq!(plot["keyMoments"][0]["momentType"], "MILESTONE");
        assert_eq!(plot["keyMoments"][0]["timestamp"], "2025-04-02T00:00:00.000Z");
        assert_eq!(plot["conflicts"][0]["type"], "CENTRAL");
        assert_eq!(plot["conflicts"][0]["description"], "Loyalty against survival");
        assert_eq!(plot["conflicts"][0]["resolved"], false);
        assert_eq!(plot["involvedCharacters"], json!([]));
        assert_eq!(plot["metadata"], json!({}));
        // Raw dialect keys survive for callers that still read them.
        assert_eq!(plot["threadName"], "The Betrayal");
    }

    #[test]
    fn normalized_records_pass_through_untouched() {
        let mut plot = json!({
            "plotId": "pl-2",
            "title": "A Quiet Arc",
            "description": "Already public shape",
            "storyArc": "Small stakes",
            "currentState": { "status": "ACTIVE", "tensionLevel": 2.0, "lastUpdated": "x" },
            "keyMoments": [],
            "conflicts": [{ "type": "internal", "description": "doubt", "resolved": true }],
        });
        let before = plot.clone();
        normalize_plot(&mut plot);

        assert_eq!(plot["title"], before["title"]);
        assert_eq!(plot["currentState"], before["currentState"]);
        assert_eq!(plot["keyMoments"], json!([]));
        assert_eq!(plot["conflicts"], before["conflicts"]);
    }

    #[test]
    fn bare_thread_gets_full_defaults() {
        let mut plot = json!({ "plotId": "pl-3" });
        normalize_plot(&mut plot);

        assert_eq!(plot["title"], "Untitled Plot");
        assert_eq!(plot["description"], "");
        assert_eq!(plot["storyArc"], "");
        assert_eq!(plot["currentState"]["status"], "SETUP");
        assert_eq!(plot["currentState"]["tensionLevel"], 0.0);
        assert!(plot["currentState"]["lastUpdated"].as_str().is_some());
        assert_eq!(plot["keyMoments"], json!([]));
        assert_eq!(plot["conflicts"][0]["description"], "");
        assert_eq!(plot["foreshadowing"], json!([]));
    }

    #[test]
    fn main_thread_matches_raw_thread_type() {
        let plots = json!([
            { "plotId": "a", "threadType": "SUBPLOT" },
            { "plotId": "b", "threadType": "MAIN" },
        ]);
        let found = find_main_thread(&plots).unwrap();
        assert_eq!(found["plotId"], "b");
        assert!(find_main_thread(&json!([])).is_none());
    }
}
