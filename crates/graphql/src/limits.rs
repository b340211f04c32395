//! Depth and complexity limits enforced before execution.
//!
//! Every incoming operation is priced during the parse phase, so an
//! over-budget query is rejected before any resolver runs and before any
//! upstream service sees traffic. Fragment spreads are priced at the depth
//! of the spread site, and a spread already on the active expansion stack
//! is skipped so cyclic fragments cannot loop the walk.

use std::sync::Arc;

use async_graphql::{
    ErrorExtensionValues, Positioned, ServerError, ServerResult, Variables,
    extensions::{Extension, ExtensionContext, ExtensionFactory, NextParseQuery},
    parser::types::{ExecutableDocument, Selection, SelectionSet},
};
use vellum_common::codes;

/// Measured shape of one parsed request, summed across its operations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryMetrics {
    pub depth: usize,
    pub complexity: f64,
}

/// Per-field pricing policy.
pub trait FieldCost: Send + Sync {
    fn cost(&self, name: &str, depth: usize, arg_count: usize) -> f64;
}

/// Default pricing: deeper and argument-heavy fields cost more, and fields
/// whose name reads like a collection (`documents`, `characterList`) carry
/// a flat surcharge since they typically fan out to many rows upstream.
pub struct PluralFieldCost;

impl FieldCost for PluralFieldCost {
    fn cost(&self, name: &str, depth: usize, arg_count: usize) -> f64 {
        let mut cost = 1.0 + 0.5 * depth as f64 + 0.2 * arg_count as f64;
        if name.ends_with('s') || name.ends_with("List") {
            cost += 10.0;
        }
        cost
    }
}

/// Ceilings applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct GovernorLimits {
    pub max_depth: usize,
    pub max_complexity: f64,
}

impl Default for GovernorLimits {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_complexity: 1000.0,
        }
    }
}

/// Walk a parsed document and price every field it selects.
pub fn analyze(doc: &ExecutableDocument, costs: &dyn FieldCost) -> QueryMetrics {
    let mut walker = Walker {
        doc,
        costs,
        metrics: QueryMetrics::default(),
        active: Vec::new(),
    };
    for (_name, operation) in doc.operations.iter() {
        walker.walk(&operation.node.selection_set, 0);
    }
    walker.metrics
}

struct Walker<'a> {
    doc: &'a ExecutableDocument,
    costs: &'a dyn FieldCost,
    metrics: QueryMetrics,
    active: Vec<&'a str>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, set: &'a Positioned<SelectionSet>, depth: usize) {
        for item in &set.node.items {
            match &item.node {
                Selection::Field(field) => {
                    let node = &field.node;
                    self.metrics.complexity +=
                        self.costs
                            .cost(node.name.node.as_str(), depth, node.arguments.len());
                    self.metrics.depth = self.metrics.depth.max(depth + 1);
                    self.walk(&node.selection_set, depth + 1);
                },
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if self.active.contains(&name) {
                        continue;
                    }
                    // Unresolved spreads price at zero; validation rejects
                    // them after parse.
                    let Some(fragment) = self.doc.fragments.get(name) else {
                        continue;
                    };
                    self.active.push(name);
                    self.walk(&fragment.node.selection_set, depth);
                    self.active.pop();
                },
                Selection::InlineFragment(inline) => {
                    self.walk(&inline.node.selection_set, depth);
                },
            }
        }
    }
}

/// Extension factory enforcing [`GovernorLimits`] on every request.
pub struct QueryGovernor {
    limits: GovernorLimits,
    costs: Arc<dyn FieldCost>,
}

impl QueryGovernor {
    pub fn new(limits: GovernorLimits) -> Self {
        Self::with_costs(limits, Arc::new(PluralFieldCost))
    }

    /// Override the pricing policy, keeping the same ceilings.
    pub fn with_costs(limits: GovernorLimits, costs: Arc<dyn FieldCost>) -> Self {
        Self { limits, costs }
    }
}

impl ExtensionFactory for QueryGovernor {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(GovernorExtension {
            limits: self.limits,
            costs: Arc::clone(&self.costs),
        })
    }
}

struct GovernorExtension {
    limits: GovernorLimits,
    costs: Arc<dyn FieldCost>,
}

#[async_trait::async_trait]
impl Extension for GovernorExtension {
    async fn parse_query(
        &self,
        ctx: &ExtensionContext<'_>,
        query: &str,
        variables: &Variables,
        next: NextParseQuery<'_>,
    ) -> ServerResult<ExecutableDocument> {
        let doc = next.run(ctx, query, variables).await?;
        let metrics = analyze(&doc, self.costs.as_ref());

        if metrics.depth > self.limits.max_depth {
            tracing::warn!(
                depth = metrics.depth,
                max_depth = self.limits.max_depth,
                "rejected query over depth limit"
            );
            return Err(depth_exceeded(metrics.depth, self.limits.max_depth));
        }
        if metrics.complexity > self.limits.max_complexity {
            tracing::warn!(
                complexity = metrics.complexity,
                max_complexity = self.limits.max_complexity,
                "rejected query over complexity limit"
            );
            return Err(complexity_exceeded(
                metrics.complexity,
                self.limits.max_complexity,
            ));
        }
        Ok(doc)
    }
}

fn depth_exceeded(depth: usize, max_depth: usize) -> ServerError {
    let mut err = ServerError::new(format!("Query depth limit of {max_depth} exceeded"), None);
    let mut ext = ErrorExtensionValues::default();
    ext.set("code", codes::DEPTH_LIMIT_EXCEEDED);
    ext.set("depth", depth as u64);
    ext.set("maxDepth", max_depth as u64);
    err.extensions = Some(ext);
    err
}

fn complexity_exceeded(complexity: f64, max_complexity: f64) -> ServerError {
    let mut err = ServerError::new(
        format!("Query complexity of {complexity} exceeds maximum complexity of {max_complexity}"),
        None,
    );
    let mut ext = ErrorExtensionValues::default();
    ext.set("code", codes::QUERY_TOO_COMPLEX);
    ext.set("complexity", complexity);
    ext.set("maxComplexity", max_complexity);
    err.extensions = Some(ext);
    err
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use rstest::rstest;

    use super::*;

    fn metrics_for(src: &str) -> QueryMetrics {
        let doc = async_graphql::parser::parse_query(src).expect("query parses");
        analyze(&doc, &PluralFieldCost)
    }

    #[rstest]
    #[case("{ me }", 1)]
    #[case("{ me { id } }", 2)]
    #[case("{ me { projects { id } } }", 3)]
    fn depth_tracks_selection_nesting(#[case] src: &str, #[case] expected: usize) {
        assert_eq!(metrics_for(src).depth, expected);
    }

    #[test]
    fn plural_names_carry_flat_surcharge() {
        let singular = metrics_for("{ document }").complexity;
        let plural = metrics_for("{ documents }").complexity;
        let suffixed = metrics_for("{ documentList }").complexity;
        assert!((plural - singular - 10.0).abs() < f64::EPSILON);
        assert!((suffixed - singular - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn arguments_price_per_argument() {
        let metrics =
            metrics_for(r#"{ scene(documentId: "d1", chapterNumber: 1, sceneNumber: 2) }"#);
        assert!((metrics.complexity - 1.6).abs() < 1e-9);
    }

    #[test]
    fn nested_fields_price_by_depth() {
        let metrics = metrics_for("{ document { title } }");
        assert!((metrics.complexity - 2.5).abs() < 1e-9);
    }

    #[test]
    fn fragment_spreads_price_at_spread_depth() {
        let metrics = metrics_for(
            "query { document { ...heading } } fragment heading on Document { title }",
        );
        assert_eq!(metrics.depth, 2);
        assert!((metrics.complexity - 2.5).abs() < 1e-9);
    }

    #[test]
    fn cyclic_fragments_terminate() {
        let metrics = metrics_for(
            "query { document { ...loop } } \
             fragment loop on Document { chapter { ...loop } }",
        );
        assert!(metrics.complexity.is_finite());
        assert_eq!(metrics.depth, 2);
    }

    #[test]
    fn unresolved_spreads_price_at_zero() {
        let with_spread = metrics_for("{ me ...missing }");
        let without = metrics_for("{ me }");
        assert!((with_spread.complexity - without.complexity).abs() < f64::EPSILON);
    }

    #[test]
    fn multiple_operations_sum() {
        let metrics = metrics_for("query A { me } query B { document }");
        assert!((metrics.complexity - 2.0).abs() < f64::EPSILON);
        assert_eq!(metrics.depth, 1);
    }
}
