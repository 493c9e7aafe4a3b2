//! Semantic Layer
//!
//! Owns the metadata graph and concept index for one connector. Registration
//! goes through `&mut self` during setup; once the layer is wrapped in an `Arc`
//! it is read-only and shared by concurrent planning calls without locking.

use crate::error::Result;
use crate::semantic::concepts::ConceptIndex;
use crate::semantic::graph::MetadataGraph;
use crate::semantic::join_path::JoinPathResolver;
use crate::semantic::loader::MetadataConfig;
use crate::semantic::model::{BusinessConcept, Metric, Relationship, TableSpec};
use crate::semantic::plan::{DisconnectedJoinPolicy, QueryPlan, QueryPlanBuilder};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SemanticLayer {
    graph: MetadataGraph,
    index: ConceptIndex,
    policy: DisconnectedJoinPolicy,
}

impl SemanticLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: DisconnectedJoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_config(config: MetadataConfig) -> Self {
        let mut layer = Self::new();
        layer.initialize_metadata(config);
        layer
    }

    /// Register everything in `config`: tables, relationships, concepts, then metrics
    pub fn initialize_metadata(&mut self, config: MetadataConfig) {
        let MetadataConfig {
            tables,
            relationships,
            concepts,
            metrics,
        } = config;

        info!(
            "Registering metadata: {} tables, {} relationships, {} concepts, {} metrics",
            tables.len(),
            relationships.len(),
            concepts.len(),
            metrics.len()
        );

        tables.into_iter().for_each(|t| self.register_table(t));
        relationships.into_iter().for_each(|r| self.register_relationship(r));
        concepts.into_iter().for_each(|c| self.register_business_concept(c));
        metrics.into_iter().for_each(|m| self.register_metric(m));
    }

    pub fn register_table(&mut self, spec: TableSpec) {
        self.graph.register_table(spec);
    }

    pub fn register_relationship(&mut self, relationship: Relationship) {
        self.graph.register_relationship(relationship);
    }

    pub fn register_business_concept(&mut self, concept: BusinessConcept) {
        self.index.register_business_concept(concept);
    }

    pub fn register_metric(&mut self, metric: Metric) {
        self.index.register_metric(metric);
    }

    pub fn graph(&self) -> &MetadataGraph {
        &self.graph
    }

    pub fn concepts(&self) -> &ConceptIndex {
        &self.index
    }

    pub fn policy(&self) -> DisconnectedJoinPolicy {
        self.policy
    }

    pub fn get_join_path(&self, source: &str, target: &str) -> Result<Vec<Relationship>> {
        JoinPathResolver::new(&self.graph).get_join_path(source, target)
    }

    pub fn plan_builder(&self) -> QueryPlanBuilder<'_> {
        QueryPlanBuilder::new(&self.index, JoinPathResolver::new(&self.graph)).with_policy(self.policy)
    }

    pub fn analyze_business_question(&self, question: &str) -> Result<QueryPlan> {
        self.plan_builder().analyze_business_question(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::model::{MetricType, RelationshipType};
    use std::sync::Arc;

    #[test]
    fn test_shared_layer_plans_concurrently() {
        let mut layer = SemanticLayer::new();
        layer.register_table(TableSpec::new("orders"));
        layer.register_table(TableSpec::new("customers"));
        layer.register_relationship(Relationship::new(
            "order_customer",
            "orders",
            "customers",
            RelationshipType::OneToMany,
            "customer_id",
            "id",
        ));
        layer.register_business_concept(
            BusinessConcept::new("revenue")
                .with_table("orders", "fact")
                .with_table("customers", "dimension"),
        );
        layer.register_metric(Metric::new("revenue_total", MetricType::Simple, "SUM(orders.amount)"));

        let layer = Arc::new(layer);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let layer = Arc::clone(&layer);
                std::thread::spawn(move || layer.analyze_business_question("revenue_total").unwrap())
            })
            .collect();

        for handle in handles {
            let plan = handle.join().unwrap();
            assert_eq!(plan.tables, vec!["orders", "customers"]);
            assert_eq!(plan.metrics, vec!["revenue_total"]);
            assert_eq!(plan.joins.len(), 1);
        }
    }
}
