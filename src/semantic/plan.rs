//! Query Plan Builder
//!
//! Turns a business question into the concepts, metrics, tables, joins and
//! filters needed to answer it:
//!
//! 1. Resolve concepts and metrics through the concept index.
//! 2. Add each concept's tables (first-seen order) and append its filters.
//! 3. Add each metric dependency's table.
//! 4. Resolve a join path between every consecutive pair of tables and append
//!    its edges. Edges repeated across pairs are kept as-is.
//!
//! A pair with no connecting path is governed by [`DisconnectedJoinPolicy`].

use crate::error::{AnalystError, Result};
use crate::semantic::concepts::{ConceptIndex, KeywordMatcher, RelevanceMatcher};
use crate::semantic::join_path::JoinPathResolver;
use crate::semantic::model::Relationship;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// What to do when two consecutive plan tables are not connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectedJoinPolicy {
    /// The pair contributes no joins and is recorded in `unresolved_pairs`
    #[default]
    Omit,
    /// Plan assembly fails with `PartialPlan`
    Reject,
}

impl FromStr for DisconnectedJoinPolicy {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "omit" => Ok(DisconnectedJoinPolicy::Omit),
            "reject" => Ok(DisconnectedJoinPolicy::Reject),
            other => Err(AnalystError::Config(format!(
                "Unknown disconnected join policy: {}",
                other
            ))),
        }
    }
}

/// Tables, joins and filters needed to answer one question
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryPlan {
    pub concepts: Vec<String>,
    pub metrics: Vec<String>,
    /// Insertion-ordered set; the first entry is the main table
    pub tables: Vec<String>,
    pub joins: Vec<Relationship>,
    pub filters: Vec<String>,
    pub aggregations: Vec<String>,
    /// Consecutive table pairs for which no join path exists
    pub unresolved_pairs: Vec<(String, String)>,
}

impl QueryPlan {
    pub fn main_table(&self) -> Option<&str> {
        self.tables.first().map(|t| t.as_str())
    }

    fn add_table(&mut self, table: &str) {
        if !self.tables.iter().any(|t| t == table) {
            self.tables.push(table.to_string());
        }
    }
}

pub struct QueryPlanBuilder<'a> {
    index: &'a ConceptIndex,
    resolver: JoinPathResolver<'a>,
    matcher: &'a dyn RelevanceMatcher,
    policy: DisconnectedJoinPolicy,
}

impl<'a> QueryPlanBuilder<'a> {
    pub fn new(index: &'a ConceptIndex, resolver: JoinPathResolver<'a>) -> Self {
        Self {
            index,
            resolver,
            matcher: &KeywordMatcher,
            policy: DisconnectedJoinPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DisconnectedJoinPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_matcher(mut self, matcher: &'a dyn RelevanceMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn analyze_business_question(&self, question: &str) -> Result<QueryPlan> {
        let mut plan = QueryPlan {
            concepts: self.index.find_relevant_concepts_with(self.matcher, question),
            metrics: self.index.find_relevant_metrics_with(self.matcher, question),
            ..QueryPlan::default()
        };

        for concept_name in &plan.concepts.clone() {
            let concept = self.index.concept(concept_name)?;
            for table in &concept.tables {
                plan.add_table(&table.table_name);
                plan.filters.extend(table.conditions.iter().cloned());
            }
        }

        for metric_name in &plan.metrics.clone() {
            let metric = self.index.metric(metric_name)?;
            for dep in &metric.dependencies {
                plan.add_table(&dep.table);
            }
        }

        for pair in plan.tables.clone().windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            match self.resolver.get_join_path(left, right) {
                Ok(path) => plan.joins.extend(path),
                Err(AnalystError::NoPath(msg)) => match self.policy {
                    DisconnectedJoinPolicy::Omit => {
                        warn!("Omitting joins between '{}' and '{}': {}", left, right, msg);
                        plan.unresolved_pairs.push((left.clone(), right.clone()));
                    }
                    DisconnectedJoinPolicy::Reject => {
                        return Err(AnalystError::PartialPlan(format!(
                            "tables '{}' and '{}' are not connected",
                            left, right
                        )));
                    }
                },
                Err(e) => return Err(e),
            }
        }

        debug!(
            "Plan for '{}': concepts={:?} metrics={:?} tables={:?} joins={}",
            question,
            plan.concepts,
            plan.metrics,
            plan.tables,
            plan.joins.len()
        );

        Ok(plan)
    }
}
