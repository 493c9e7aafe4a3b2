//! Concept Index
//!
//! Business concepts and metrics, each matchable against a free-text question.
//!
//! Matching is plain case-insensitive substring containment: a concept is
//! relevant when its name or any of its example phrasings appears inside the
//! question; a metric when its name does. There is no ranking. A different
//! matcher can be supplied through [`RelevanceMatcher`] without touching plan
//! assembly.

use crate::error::{AnalystError, Result};
use crate::semantic::model::{BusinessConcept, Metric};
use std::collections::HashMap;
use tracing::debug;

/// Decides whether a registered phrase is relevant to a question
pub trait RelevanceMatcher: Send + Sync {
    fn matches(&self, question: &str, phrase: &str) -> bool;
}

/// Case-insensitive substring matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatcher;

impl RelevanceMatcher for KeywordMatcher {
    fn matches(&self, question: &str, phrase: &str) -> bool {
        question.to_lowercase().contains(&phrase.to_lowercase())
    }
}

/// Name-keyed registry that remembers first-registration order
#[derive(Debug, Clone)]
struct OrderedRegistry<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for OrderedRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> OrderedRegistry<T> {
    /// Returns true when an existing entry was replaced
    fn upsert(&mut self, name: &str, entry: T) -> bool {
        match self.index.get(name) {
            Some(&idx) => {
                self.entries[idx] = entry;
                true
            }
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(entry);
                false
            }
        }
    }

    fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConceptIndex {
    concepts: OrderedRegistry<BusinessConcept>,
    metrics: OrderedRegistry<Metric>,
}

impl ConceptIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a concept by name. Table references are not validated.
    pub fn register_business_concept(&mut self, concept: BusinessConcept) {
        let name = concept.name.clone();
        if self.concepts.upsert(&name, concept) {
            debug!("Replacing business concept '{}'", name);
        }
    }

    pub fn register_metric(&mut self, metric: Metric) {
        let name = metric.name.clone();
        if self.metrics.upsert(&name, metric) {
            debug!("Replacing metric '{}'", name);
        }
    }

    pub fn concept(&self, name: &str) -> Result<&BusinessConcept> {
        self.concepts
            .get(name)
            .ok_or_else(|| AnalystError::NotFound(format!("business concept '{}'", name)))
    }

    pub fn metric(&self, name: &str) -> Result<&Metric> {
        self.metrics
            .get(name)
            .ok_or_else(|| AnalystError::NotFound(format!("metric '{}'", name)))
    }

    /// Names of concepts whose name or example phrasing occurs in the question
    pub fn find_relevant_concepts(&self, question: &str) -> Vec<String> {
        self.find_relevant_concepts_with(&KeywordMatcher, question)
    }

    pub fn find_relevant_concepts_with(
        &self,
        matcher: &dyn RelevanceMatcher,
        question: &str,
    ) -> Vec<String> {
        self.concepts
            .iter()
            .filter(|concept| {
                matcher.matches(question, &concept.name)
                    || concept
                        .common_queries
                        .iter()
                        .any(|phrase| matcher.matches(question, phrase))
            })
            .map(|concept| concept.name.clone())
            .collect()
    }

    /// Names of metrics whose name occurs in the question
    pub fn find_relevant_metrics(&self, question: &str) -> Vec<String> {
        self.find_relevant_metrics_with(&KeywordMatcher, question)
    }

    pub fn find_relevant_metrics_with(
        &self,
        matcher: &dyn RelevanceMatcher,
        question: &str,
    ) -> Vec<String> {
        self.metrics
            .iter()
            .filter(|metric| matcher.matches(question, &metric.name))
            .map(|metric| metric.name.clone())
            .collect()
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }
}
