//! Join Path Resolution
//!
//! Breadth-first search over registered relationships. Every relationship is an
//! undirected edge between its source and target table; direction metadata is
//! kept on the returned edges but ignored for reachability.
//!
//! Ties are broken by registration order: at each hop the first-registered
//! relationship is explored first, so the same metadata always yields the same
//! path.

use crate::error::{AnalystError, Result};
use crate::semantic::graph::MetadataGraph;
use crate::semantic::model::Relationship;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy)]
pub struct JoinPathResolver<'a> {
    graph: &'a MetadataGraph,
}

impl<'a> JoinPathResolver<'a> {
    pub fn new(graph: &'a MetadataGraph) -> Self {
        Self { graph }
    }

    /// Shortest (by edge count) chain of relationships from `source` to `target`.
    ///
    /// Returns an empty path when both are the same table and `NoPath` when the
    /// component containing `source` never reaches `target`.
    pub fn get_join_path(&self, source: &str, target: &str) -> Result<Vec<Relationship>> {
        self.find_path(source, target).ok_or_else(|| {
            AnalystError::NoPath(format!("no relationship path from '{}' to '{}'", source, target))
        })
    }

    fn find_path(&self, source: &str, target: &str) -> Option<Vec<Relationship>> {
        let mut queue: VecDeque<(&str, Vec<&Relationship>)> = VecDeque::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(source);
        queue.push_back((source, Vec::new()));

        while let Some((current, path)) = queue.pop_front() {
            if current == target {
                return Some(path.into_iter().cloned().collect());
            }

            for rel in self.graph.relationships() {
                // Forward direction
                if rel.source_table == current && visited.insert(rel.target_table.as_str()) {
                    let mut next = path.clone();
                    next.push(rel);
                    queue.push_back((rel.target_table.as_str(), next));
                }
                // Reverse direction
                if rel.target_table == current && visited.insert(rel.source_table.as_str()) {
                    let mut next = path.clone();
                    next.push(rel);
                    queue.push_back((rel.source_table.as_str(), next));
                }
            }
        }

        None
    }
}
