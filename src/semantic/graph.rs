//! Metadata Graph
//!
//! Stores table and relationship descriptors. Registration is last-write-wins:
//! re-registering a name replaces the prior descriptor wholesale.
//!
//! Relationships keep their registration order. Join path search walks edges in
//! that order, so a replaced relationship keeps the slot of the first
//! registration under its name.

use crate::error::{AnalystError, Result};
use crate::semantic::model::{Relationship, Table, TableSpec};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MetadataGraph {
    tables: HashMap<String, Table>,
    relationships: Vec<Relationship>,
    relationship_index: HashMap<String, usize>,
}

impl MetadataGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a table by name
    pub fn register_table(&mut self, spec: TableSpec) {
        let table = Table::from(spec);
        if self.tables.contains_key(&table.name) {
            debug!("Replacing table '{}'", table.name);
        }
        self.tables.insert(table.name.clone(), table);
    }

    /// Insert or replace a relationship by name.
    ///
    /// Table references are not checked here; a dangling reference only shows
    /// up when a join path runs into it.
    pub fn register_relationship(&mut self, relationship: Relationship) {
        match self.relationship_index.get(&relationship.name) {
            Some(&idx) => {
                debug!("Replacing relationship '{}'", relationship.name);
                self.relationships[idx] = relationship;
            }
            None => {
                self.relationship_index
                    .insert(relationship.name.clone(), self.relationships.len());
                self.relationships.push(relationship);
            }
        }
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| AnalystError::NotFound(format!("table '{}'", name)))
    }

    pub fn relationship(&self, name: &str) -> Result<&Relationship> {
        self.relationship_index
            .get(name)
            .map(|&idx| &self.relationships[idx])
            .ok_or_else(|| AnalystError::NotFound(format!("relationship '{}'", name)))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Relationships in registration order
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}
