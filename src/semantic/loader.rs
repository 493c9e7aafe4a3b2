//! Semantic Metadata Loader
//!
//! Loads table, relationship, concept and metric descriptors from JSON
//! configuration. Nothing is cross-validated here; dangling table references
//! are accepted as-is.

use crate::error::{AnalystError, Result};
use crate::semantic::model::{BusinessConcept, Metric, Relationship, TableSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Metadata configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub tables: Vec<TableSpec>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub concepts: Vec<BusinessConcept>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl MetadataConfig {
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| AnalystError::Metadata(format!("Failed to parse metadata JSON: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading metadata from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalystError::Metadata(format!("Failed to read metadata file {:?}: {}", path, e))
        })?;
        Self::from_json(&content)
    }
}
