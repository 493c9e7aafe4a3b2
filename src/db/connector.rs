//! Storage Connector Trait - contract between the semantic layer and a database
//!
//! Every backend implements connect/disconnect, parameterized queries and
//! schema introspection. `analyze` is provided on top of those: it compiles a
//! request against the connector's semantic layer and runs the result through
//! `query`.
//!
//! Connection state: `Disconnected --connect()--> Connected --disconnect()--> Disconnected`.
//! Everything except `connect`, `disconnect` and the state accessors requires
//! `Connected` and fails with `NotConnected` before doing any I/O.

use crate::analysis::{compile, AnalysisRequest, AnalysisResult};
use crate::config::{ConnectionConfig, DatabaseKind};
use crate::db::postgres::PostgresConnector;
use crate::error::{AnalystError, Result};
use crate::semantic::registry::SemanticLayer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Column as reported by the database catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn connect(&mut self) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;

    /// Execute query text with positional parameters; rows come back as JSON objects
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>>;

    async fn get_table_schema(&self, table_name: &str) -> Result<TableSchema>;

    async fn list_tables(&self) -> Result<Vec<String>>;

    fn is_connected(&self) -> bool;

    fn database_type(&self) -> &'static str;

    /// Metadata this connector plans against
    fn semantic_layer(&self) -> &SemanticLayer;

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(AnalystError::NotConnected(format!(
                "{} connection not initialized",
                self.database_type()
            )))
        }
    }

    /// Answer a business question or run a direct analysis
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.ensure_connected()?;
        let compiled = compile(self.semantic_layer(), request)?;

        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            "[{}] Running {} analysis on {}",
            run_id,
            compiled.result_type,
            self.database_type()
        );

        let rows = self
            .query(&compiled.sql, &compiled.params)
            .await
            .map_err(|e| match e {
                AnalystError::ExecutionFailed(msg) => {
                    AnalystError::ExecutionFailed(format!("Analysis failed: {}", msg))
                }
                other => other,
            })?;

        info!("[{}] Analysis returned {} rows", run_id, rows.len());
        Ok(AnalysisResult::new(compiled.result_type, rows, request))
    }
}

/// Build the connector for a backend kind. The connector starts disconnected.
pub fn connector_for(
    config: ConnectionConfig,
    layer: Arc<SemanticLayer>,
) -> Box<dyn StorageConnector> {
    match config.kind {
        DatabaseKind::Postgres => Box::new(PostgresConnector::new(config, layer)),
    }
}
