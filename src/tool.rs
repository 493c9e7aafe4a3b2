//! Database Analysis Tool
//!
//! Operation dispatcher that owns at most one live connector. Requests arrive as
//! JSON objects tagged by `operation`:
//! `connect`, `disconnect`, `analyze`, `list_tables`, `get_schema`.

use crate::analysis::AnalysisRequest;
use crate::config::ConnectionConfig;
use crate::db::{connector_for, StorageConnector};
use crate::error::{AnalystError, Result};
use crate::semantic::registry::SemanticLayer;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Builds a (disconnected) connector for a connection config
pub type ConnectorFactory =
    Box<dyn Fn(ConnectionConfig, Arc<SemanticLayer>) -> Box<dyn StorageConnector> + Send + Sync>;

const FAILURE_CONTEXT: &str = "Database analysis failed";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ToolOperation {
    Connect {
        config: ConnectionConfig,
    },
    Disconnect,
    Analyze {
        analysis: AnalysisRequest,
    },
    ListTables,
    GetSchema {
        #[serde(rename = "tableName", alias = "table_name")]
        table_name: String,
    },
}

pub struct DatabaseAnalysisTool {
    layer: Arc<SemanticLayer>,
    factory: ConnectorFactory,
    connector: Option<Box<dyn StorageConnector>>,
}

impl DatabaseAnalysisTool {
    pub const NAME: &'static str = "database_analysis";
    pub const DESCRIPTION: &'static str = "Perform data analysis on database tables";

    pub fn new(layer: Arc<SemanticLayer>) -> Self {
        Self::with_factory(layer, Box::new(connector_for))
    }

    pub fn with_factory(layer: Arc<SemanticLayer>, factory: ConnectorFactory) -> Self {
        Self {
            layer,
            factory,
            connector: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connector.as_ref().is_some_and(|c| c.is_connected())
    }

    /// JSON schema of the accepted parameters
    pub fn parameters_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["connect", "disconnect", "analyze", "list_tables", "get_schema"],
                    "description": "The operation to perform"
                },
                "config": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string", "enum": ["postgres"] },
                        "url": { "type": "string" },
                        "host": { "type": "string" },
                        "port": { "type": "number" },
                        "user": { "type": "string" },
                        "password": { "type": "string" },
                        "database": { "type": "string" },
                        "schema": { "type": "string" }
                    },
                    "required": ["type"]
                },
                "analysis": {
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["summary", "distribution", "correlation", "custom"]
                        },
                        "businessQuestion": { "type": "string" },
                        "table": { "type": "string" },
                        "columns": { "type": "array", "items": { "type": "string" } },
                        "conditions": { "type": "string" },
                        "groupBy": { "type": "string" },
                        "having": { "type": "string" },
                        "limit": { "type": "number" },
                        "query": { "type": "string" },
                        "params": {
                            "type": "array",
                            "description": "Positional values for $1..$n. Strings and nulls are sent as text; cast in the query for other column types, e.g. $1::date"
                        }
                    }
                },
                "tableName": { "type": "string" }
            },
            "required": ["operation"]
        })
    }

    /// Parse and run one operation. Every failure carries the
    /// "Database analysis failed" prefix.
    pub async fn execute(&mut self, params: Value) -> Result<Value> {
        let result = match serde_json::from_value::<ToolOperation>(params) {
            Ok(operation) => self.run(operation).await,
            Err(e) => Err(AnalystError::InvalidRequest(format!("Unsupported operation: {}", e))),
        };
        result.map_err(|e| e.context(FAILURE_CONTEXT))
    }

    pub async fn run(&mut self, operation: ToolOperation) -> Result<Value> {
        match operation {
            ToolOperation::Connect { config } => self.handle_connect(config).await,
            ToolOperation::Disconnect => self.handle_disconnect().await,
            ToolOperation::Analyze { analysis } => {
                let result = self.connector()?.analyze(&analysis).await?;
                Ok(serde_json::to_value(result)?)
            }
            ToolOperation::ListTables => {
                let tables = self.connector()?.list_tables().await?;
                Ok(json!({ "count": tables.len(), "tables": tables }))
            }
            ToolOperation::GetSchema { table_name } => {
                let schema = self.connector()?.get_table_schema(&table_name).await?;
                Ok(serde_json::to_value(schema)?)
            }
        }
    }

    async fn handle_connect(&mut self, config: ConnectionConfig) -> Result<Value> {
        if let Some(mut previous) = self.connector.take() {
            previous.disconnect().await?;
        }

        let kind = config.kind;
        let database = config.database_name();
        let mut connector = (self.factory)(config, Arc::clone(&self.layer));
        connector.connect().await?;
        self.connector = Some(connector);

        info!("Database analysis tool connected ({})", kind.as_str());
        Ok(json!({
            "status": "connected",
            "type": kind.as_str(),
            "database": database,
        }))
    }

    async fn handle_disconnect(&mut self) -> Result<Value> {
        match self.connector.take() {
            None => Ok(json!({ "status": "already_disconnected" })),
            Some(mut connector) => {
                connector.disconnect().await?;
                Ok(json!({ "status": "disconnected" }))
            }
        }
    }

    fn connector(&self) -> Result<&dyn StorageConnector> {
        self.connector
            .as_deref()
            .ok_or_else(|| AnalystError::NotConnected("Database not connected".to_string()))
    }
}
