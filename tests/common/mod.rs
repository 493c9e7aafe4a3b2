#![allow(dead_code)]

use async_trait::async_trait;
use semantic_analyst::db::{ColumnSchema, StorageConnector, TableSchema};
use semantic_analyst::error::{AnalystError, Result};
use semantic_analyst::semantic::{MetadataConfig, SemanticLayer};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared counters so a test can inspect a connector after handing it away
#[derive(Default)]
pub struct Recorder {
    pub io_calls: AtomicUsize,
    pub statements: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Recorder {
    pub fn io_calls(&self) -> usize {
        self.io_calls.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.statements.lock().unwrap().clone()
    }
}

/// In-memory storage double that records every I/O call
pub struct RecordingConnector {
    layer: Arc<SemanticLayer>,
    recorder: Arc<Recorder>,
    connected: bool,
    rows: Vec<Value>,
    failure: Option<String>,
}

impl RecordingConnector {
    pub fn new(layer: Arc<SemanticLayer>, recorder: Arc<Recorder>) -> Self {
        Self {
            layer,
            recorder,
            connected: false,
            rows: Vec::new(),
            failure: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn record(&self) {
        self.recorder.io_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageConnector for RecordingConnector {
    async fn connect(&mut self) -> Result<()> {
        self.record();
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.connected {
            self.record();
        }
        self.connected = false;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>> {
        self.ensure_connected()?;
        self.record();
        self.recorder
            .statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        match &self.failure {
            Some(message) => Err(AnalystError::ExecutionFailed(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }

    async fn get_table_schema(&self, table_name: &str) -> Result<TableSchema> {
        self.ensure_connected()?;
        self.record();
        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns: vec![ColumnSchema {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                primary_key: true,
                default_value: None,
            }],
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        self.record();
        Ok(vec!["customers".to_string(), "orders".to_string()])
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn database_type(&self) -> &'static str {
        "recording"
    }

    fn semantic_layer(&self) -> &SemanticLayer {
        &self.layer
    }
}

pub const SHOP_METADATA: &str = r#"{
    "tables": [
        {
            "name": "orders",
            "business_name": "Orders",
            "columns": [
                {"name": "id", "data_type": "integer"},
                {"name": "customer_id", "data_type": "integer"},
                {"name": "amount", "data_type": "numeric", "is_metric": true, "aggregations": ["SUM", "AVG"]},
                {"name": "status", "data_type": "text"}
            ],
            "primary_key": "id"
        },
        {
            "name": "customers",
            "business_name": "Customers",
            "columns": [
                {"name": "id", "data_type": "integer"},
                {"name": "region", "data_type": "text"}
            ],
            "primary_key": "id"
        }
    ],
    "relationships": [
        {
            "name": "order_customer",
            "source_table": "orders",
            "target_table": "customers",
            "type": "ONE_TO_MANY",
            "source_key": "customer_id",
            "target_key": "id",
            "business_description": "Each order belongs to one customer"
        }
    ],
    "concepts": [
        {
            "name": "revenue",
            "description": "Money earned from paid orders",
            "tables": [
                {"name": "orders", "role": "fact", "conditions": ["orders.status = 'paid'"]},
                {"name": "customers", "role": "dimension"}
            ],
            "metrics": [{"name": "total_revenue", "calculation": "SUM(orders.amount)"}],
            "common_queries": ["how much money did we make"]
        }
    ],
    "metrics": [
        {
            "name": "total_revenue",
            "type": "SIMPLE",
            "calculation": "SUM(orders.amount)",
            "dependencies": [{"table": "orders", "column": "amount"}]
        }
    ]
}"#;

pub fn shop_layer() -> Arc<SemanticLayer> {
    let config = MetadataConfig::from_json(SHOP_METADATA).unwrap();
    Arc::new(SemanticLayer::from_config(config))
}
