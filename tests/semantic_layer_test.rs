mod common;

use common::{shop_layer, Recorder, RecordingConnector};
use semantic_analyst::config::ConnectionConfig;
use semantic_analyst::db::StorageConnector;
use semantic_analyst::error::AnalystError;
use semantic_analyst::semantic::{
    BusinessConcept, Column, DisconnectedJoinPolicy, Relationship, RelationshipType, SemanticLayer,
    TableSpec,
};
use semantic_analyst::tool::DatabaseAnalysisTool;
use serde_json::json;
use std::sync::Arc;

fn edge(name: &str, source: &str, target: &str) -> Relationship {
    Relationship::new(name, source, target, RelationshipType::OneToMany, "id", "parent_id")
}

#[test]
fn test_join_paths_over_small_graph() {
    let mut layer = SemanticLayer::new();
    layer.register_relationship(edge("a_b", "A", "B"));
    layer.register_relationship(edge("b_c", "B", "C"));
    layer.register_relationship(edge("a_d", "A", "D"));

    let path = layer.get_join_path("A", "C").unwrap();
    let names: Vec<&str> = path.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a_b", "b_c"]);

    assert!(layer.get_join_path("A", "A").unwrap().is_empty());
    assert!(matches!(layer.get_join_path("A", "Z"), Err(AnalystError::NoPath(_))));
}

#[test]
fn test_table_reregistration_is_last_write_wins() {
    let mut layer = SemanticLayer::new();
    layer.register_table(
        TableSpec::new("orders")
            .with_column(Column::new("id", "integer"))
            .with_column(Column::new("amount", "numeric")),
    );
    layer.register_table(TableSpec::new("orders").with_column(Column::new("order_total", "numeric")));

    let orders = layer.graph().table("orders").unwrap();
    let mut columns: Vec<&String> = orders.columns.keys().collect();
    columns.sort();
    assert_eq!(columns, vec!["order_total"]);
}

#[test]
fn test_relevant_concepts() {
    let layer = shop_layer();
    assert_eq!(
        layer.concepts().find_relevant_concepts("show me total revenue"),
        vec!["revenue"]
    );
    assert_eq!(
        layer.concepts().find_relevant_concepts("How much money did we make in May?"),
        vec!["revenue"]
    );
    assert!(layer.concepts().find_relevant_concepts("list open tickets").is_empty());
}

#[test]
fn test_two_table_concept_plan() {
    let layer = shop_layer();
    let plan = layer.analyze_business_question("revenue overview").unwrap();
    assert_eq!(plan.tables, vec!["orders", "customers"]);
    assert_eq!(plan.joins.len(), 1);
    assert_eq!(plan.joins[0].name, "order_customer");
    assert_eq!(plan.main_table(), Some("orders"));
}

#[test]
fn test_dangling_concept_table_surfaces_in_plan() {
    let mut layer = SemanticLayer::new().with_policy(DisconnectedJoinPolicy::Reject);
    layer.register_business_concept(
        BusinessConcept::new("returns")
            .with_table("orders", "fact")
            .with_table("refunds", "fact"),
    );
    let result = layer.analyze_business_question("returns last week");
    assert!(matches!(result, Err(AnalystError::PartialPlan(_))));
}

fn recording_tool(recorder: &Arc<Recorder>) -> DatabaseAnalysisTool {
    let recorder = Arc::clone(recorder);
    DatabaseAnalysisTool::with_factory(
        shop_layer(),
        Box::new(move |_config: ConnectionConfig, layer: Arc<SemanticLayer>| -> Box<dyn StorageConnector> {
            Box::new(
                RecordingConnector::new(layer, Arc::clone(&recorder))
                    .with_rows(vec![json!({ "frequency": 3, "status": "paid" })]),
            )
        }),
    )
}

#[tokio::test]
async fn test_tool_connect_analyze_disconnect() {
    let recorder = Arc::new(Recorder::default());
    let mut tool = recording_tool(&recorder);

    let connected = tool
        .execute(json!({
            "operation": "connect",
            "config": { "type": "postgres", "host": "localhost", "database": "shop" }
        }))
        .await
        .unwrap();
    assert_eq!(connected["status"], "connected");
    assert_eq!(connected["type"], "postgres");
    assert_eq!(connected["database"], "shop");
    assert!(tool.is_connected());

    let tables = tool.execute(json!({ "operation": "list_tables" })).await.unwrap();
    assert_eq!(tables["count"], 2);

    let schema = tool
        .execute(json!({ "operation": "get_schema", "tableName": "orders" }))
        .await
        .unwrap();
    assert_eq!(schema["tableName"], "orders");

    let analysis = tool
        .execute(json!({
            "operation": "analyze",
            "analysis": { "type": "distribution", "table": "orders", "columns": ["status"] }
        }))
        .await
        .unwrap();
    assert_eq!(analysis["type"], "distribution");
    assert_eq!(analysis["results"][0]["frequency"], 3);

    let disconnected = tool.execute(json!({ "operation": "disconnect" })).await.unwrap();
    assert_eq!(disconnected["status"], "disconnected");
    assert!(!tool.is_connected());

    let again = tool.execute(json!({ "operation": "list_tables" })).await;
    assert!(matches!(again, Err(AnalystError::NotConnected(_))));
}

#[tokio::test]
async fn test_tool_reconnect_replaces_connector() {
    let recorder = Arc::new(Recorder::default());
    let mut tool = recording_tool(&recorder);
    let connect = json!({ "operation": "connect", "config": { "type": "postgres" } });

    tool.execute(connect.clone()).await.unwrap();
    tool.execute(connect).await.unwrap();

    // connect, disconnect of the first connector, connect of the second
    assert_eq!(recorder.io_calls(), 3);
    assert!(tool.is_connected());
}
