//! Runs against a real PostgreSQL instance.
//!
//! `DATABASE_URL=postgres://... cargo test --test postgres_live -- --ignored`

mod common;

use common::shop_layer;
use semantic_analyst::analysis::AnalysisRequest;
use semantic_analyst::config::ConnectionConfig;
use semantic_analyst::db::{connector_for, StorageConnector};
use serde_json::json;

fn database_url() -> Option<String> {
    dotenv::dotenv().ok();
    std::env::var("DATABASE_URL").ok()
}

#[tokio::test]
#[ignore]
async fn test_live_round_trip() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    let mut connector = connector_for(ConnectionConfig::postgres_url(url), shop_layer());
    connector.connect().await.unwrap();

    let result = connector
        .analyze(&AnalysisRequest::custom(
            "SELECT v.id FROM (VALUES (1), (2)) AS v(id) WHERE v.id = $1",
            vec![json!(2)],
        ))
        .await
        .unwrap();
    assert_eq!(result.results, vec![json!({ "id": 2 })]);

    // Strings and nulls bind as text; typed comparisons cast explicitly
    let dated = connector
        .analyze(&AnalysisRequest::custom(
            "SELECT v.id FROM (VALUES (1, DATE '2024-01-15'), (2, DATE '2023-06-01')) AS v(id, created_at) \
             WHERE v.created_at >= $1::date",
            vec![json!("2023-12-31")],
        ))
        .await
        .unwrap();
    assert_eq!(dated.results, vec![json!({ "id": 1 })]);

    let nulls = connector
        .analyze(&AnalysisRequest::custom(
            "SELECT v.id FROM (VALUES (1, 10), (2, NULL::integer)) AS v(id, customer_id) \
             WHERE v.customer_id IS NOT DISTINCT FROM $1::integer",
            vec![json!(null)],
        ))
        .await
        .unwrap();
    assert_eq!(nulls.results, vec![json!({ "id": 2 })]);

    let status = connector
        .query("SET application_name = 'semantic-analyst'", &[])
        .await
        .unwrap();
    assert_eq!(status.len(), 1);

    let tables = connector.list_tables().await.unwrap();
    assert!(tables.iter().all(|t| !t.is_empty()));

    connector.disconnect().await.unwrap();
    assert!(!connector.is_connected());
}
