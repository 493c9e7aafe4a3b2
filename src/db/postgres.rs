//! PostgreSQL connector using sqlx
//!
//! Row-returning statements are wrapped in `row_to_json` so every backend row
//! comes back as a JSON object regardless of column types.

use crate::config::ConnectionConfig;
use crate::db::connector::{ColumnSchema, StorageConnector, TableSchema};
use crate::error::{AnalystError, Result};
use crate::semantic::registry::SemanticLayer;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, Postgres};
use sqlx::query::Query;
use sqlx::Row;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

lazy_static::lazy_static! {
    static ref ROW_RETURNING: Regex = Regex::new(r"(?i)^\s*(select|with|values|table)\b").unwrap();
}

const TABLE_SCHEMA_SQL: &str = r#"
SELECT
    c.column_name AS name,
    c.data_type AS "type",
    (c.is_nullable = 'YES') AS nullable,
    EXISTS (
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON tc.constraint_name = kcu.constraint_name
         AND tc.table_schema = kcu.table_schema
        WHERE tc.constraint_type = 'PRIMARY KEY'
          AND tc.table_schema = c.table_schema
          AND tc.table_name = c.table_name
          AND kcu.column_name = c.column_name
    ) AS primary_key,
    c.column_default AS default_value
FROM information_schema.columns c
WHERE c.table_schema = $1 AND c.table_name = $2
ORDER BY c.ordinal_position
"#;

const LIST_TABLES_SQL: &str = r#"
SELECT table_name
FROM information_schema.tables
WHERE table_schema = $1
ORDER BY table_name
"#;

pub struct PostgresConnector {
    config: ConnectionConfig,
    layer: Arc<SemanticLayer>,
    pool: Option<PgPool>,
}

impl PostgresConnector {
    pub fn new(config: ConnectionConfig, layer: Arc<SemanticLayer>) -> Self {
        Self {
            config,
            layer,
            pool: None,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn pool(&self) -> Result<&PgPool> {
        self.pool.as_ref().ok_or_else(|| {
            AnalystError::NotConnected("PostgreSQL connection not initialized".to_string())
        })
    }

    fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = &self.config.url {
            return url
                .parse::<PgConnectOptions>()
                .map_err(|e| AnalystError::Config(format!("Invalid connection URL: {}", e)));
        }

        let mut options = PgConnectOptions::new();
        if let Some(host) = &self.config.host {
            options = options.host(host);
        }
        if let Some(port) = self.config.port {
            options = options.port(port);
        }
        if let Some(user) = &self.config.user {
            options = options.username(user);
        }
        if let Some(password) = &self.config.password {
            options = options.password(password);
        }
        if let Some(database) = &self.config.database {
            options = options.database(database);
        }
        Ok(options)
    }
}

#[async_trait]
impl StorageConnector for PostgresConnector {
    async fn connect(&mut self) -> Result<()> {
        if self.pool.is_some() {
            debug!("PostgreSQL connector already connected");
            return Ok(());
        }

        let options = self.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(Duration::from_secs(self.config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| {
                AnalystError::ExecutionFailed(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        // Test the connection
        sqlx::query("SELECT 1").execute(&pool).await.map_err(|e| {
            AnalystError::ExecutionFailed(format!("Failed to connect to PostgreSQL: {}", e))
        })?;

        info!(
            "Connected to PostgreSQL (database: {})",
            self.config.database_name().unwrap_or_else(|| "default".to_string())
        );
        self.pool = Some(pool);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            info!("Disconnected from PostgreSQL");
        }
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>> {
        let pool = self.pool()?;
        let statement = sql.trim().trim_end_matches(';');
        debug!("Executing query with {} params:\n{}", params.len(), statement);

        if ROW_RETURNING.is_match(statement) {
            let wrapped = format!("SELECT row_to_json(_q) AS row FROM ({}) AS _q", statement);
            let rows = bind_params(sqlx::query(&wrapped), params)
                .fetch_all(pool)
                .await
                .map_err(|e| AnalystError::ExecutionFailed(format!("Query execution failed: {}", e)))?;

            rows.iter()
                .map(|row| {
                    row.try_get::<Value, _>("row").map_err(|e| {
                        AnalystError::ExecutionFailed(format!("Failed to decode row: {}", e))
                    })
                })
                .collect()
        } else {
            let done = bind_params(sqlx::query(statement), params)
                .execute(pool)
                .await
                .map_err(|e| AnalystError::ExecutionFailed(format!("Query execution failed: {}", e)))?;
            Ok(vec![json!({ "rows_affected": done.rows_affected() })])
        }
    }

    async fn get_table_schema(&self, table_name: &str) -> Result<TableSchema> {
        self.ensure_connected()?;
        let rows = self
            .query(
                TABLE_SCHEMA_SQL,
                &[json!(self.config.schema), json!(table_name)],
            )
            .await
            .map_err(|e| with_context(e, "Failed to get table schema"))?;

        if rows.is_empty() {
            return Err(AnalystError::NotFound(format!(
                "table '{}' in schema '{}'",
                table_name, self.config.schema
            )));
        }

        let columns = rows
            .into_iter()
            .map(serde_json::from_value::<ColumnSchema>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns,
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        let rows = self
            .query(LIST_TABLES_SQL, &[json!(self.config.schema)])
            .await
            .map_err(|e| with_context(e, "Failed to list tables"))?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("table_name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    fn database_type(&self) -> &'static str {
        "postgres"
    }

    fn semantic_layer(&self) -> &SemanticLayer {
        &self.layer
    }
}

/// Bind JSON values as positional parameters.
///
/// Parameters go out in binary format with a declared type, so the server
/// cannot reinterpret a string as a date or number. Strings and nulls are
/// declared `text`; queries comparing them to other types need `$n::type`.
fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.clone()),
            other => query.bind(sqlx::types::Json(other.clone())),
        };
    }
    query
}

fn with_context(err: AnalystError, context: &str) -> AnalystError {
    match err {
        AnalystError::ExecutionFailed(msg) => {
            AnalystError::ExecutionFailed(format!("{}: {}", context, msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(config: ConnectionConfig) -> PostgresConnector {
        PostgresConnector::new(config, Arc::new(SemanticLayer::new()))
    }

    #[test]
    fn test_row_returning_detection() {
        assert!(ROW_RETURNING.is_match("SELECT 1"));
        assert!(ROW_RETURNING.is_match("  with t as (select 1) select * from t"));
        assert!(!ROW_RETURNING.is_match("UPDATE orders SET status = 'x'"));
        assert!(!ROW_RETURNING.is_match("selection_table"));
    }

    #[test]
    fn test_connect_options_from_url() {
        let pg = connector(ConnectionConfig::postgres_url("postgres://analyst:secret@db:6543/shop"));
        let options = pg.connect_options().unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("shop"));
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let pg = connector(ConnectionConfig::postgres_url("not a url"));
        assert!(matches!(pg.connect_options(), Err(AnalystError::Config(_))));
    }

    #[tokio::test]
    async fn test_operations_before_connect_fail() {
        let pg = connector(ConnectionConfig::postgres_url("postgres://localhost/shop"));
        assert!(matches!(pg.query("SELECT 1", &[]).await, Err(AnalystError::NotConnected(_))));
        assert!(matches!(
            pg.get_table_schema("orders").await,
            Err(AnalystError::NotConnected(_))
        ));
        assert!(matches!(pg.list_tables().await, Err(AnalystError::NotConnected(_))));
    }

    #[tokio::test]
    async fn test_disconnect_when_disconnected_is_noop() {
        let mut pg = connector(ConnectionConfig::postgres_url("postgres://localhost/shop"));
        pg.disconnect().await.unwrap();
        assert!(!pg.is_connected());
    }
}
