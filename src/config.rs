//! Configuration
//!
//! Connection and planner settings, from JSON (tool calls) or environment
//! variables (CLI, loaded through `.env`).

use crate::error::{AnalystError, Result};
use crate::semantic::plan::DisconnectedJoinPolicy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Storage backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[serde(alias = "postgresql")]
    Postgres,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgres",
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            other => Err(AnalystError::Config(format!("Unsupported database type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(rename = "type")]
    pub kind: DatabaseKind,
    /// Full connection URL; takes precedence over the individual fields
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    /// Schema used for table listing and introspection
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl ConnectionConfig {
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(DatabaseKind::Postgres)
        }
    }

    pub fn new(kind: DatabaseKind) -> Self {
        Self {
            kind,
            url: None,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            schema: default_schema(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }

    /// Build from environment variables
    pub fn from_env() -> Result<Self> {
        let kind = match std::env::var("ANALYST_DB_KIND") {
            Ok(kind) => kind.parse()?,
            Err(_) => DatabaseKind::Postgres,
        };

        let port = match std::env::var("ANALYST_DB_PORT") {
            Ok(port) => Some(port.parse::<u16>().map_err(|e| {
                AnalystError::Config(format!("Invalid ANALYST_DB_PORT '{}': {}", port, e))
            })?),
            Err(_) => None,
        };

        let max_connections = parse_env("ANALYST_DB_MAX_CONNECTIONS", default_max_connections())?;
        let acquire_timeout_secs =
            parse_env("ANALYST_DB_ACQUIRE_TIMEOUT_SECS", default_acquire_timeout_secs())?;

        Ok(Self {
            kind,
            url: std::env::var("DATABASE_URL").ok(),
            host: std::env::var("ANALYST_DB_HOST").ok(),
            port,
            user: std::env::var("ANALYST_DB_USER").ok(),
            password: std::env::var("ANALYST_DB_PASSWORD").ok(),
            database: std::env::var("ANALYST_DB_NAME").ok(),
            schema: std::env::var("ANALYST_DB_SCHEMA").unwrap_or_else(|_| default_schema()),
            max_connections,
            acquire_timeout_secs,
        })
    }

    /// Database name for status reporting, falling back to the URL path
    pub fn database_name(&self) -> Option<String> {
        if let Some(db) = &self.database {
            return Some(db.clone());
        }
        self.url
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
            .map(|tail| tail.split('?').next().unwrap_or(tail).to_string())
            .filter(|name| !name.is_empty() && !name.contains(':'))
    }
}

/// Plan assembly settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub disconnected_joins: DisconnectedJoinPolicy,
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self> {
        let disconnected_joins = match std::env::var("ANALYST_DISCONNECTED_JOINS") {
            Ok(policy) => policy.parse()?,
            Err(_) => DisconnectedJoinPolicy::default(),
        };
        Ok(Self { disconnected_joins })
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AnalystError::Config(format!("Invalid {} '{}': {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_defaults_from_json() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{"type": "postgresql", "host": "db", "user": "analyst", "database": "shop"}"#,
        )
        .unwrap();
        assert_eq!(config.kind, DatabaseKind::Postgres);
        assert_eq!(config.schema, "public");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.database_name().as_deref(), Some("shop"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(matches!("mysql".parse::<DatabaseKind>(), Err(AnalystError::Config(_))));
        assert!(serde_json::from_str::<ConnectionConfig>(r#"{"type": "oracle"}"#).is_err());
    }

    #[test]
    fn test_database_name_from_url() {
        let config = ConnectionConfig::postgres_url("postgres://u:p@localhost:5432/analytics?sslmode=disable");
        assert_eq!(config.database_name().as_deref(), Some("analytics"));
    }
}
