//! Database module
//!
//! Storage collaborator contract and the PostgreSQL backend behind it.

pub mod connector;
pub mod postgres;

pub use connector::{connector_for, ColumnSchema, StorageConnector, TableSchema};
pub use postgres::PostgresConnector;
