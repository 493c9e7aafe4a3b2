//! Analysis Engine
//!
//! Compiles business questions and direct analysis requests into query text.
//! Execution goes through a [`StorageConnector`](crate::db::StorageConnector).

pub mod request;
pub mod sql;

pub use request::{AnalysisKind, AnalysisRequest, AnalysisResult, ResultMetadata, BUSINESS_ANALYSIS};
pub use sql::{build_business_query, compile, CompiledQuery};
