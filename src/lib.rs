pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod semantic;
pub mod tool;

pub use analysis::{AnalysisKind, AnalysisRequest, AnalysisResult};
pub use db::StorageConnector;
pub use error::{AnalystError, Result};
pub use semantic::{MetadataConfig, QueryPlan, SemanticLayer};
pub use tool::DatabaseAnalysisTool;
