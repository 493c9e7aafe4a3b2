//! Analysis request and result envelope

use crate::error::{AnalystError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Result type reported for the business-question path
pub const BUSINESS_ANALYSIS: &str = "business_analysis";

/// Direct analysis modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// COUNT/AVG/MIN/MAX/STDDEV per column
    Summary,
    /// Frequency of each value combination
    Distribution,
    /// Pearson coefficient between exactly two columns
    Correlation,
    /// Caller-supplied query text with bound parameters
    Custom,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Summary => "summary",
            AnalysisKind::Distribution => "distribution",
            AnalysisKind::Correlation => "correlation",
            AnalysisKind::Custom => "custom",
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(AnalysisKind::Summary),
            "distribution" => Ok(AnalysisKind::Distribution),
            "correlation" => Ok(AnalysisKind::Correlation),
            "custom" => Ok(AnalysisKind::Custom),
            _ => Err(AnalystError::InvalidRequest(format!(
                "Unsupported analysis type: {}",
                s
            ))),
        }
    }
}

/// Either `business_question` or `analysis_type` must be set. When both are,
/// the business question wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Raw WHERE predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Query text for `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Positional parameters for `custom`. Strings and nulls are sent as
    /// `text`, numbers as `int8`/`float8`, booleans as `bool`, arrays and objects
    /// as `jsonb`. Compare against other column types with an explicit cast in
    /// the query text, e.g. `created_at >= $1::date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Value>>,
}

impl AnalysisRequest {
    pub fn business(question: impl Into<String>) -> Self {
        Self {
            business_question: Some(question.into()),
            ..Self::default()
        }
    }

    pub fn direct(kind: AnalysisKind, table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            analysis_type: Some(kind.as_str().to_string()),
            table: Some(table.into()),
            columns: Some(columns.iter().map(|c| c.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Caller-supplied query text with `$n` placeholders; see `params` for how
    /// values are typed.
    pub fn custom(query: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            analysis_type: Some(AnalysisKind::Custom.as_str().to_string()),
            query: Some(query.into()),
            params: Some(params),
            ..Self::default()
        }
    }

    pub fn with_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    pub fn with_group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    pub fn with_having(mut self, having: impl Into<String>) -> Self {
        self.having = Some(having.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Non-empty business question, if any
    pub fn question(&self) -> Option<&str> {
        non_empty(&self.business_question)
    }

    pub fn kind(&self) -> Result<AnalysisKind> {
        match non_empty(&self.analysis_type) {
            Some(t) => t.parse(),
            None => Err(AnalystError::InvalidRequest(
                "either businessQuestion or type must be provided".to_string(),
            )),
        }
    }
}

/// Treat `Some("")` like `None`
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    /// RFC 3339 time the result was produced
    pub timestamp: String,
}

/// Result envelope returned by `analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "type")]
    pub result_type: String,
    pub results: Vec<Value>,
    pub metadata: ResultMetadata,
}

impl AnalysisResult {
    pub fn new(result_type: impl Into<String>, results: Vec<Value>, request: &AnalysisRequest) -> Self {
        Self {
            result_type: result_type.into(),
            results,
            metadata: ResultMetadata {
                business_question: request.business_question.clone(),
                table: request.table.clone(),
                columns: request.columns.clone(),
                conditions: request.conditions.clone(),
                timestamp: Utc::now().to_rfc3339(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_from_camel_case_json() {
        let request: AnalysisRequest = serde_json::from_value(json!({
            "type": "distribution",
            "table": "orders",
            "columns": ["status"],
            "groupBy": "status",
            "limit": 10
        }))
        .unwrap();
        assert_eq!(request.kind().unwrap(), AnalysisKind::Distribution);
        assert_eq!(request.group_by.as_deref(), Some("status"));
        assert_eq!(request.limit, Some(10));
    }

    #[test]
    fn test_kind_is_case_insensitive() {
        assert_eq!("SUMMARY".parse::<AnalysisKind>().unwrap(), AnalysisKind::Summary);
        assert!(matches!("pivot".parse::<AnalysisKind>(), Err(AnalystError::InvalidRequest(_))));
    }

    #[test]
    fn test_missing_type_and_question() {
        let request = AnalysisRequest::default();
        assert!(request.question().is_none());
        assert!(matches!(request.kind(), Err(AnalystError::InvalidRequest(_))));
    }

    #[test]
    fn test_envelope_serialization() {
        let request = AnalysisRequest::business("total revenue");
        let result = AnalysisResult::new(BUSINESS_ANALYSIS, vec![json!({"revenue": 10})], &request);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "business_analysis");
        assert_eq!(value["metadata"]["businessQuestion"], "total revenue");
        assert!(value["metadata"].get("table").is_none());
        assert!(value["metadata"]["timestamp"].is_string());
    }
}
