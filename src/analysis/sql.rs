//! Analysis Query Synthesis
//!
//! Builds query text for the business-question path and for the direct
//! analysis modes.
//!
//! ## Trust boundary
//!
//! Only `custom` parameters are bound. Table and column names, concept filter
//! predicates, metric calculations and the request's WHERE/GROUP BY/HAVING
//! fragments are interpolated verbatim. Metadata must come from trusted
//! operators; escaping these fragments would break legitimate predicate
//! expressions.

use crate::analysis::request::{non_empty, AnalysisKind, AnalysisRequest, BUSINESS_ANALYSIS};
use crate::error::{AnalystError, Result};
use crate::semantic::model::{MetricType, Relationship};
use crate::semantic::plan::QueryPlan;
use crate::semantic::registry::SemanticLayer;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Query text ready for the storage collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    /// `business_analysis` or the direct analysis type
    pub result_type: String,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Compile a request into query text. Fails with `InvalidRequest` before any
/// storage access when the request is malformed.
pub fn compile(layer: &SemanticLayer, request: &AnalysisRequest) -> Result<CompiledQuery> {
    if let Some(question) = request.question() {
        let plan = layer.analyze_business_question(question)?;
        let sql = build_business_query(layer, &plan, request)?;
        return Ok(CompiledQuery {
            result_type: BUSINESS_ANALYSIS.to_string(),
            sql,
            params: Vec::new(),
        });
    }

    let kind = request.kind()?;
    let (sql, params) = match kind {
        AnalysisKind::Summary => (build_summary_query(request)?, Vec::new()),
        AnalysisKind::Distribution => (build_distribution_query(request)?, Vec::new()),
        AnalysisKind::Correlation => (build_correlation_query(request)?, Vec::new()),
        AnalysisKind::Custom => {
            let query = non_empty(&request.query).ok_or_else(|| {
                AnalystError::InvalidRequest("Custom analysis requires a query".to_string())
            })?;
            (query.to_string(), request.params.clone().unwrap_or_default())
        }
    };

    debug!("Compiled {} analysis:\n{}", kind.as_str(), sql);

    Ok(CompiledQuery {
        result_type: kind.as_str().to_string(),
        sql,
        params,
    })
}

/// Query text for a plan: metrics as the select list, joins from the main
/// table, plan filters as a conjunctive WHERE, and the request's grouping
/// clauses passed through.
pub fn build_business_query(
    layer: &SemanticLayer,
    plan: &QueryPlan,
    request: &AnalysisRequest,
) -> Result<String> {
    let main_table = plan.main_table().ok_or_else(|| {
        AnalystError::InvalidRequest(format!(
            "Business question did not resolve to any table: {}",
            request.question().unwrap_or_default()
        ))
    })?;

    let mut select = Vec::new();
    for name in &plan.metrics {
        let metric = layer.concepts().metric(name)?;
        match metric.metric_type {
            MetricType::Simple => select.push(format!("{} AS {}", metric.calculation, name)),
            MetricType::Calculated => select.push(format!("({}) AS {}", metric.calculation, name)),
            MetricType::Derived => {
                warn!("Derived metric '{}' has no direct select expression; skipping", name)
            }
        }
    }

    // Rows come back keyed by column name; a bare `*` over joins collapses duplicates
    let select = if select.is_empty() {
        format!("{}.*", main_table)
    } else {
        select.join(", ")
    };

    let mut lines = vec![format!("SELECT {}", select), format!("FROM {}", main_table)];
    push_joins(&mut lines, main_table, &plan.joins);

    if !plan.filters.is_empty() {
        lines.push(format!("WHERE {}", plan.filters.join(" AND ")));
    }
    push_tail(&mut lines, request);

    let sql = lines.join("\n");
    debug!("Compiled business analysis:\n{}", sql);
    Ok(sql)
}

/// Emit one join clause per edge that brings a new table into scope. Each
/// edge joins whichever endpoint is not yet in scope; an edge with both
/// endpoints in scope emits nothing. Edges touching no table in scope are
/// retried once the scope grows and dropped if it never reaches them.
fn push_joins(lines: &mut Vec<String>, main_table: &str, joins: &[Relationship]) {
    let mut in_scope: Vec<&str> = vec![main_table];
    let mut pending: Vec<&Relationship> = joins.iter().collect();

    while !pending.is_empty() {
        let before = pending.len();
        let mut deferred = Vec::new();

        for edge in pending {
            let source = edge.source_table.as_str();
            let target = edge.target_table.as_str();
            let joined = match (in_scope.contains(&source), in_scope.contains(&target)) {
                (true, true) => {
                    debug!("Join '{}' already covered; no clause emitted", edge.name);
                    continue;
                }
                (true, false) => target,
                (false, true) => source,
                (false, false) => {
                    deferred.push(edge);
                    continue;
                }
            };
            lines.push(format!("INNER JOIN {} ON {}", joined, edge.join_condition()));
            in_scope.push(joined);
        }

        if deferred.len() == before {
            for edge in &deferred {
                warn!(
                    "Join '{}' does not reach '{}'; no clause emitted",
                    edge.name, main_table
                );
            }
            break;
        }
        pending = deferred;
    }
}

fn build_summary_query(request: &AnalysisRequest) -> Result<String> {
    let (table, columns) = table_and_columns(request, AnalysisKind::Summary)?;
    let select = columns
        .iter()
        .map(|col| {
            format!(
                "COUNT({c}) AS {c}_count, AVG({c}) AS {c}_avg, MIN({c}) AS {c}_min, MAX({c}) AS {c}_max, STDDEV({c}) AS {c}_std",
                c = col
            )
        })
        .join(",\n    ");

    let mut lines = vec![format!("SELECT\n    {}", select), format!("FROM {}", table)];
    push_where(&mut lines, request);
    Ok(lines.join("\n"))
}

fn build_distribution_query(request: &AnalysisRequest) -> Result<String> {
    let (table, columns) = table_and_columns(request, AnalysisKind::Distribution)?;
    let column_list = columns.join(", ");

    let mut lines = vec![
        format!("SELECT {}, COUNT(*) AS frequency", column_list),
        format!("FROM {}", table),
    ];
    push_where(&mut lines, request);
    lines.push(format!("GROUP BY {}", column_list));
    if let Some(having) = non_empty(&request.having) {
        lines.push(format!("HAVING {}", having));
    }
    lines.push("ORDER BY frequency DESC".to_string());
    if let Some(limit) = request.limit {
        lines.push(format!("LIMIT {}", limit));
    }
    Ok(lines.join("\n"))
}

/// Pearson coefficient in closed form:
/// (n·Σxy − Σx·Σy) / sqrt((n·Σx² − (Σx)²)(n·Σy² − (Σy)²))
fn build_correlation_query(request: &AnalysisRequest) -> Result<String> {
    let count = request.columns.as_ref().map_or(0, |c| c.len());
    if count != 2 {
        return Err(AnalystError::InvalidRequest(format!(
            "Correlation analysis requires exactly 2 columns, got {}",
            count
        )));
    }
    let (table, columns) = table_and_columns(request, AnalysisKind::Correlation)?;
    let (x, y) = (&columns[0], &columns[1]);

    let mut lines = vec![
        "SELECT".to_string(),
        format!("    (COUNT(*) * SUM({x} * {y}) - SUM({x}) * SUM({y}))", x = x, y = y),
        "    / SQRT(".to_string(),
        format!("        (COUNT(*) * SUM({x} * {x}) - SUM({x}) * SUM({x}))", x = x),
        format!("        * (COUNT(*) * SUM({y} * {y}) - SUM({y}) * SUM({y}))", y = y),
        "    ) AS correlation_coefficient".to_string(),
        format!("FROM {}", table),
    ];
    push_where(&mut lines, request);
    Ok(lines.join("\n"))
}

fn table_and_columns(request: &AnalysisRequest, kind: AnalysisKind) -> Result<(&str, &[String])> {
    let columns = request.columns.as_deref().unwrap_or_default();
    if columns.is_empty() {
        return Err(AnalystError::InvalidRequest(format!(
            "{} analysis requires at least one column",
            kind.as_str()
        )));
    }
    let table = non_empty(&request.table).ok_or_else(|| {
        AnalystError::InvalidRequest(format!("{} analysis requires a table", kind.as_str()))
    })?;
    Ok((table, columns))
}

fn push_where(lines: &mut Vec<String>, request: &AnalysisRequest) {
    if let Some(conditions) = non_empty(&request.conditions) {
        lines.push(format!("WHERE {}", conditions));
    }
}

fn push_tail(lines: &mut Vec<String>, request: &AnalysisRequest) {
    if let Some(group_by) = non_empty(&request.group_by) {
        lines.push(format!("GROUP BY {}", group_by));
    }
    if let Some(having) = non_empty(&request.having) {
        lines.push(format!("HAVING {}", having));
    }
    if let Some(limit) = request.limit {
        lines.push(format!("LIMIT {}", limit));
    }
}
