//! Semantic Metadata Descriptors
//!
//! Tables, relationships, business concepts and metrics as registered by
//! metadata authors. These are plain data; the registries that own them live in
//! `graph` and `concepts`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column description inside a registered table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Defaults to `name` when left empty at registration
    #[serde(default, alias = "businessName")]
    pub business_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "dataType")]
    pub data_type: String,
    #[serde(default, alias = "isMetric")]
    pub is_metric: bool,
    /// Aggregations that make sense for this column (e.g. "SUM", "AVG")
    #[serde(default)]
    pub aggregations: Vec<String>,
    #[serde(default, alias = "businessRules")]
    pub business_rules: Vec<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            business_name: name.clone(),
            name,
            description: String::new(),
            data_type: data_type.into(),
            is_metric: false,
            aggregations: Vec::new(),
            business_rules: Vec::new(),
        }
    }
}

/// Table registration input. Columns arrive as a list and are keyed by name
/// when the table is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    #[serde(alias = "table_name", alias = "tableName")]
    pub name: String,
    #[serde(default, alias = "businessName")]
    pub business_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, alias = "primaryKey")]
    pub primary_key: Option<String>,
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
}

fn default_timestamps() -> bool {
    true
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            business_name: String::new(),
            description: String::new(),
            columns: Vec::new(),
            primary_key: None,
            timestamps: true,
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }
}

/// Registered table descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub business_name: String,
    pub description: String,
    pub columns: HashMap<String, Column>,
    pub primary_key: Option<String>,
    pub timestamps: bool,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }
}

impl From<TableSpec> for Table {
    fn from(spec: TableSpec) -> Self {
        let columns = spec
            .columns
            .into_iter()
            .map(|mut col| {
                if col.business_name.is_empty() {
                    col.business_name = col.name.clone();
                }
                (col.name.clone(), col)
            })
            .collect();

        Self {
            name: spec.name,
            business_name: spec.business_name,
            description: spec.description,
            columns,
            primary_key: spec.primary_key,
            timestamps: spec.timestamps,
        }
    }
}

/// Cardinality classification of a table-to-table link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// Relationship between two tables.
///
/// Fields are directional, but reachability treats the link as undirected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    #[serde(alias = "sourceTable")]
    pub source_table: String,
    #[serde(alias = "targetTable")]
    pub target_table: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    #[serde(alias = "sourceKey")]
    pub source_key: String,
    #[serde(alias = "targetKey")]
    pub target_key: String,
    /// Bridge table, expected for MANY_TO_MANY
    #[serde(default, alias = "joinTable")]
    pub join_table: Option<String>,
    #[serde(default, alias = "businessDescription")]
    pub business_description: String,
}

impl Relationship {
    pub fn new(
        name: impl Into<String>,
        source_table: impl Into<String>,
        target_table: impl Into<String>,
        relationship_type: RelationshipType,
        source_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_table: source_table.into(),
            target_table: target_table.into(),
            relationship_type,
            source_key: source_key.into(),
            target_key: target_key.into(),
            join_table: None,
            business_description: String::new(),
        }
    }

    /// Whether `table` is either endpoint of this relationship
    pub fn touches(&self, table: &str) -> bool {
        self.source_table == table || self.target_table == table
    }

    /// Join condition in `source.key = target.key` form
    pub fn join_condition(&self) -> String {
        format!(
            "{}.{} = {}.{}",
            self.source_table, self.source_key, self.target_table, self.target_key
        )
    }
}

/// Table role inside a business concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptTable {
    #[serde(alias = "name", alias = "tableName")]
    pub table_name: String,
    #[serde(default)]
    pub role: String,
    /// Raw filter predicates, interpolated verbatim into WHERE clauses
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// Metric reference carried by a concept; calculation metadata is duplicated
/// at registration rather than looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMetric {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub calculation: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub aggregation: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConcept {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tables: Vec<ConceptTable>,
    #[serde(default)]
    pub metrics: Vec<ConceptMetric>,
    /// Example phrasings that also select this concept
    #[serde(default, alias = "commonQueries")]
    pub common_queries: Vec<String>,
}

impl BusinessConcept {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tables: Vec::new(),
            metrics: Vec::new(),
            common_queries: Vec::new(),
        }
    }

    pub fn with_table(mut self, table_name: impl Into<String>, role: impl Into<String>) -> Self {
        self.tables.push(ConceptTable {
            table_name: table_name.into(),
            role: role.into(),
            conditions: Vec::new(),
        });
        self
    }

    /// Attach a filter predicate to the most recently added table role
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        if let Some(table) = self.tables.last_mut() {
            table.conditions.push(condition.into());
        }
        self
    }

    pub fn with_common_query(mut self, phrasing: impl Into<String>) -> Self {
        self.common_queries.push(phrasing.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    Simple,
    Calculated,
    Derived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDependency {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    /// Raw calculation text, e.g. `SUM(orders.amount)`
    pub calculation: String,
    #[serde(default)]
    pub dependencies: Vec<MetricDependency>,
    #[serde(default)]
    pub validations: Vec<String>,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        metric_type: MetricType,
        calculation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metric_type,
            calculation: calculation.into(),
            dependencies: Vec::new(),
            validations: Vec::new(),
        }
    }

    pub fn with_dependency(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.dependencies.push(MetricDependency {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}
