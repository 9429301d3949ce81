//! Store Module - Persistence boundary
//!
//! The engine talks to storage through `PersistentStore`, a table-like async
//! interface: `upsert(table, row)` and `select(query)`. Rows are JSON objects.
//!
//! # Architecture
//! - `rows.rs`: typed rows for the four tables
//! - `memory.rs`: `MemoryStore` (tests, single-process use)
//! - `sqlite.rs`: `SqliteStore` (rusqlite, JSON rows)

pub mod rows;
pub mod memory;
pub mod sqlite;
#[cfg(test)]
pub mod testing;

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::logic::error::StoreError;

pub use memory::MemoryStore;
pub use rows::{BaselineDistributionRow, BaselinePerformanceRow, DriftReportRow, PredictionTrackingRow};
pub use sqlite::SqliteStore;

pub type Row = Map<String, Value>;

// ============================================================================
// TABLES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    BaselineDistributions,
    BaselinePerformance,
    PredictionTracking,
    DriftReports,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::BaselineDistributions,
        Table::BaselinePerformance,
        Table::PredictionTracking,
        Table::DriftReports,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::BaselineDistributions => "baseline_distributions",
            Table::BaselinePerformance => "baseline_performance",
            Table::PredictionTracking => "prediction_tracking",
            Table::DriftReports => "drift_reports",
        }
    }

    /// Columns identifying a row for upsert. Empty = append-only.
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Table::BaselineDistributions => &["model_name", "feature_name"],
            Table::BaselinePerformance => &["model_name"],
            Table::PredictionTracking | Table::DriftReports => &[],
        }
    }

    /// Joined key values of a row, `None` for append-only tables
    pub fn row_key(&self, row: &Row) -> Option<String> {
        let columns = self.key_columns();
        if columns.is_empty() {
            return None;
        }

        Some(
            columns
                .iter()
                .map(|c| match row.get(*c) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                })
                .collect::<Vec<_>>()
                .join("\u{1f}"),
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// QUERIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Does `row` satisfy this filter? Numbers compare numerically, strings
    /// lexicographically (RFC 3339 timestamps sort correctly this way).
    pub fn matches(&self, row: &Row) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };

        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Gte => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lte => matches!(
                compare_values(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// `select(table).filter(...)` builder
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, column: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

// ============================================================================
// STORE TRAIT
// ============================================================================

#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Insert, or replace the row with the same key columns
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError>;

    /// Rows matching every filter, in insertion order
    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError>;
}

/// Serialize a typed row into a JSON object
pub fn to_row<T: serde::Serialize>(table: Table, value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidRow(table.name())),
    }
}

pub fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}
