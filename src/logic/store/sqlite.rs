//! SQLite store
//!
//! One SQLite table per logical table. Each row is kept as a JSON document in
//! `data`; keyed tables also fill the unique `row_key` column so upserts
//! replace in place. Filters run through `json_extract`.
//!
//! rusqlite is blocking, so every call hops onto `spawn_blocking`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;

use super::{FilterOp, PersistentStore, Query, Row, Table};
use crate::logic::error::StoreError;

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)?;
        log::info!("Opened drift store: {:?}", path);
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        for table in Table::ALL {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {name} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    row_key TEXT UNIQUE,
                    data TEXT NOT NULL
                );",
                name = table.name()
            ))?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl PersistentStore for SqliteStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        let key = table.row_key(&row);
        let data = serde_json::to_string(&row)?;

        self.blocking(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (row_key, data) VALUES (?1, ?2)
                     ON CONFLICT(row_key) DO UPDATE SET data = excluded.data",
                    table.name()
                ),
                params![key, data],
            )?;
            Ok(())
        })
        .await
    }

    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        let (sql, values) = build_select(&query)?;

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let docs = stmt
                .query_map(params_from_iter(values.iter()), |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<String>, _>>()?;

            docs.into_iter()
                .map(|doc| match serde_json::from_str::<Value>(&doc)? {
                    Value::Object(map) => Ok(map),
                    _ => Err(StoreError::InvalidRow(query.table.name())),
                })
                .collect()
        })
        .await
    }
}

fn build_select(query: &Query) -> Result<(String, Vec<SqlValue>), StoreError> {
    let mut sql = format!("SELECT data FROM {}", query.table.name());
    let mut values = Vec::with_capacity(query.filters.len());

    for (i, filter) in query.filters.iter().enumerate() {
        if !is_valid_column(&filter.column) {
            return Err(StoreError::InvalidColumn(filter.column.clone()));
        }
        let op = match filter.op {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        };
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&format!(
            "json_extract(data, '$.{}') {} ?{}",
            filter.column,
            op,
            i + 1
        ));
        values.push(to_sql_value(&filter.value));
    }

    sql.push_str(" ORDER BY id");
    Ok((sql, values))
}

fn is_valid_column(column: &str) -> bool {
    !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_filter() {
        let store = SqliteStore::open_in_memory().unwrap();

        store
            .upsert(
                Table::BaselineDistributions,
                row(json!({"model_name": "m", "feature_name": "age", "distribution_json": "[1.0]"})),
            )
            .await
            .unwrap();
        store
            .upsert(
                Table::BaselineDistributions,
                row(json!({"model_name": "m", "feature_name": "age", "distribution_json": "[2.0]"})),
            )
            .await
            .unwrap();
        store
            .upsert(
                Table::BaselineDistributions,
                row(json!({"model_name": "other", "feature_name": "age", "distribution_json": "[3.0]"})),
            )
            .await
            .unwrap();

        let rows = store
            .select(Query::table(Table::BaselineDistributions).eq("model_name", "m"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["distribution_json"], json!("[2.0]"));
    }

    #[tokio::test]
    async fn test_range_filters() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (ts, retrain) in [
            ("2026-10-18T08:00:00.000000Z", false),
            ("2026-10-18T09:00:00.000000Z", true),
            ("2026-10-18T10:00:00.000000Z", true),
        ] {
            store
                .upsert(
                    Table::DriftReports,
                    row(json!({"model_name": "m", "detection_timestamp": ts, "requires_retraining": retrain})),
                )
                .await
                .unwrap();
        }

        let rows = store
            .select(
                Query::table(Table::DriftReports)
                    .gte("detection_timestamp", "2026-10-18T09:00:00.000000Z")
                    .eq("requires_retraining", true),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["detection_timestamp"], json!("2026-10-18T09:00:00.000000Z"));
    }

    #[tokio::test]
    async fn test_rejects_injected_column() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store
            .select(Query::table(Table::DriftReports).eq("x') OR 1=1 --", "m"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidColumn(_))));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drift.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .upsert(Table::BaselinePerformance, row(json!({"model_name": "m", "baseline_score": 0.9})))
                .await
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let rows = reopened
            .select(Query::table(Table::BaselinePerformance))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["baseline_score"], json!(0.9));
    }
}
