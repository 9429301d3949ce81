//! In-memory store
//!
//! Same semantics as the SQLite store: upsert on key columns, append
//! otherwise, filters evaluated per row.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{PersistentStore, Query, Row, Table};
use crate::logic::error::StoreError;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, table: Table) -> usize {
        self.tables.read().get(&table).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().values().all(Vec::is_empty)
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();

        if let Some(key) = table.row_key(&row) {
            if let Some(existing) = rows
                .iter_mut()
                .find(|r| table.row_key(r).as_deref() == Some(key.as_str()))
            {
                *existing = row;
                return Ok(());
            }
        }

        rows.push(row);
        Ok(())
    }

    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_keyed_rows() {
        let store = MemoryStore::new();
        store
            .upsert(Table::BaselinePerformance, row(json!({"model_name": "m", "baseline_score": 0.9})))
            .await
            .unwrap();
        store
            .upsert(Table::BaselinePerformance, row(json!({"model_name": "m", "baseline_score": 0.8})))
            .await
            .unwrap();

        let rows = store
            .select(Query::table(Table::BaselinePerformance).eq("model_name", "m"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["baseline_score"], json!(0.8));
    }

    #[tokio::test]
    async fn test_append_only_tables() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            store
                .upsert(Table::DriftReports, row(json!({"model_name": "m"})))
                .await
                .unwrap();
        }
        assert_eq!(store.len(Table::DriftReports), 3);
        assert_eq!(store.len(Table::PredictionTracking), 0);
    }
}
