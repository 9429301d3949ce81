//! Test doubles for the persistence boundary

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MemoryStore, PersistentStore, Query, Row, Table};
use crate::logic::error::StoreError;

/// Memory store that can be switched into an "unreachable" state
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: AtomicBool,
    pub failed_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            self.failed_calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistentStore for FlakyStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        self.check()?;
        self.inner.upsert(table, row).await
    }

    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        self.check()?;
        self.inner.select(query).await
    }
}

/// Peak number of concurrent report writes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WritePeaks {
    pub overall: usize,
    pub per_model: usize,
}

#[derive(Default)]
struct InFlight {
    overall: usize,
    by_model: HashMap<String, usize>,
    peaks: WritePeaks,
}

/// Memory store whose report writes take `delay`, counting how many overlap
pub struct SlowStore {
    pub inner: MemoryStore,
    delay: Duration,
    in_flight: Mutex<InFlight>,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    pub fn peaks(&self) -> WritePeaks {
        self.in_flight.lock().peaks
    }

    fn enter(&self, model: &str) {
        let mut state = self.in_flight.lock();
        state.overall += 1;
        let count = state.by_model.entry(model.to_string()).or_default();
        *count += 1;
        let count = *count;
        state.peaks.per_model = state.peaks.per_model.max(count);
        state.peaks.overall = state.peaks.overall.max(state.overall);
    }

    fn leave(&self, model: &str) {
        let mut state = self.in_flight.lock();
        state.overall -= 1;
        if let Some(count) = state.by_model.get_mut(model) {
            *count -= 1;
        }
    }
}

#[async_trait]
impl PersistentStore for SlowStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        if table != Table::DriftReports {
            return self.inner.upsert(table, row).await;
        }

        let model = row
            .get("model_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        self.enter(&model);
        tokio::time::sleep(self.delay).await;
        self.leave(&model);
        self.inner.upsert(table, row).await
    }

    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        self.inner.select(query).await
    }
}
