//! In-process store implementation
//!
//! Mirrors the remote store's semantics closely enough for tests and offline
//! runs: last write wins per (measurement, tag set, timestamp), queries
//! filter on measurement, field, symbol and time range, and `count()`
//! reduces each series to a record count. Failure injection switches let
//! tests exercise the fail-closed paths.

use super::{FluxQuery, Point, Record, StoreError, Table, TimeSeriesStore, Value};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

type SeriesKey = (String, Vec<(String, String)>, i64);

#[derive(Default)]
struct Inner {
    points: BTreeMap<SeriesKey, Point>,
    write_batches: usize,
    fail_writes: bool,
    fail_queries: bool,
}

/// In-memory [`TimeSeriesStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with a `WriteError`.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().expect("store lock").fail_writes = fail;
    }

    /// Make subsequent queries fail with a `QueryError`.
    pub fn fail_queries(&self, fail: bool) {
        self.inner.lock().expect("store lock").fail_queries = fail;
    }

    /// Number of distinct stored points.
    pub fn point_count(&self) -> usize {
        self.inner.lock().expect("store lock").points.len()
    }

    /// Number of write batches accepted.
    pub fn write_batches(&self) -> usize {
        self.inner.lock().expect("store lock").write_batches
    }

    /// Snapshot of all stored points in key order.
    pub fn points(&self) -> Vec<Point> {
        self.inner
            .lock()
            .expect("store lock")
            .points
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryStore {
    async fn ping(&self) -> bool {
        true
    }

    async fn write(&self, _bucket: &str, _org: &str, points: &[Point]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        if inner.fail_writes {
            return Err(StoreError::Write("injected write failure".to_string()));
        }
        if points.is_empty() {
            return Ok(());
        }
        inner.write_batches += 1;
        for point in points {
            let key = (
                point.measurement.clone(),
                point
                    .tags
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                point.timestamp.timestamp(),
            );
            // Same series + timestamp: merge fields, new values win.
            match inner.points.get_mut(&key) {
                Some(existing) => {
                    for (k, v) in &point.fields {
                        existing.fields.insert(k.clone(), v.clone());
                    }
                }
                None => {
                    inner.points.insert(key, point.clone());
                }
            }
        }
        Ok(())
    }

    async fn query(&self, _org: &str, query: &FluxQuery) -> Result<Vec<Table>, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        if inner.fail_queries {
            return Err(StoreError::Query("injected query failure".to_string()));
        }

        let now = Utc::now();
        let start = query
            .range
            .start
            .resolve(now)
            .ok_or_else(|| StoreError::Query("unresolvable range start".to_string()))?;
        let stop = query
            .range
            .stop
            .resolve(now)
            .ok_or_else(|| StoreError::Query("unresolvable range stop".to_string()))?;

        let measurements: Vec<&str> = query.measurements.iter().map(|m| m.as_str()).collect();

        // Group records per (measurement, symbol, field) the way the remote
        // store groups series into result tables.
        let mut groups: BTreeMap<(String, String, String), Vec<Record>> = BTreeMap::new();
        for point in inner.points.values() {
            if !measurements.is_empty() && !measurements.contains(&point.measurement.as_str()) {
                continue;
            }
            if point.timestamp < start || point.timestamp >= stop {
                continue;
            }
            let symbol = point.tags.get("symbol").cloned().unwrap_or_default();
            if !query.symbols.is_empty() && !query.symbols.contains(&symbol) {
                continue;
            }
            for (field, value) in &point.fields {
                if !query.fields.is_empty() && !query.fields.contains(field) {
                    continue;
                }
                groups
                    .entry((point.measurement.clone(), symbol.clone(), field.clone()))
                    .or_default()
                    .push(Record {
                        measurement: point.measurement.clone(),
                        field: field.clone(),
                        value: value.clone(),
                        time: point.timestamp,
                        tags: point.tags.clone(),
                    });
            }
        }

        let tables = groups
            .into_values()
            .map(|mut records| {
                records.sort_by_key(|r| r.time);
                if query.count {
                    let count = records.len() as i64;
                    let last = records.last().expect("non-empty group").clone();
                    Table {
                        records: vec![Record {
                            value: Value::Integer(count),
                            time: stop,
                            ..last
                        }],
                    }
                } else {
                    Table { records }
                }
            })
            .collect();

        Ok(tables)
    }
}
