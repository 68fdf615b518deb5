//! HTTP gateway to an InfluxDB 2.x-compatible store
//!
//! Writes use the line protocol at second precision; queries go through the
//! Flux endpoint and come back as annotated CSV, which is decoded into
//! [`Table`]s here.

use super::{FluxQuery, Point, Record, StoreError, Table, TimeSeriesStore, Value};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Connection settings for the store gateway.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://localhost:8086`
    pub url: String,
    /// API token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl InfluxConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the store's HTTP API.
pub struct InfluxStore {
    config: InfluxConfig,
    client: Client,
}

impl InfluxStore {
    /// Build the client. Fails if the HTTP client cannot be constructed or
    /// the URL is unusable.
    pub fn connect(config: InfluxConfig) -> Result<Self, StoreError> {
        if config.url.is_empty() {
            return Err(StoreError::Connection("store URL is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.config.token)
    }
}

#[async_trait]
impl TimeSeriesStore for InfluxStore {
    async fn ping(&self) -> bool {
        let url = format!("{}/ping", self.config.url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Store ping failed");
                false
            }
        }
    }

    async fn write(&self, bucket: &str, org: &str, points: &[Point]) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/api/v2/write", self.config.url);
        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(bucket, org, points = points.len(), "Writing batch to store");

        let resp = self
            .client
            .post(&url)
            .query(&[("org", org), ("bucket", bucket), ("precision", "s")])
            .header("Authorization", self.auth_header())
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Write(format!("{}: {}", status, body)));
        }
        Ok(())
    }

    async fn query(&self, org: &str, query: &FluxQuery) -> Result<Vec<Table>, StoreError> {
        let url = format!("{}/api/v2/query", self.config.url);
        let flux = query.to_flux();

        tracing::debug!(org, query = %flux, "Running store query");

        let resp = self
            .client
            .post(&url)
            .query(&[("org", org)])
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({
                "query": flux,
                "type": "flux",
                "dialect": { "header": true, "annotations": ["datatype"] },
            }))
            .send()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Query(format!("{}: {}", status, body)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        parse_annotated_csv(&body)
    }
}

/// Columns the store produces for every row rather than as tags.
const RESERVED_COLUMNS: &[&str] = &["", "result", "table", "_start", "_stop", "_time", "_value", "_field", "_measurement"];

/// Decode the Flux endpoint's annotated-CSV response into tables.
///
/// Each result table carries a `#datatype` annotation row followed by a
/// header row; data rows start with an empty annotation cell. Tables are
/// split on the `table` column.
pub(crate) fn parse_annotated_csv(body: &str) -> Result<Vec<Table>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut tables: Vec<Table> = Vec::new();
    let mut header: Vec<String> = Vec::new();
    let mut datatypes: Vec<String> = Vec::new();
    let mut current_table_id: Option<String> = None;

    for result in reader.records() {
        let row = result.map_err(|e| StoreError::Query(format!("bad csv: {}", e)))?;
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        let first = row.get(0).unwrap_or("");
        if first.starts_with('#') {
            if first == "#datatype" {
                datatypes = row.iter().map(str::to_string).collect();
            }
            // A fresh annotation block means a fresh header and table follow.
            header.clear();
            current_table_id = None;
            continue;
        }
        if header.is_empty() {
            header = row.iter().map(str::to_string).collect();
            continue;
        }

        let cell = |name: &str| -> Option<&str> {
            header
                .iter()
                .position(|h| h == name)
                .and_then(|i| row.get(i))
        };

        let time_raw = cell("_time")
            .ok_or_else(|| StoreError::Query("row missing _time column".to_string()))?;
        let time: DateTime<Utc> = time_raw
            .parse::<DateTime<Utc>>()
            .map_err(|e| StoreError::Query(format!("bad _time '{}': {}", time_raw, e)))?;

        let value_idx = header.iter().position(|h| h == "_value");
        let value_raw = value_idx.and_then(|i| row.get(i)).unwrap_or("");
        let value_type = value_idx
            .and_then(|i| datatypes.get(i))
            .map(String::as_str)
            .unwrap_or("string");
        let value = decode_value(value_raw, value_type)?;

        let mut tags = BTreeMap::new();
        for (i, name) in header.iter().enumerate() {
            if RESERVED_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            if let Some(v) = row.get(i) {
                if !v.is_empty() {
                    tags.insert(name.clone(), v.to_string());
                }
            }
        }

        let record = Record {
            measurement: cell("_measurement").unwrap_or_default().to_string(),
            field: cell("_field").unwrap_or_default().to_string(),
            value,
            time,
            tags,
        };

        let table_id = cell("table").unwrap_or_default().to_string();
        if current_table_id.as_deref() != Some(table_id.as_str()) || tables.is_empty() {
            tables.push(Table::default());
            current_table_id = Some(table_id);
        }
        tables
            .last_mut()
            .expect("table pushed above")
            .records
            .push(record);
    }

    Ok(tables)
}

fn decode_value(raw: &str, datatype: &str) -> Result<Value, StoreError> {
    let value = match datatype {
        "double" => Value::Float(
            raw.parse()
                .map_err(|e| StoreError::Query(format!("bad double '{}': {}", raw, e)))?,
        ),
        "long" | "unsignedLong" => Value::Integer(
            raw.parse()
                .map_err(|e| StoreError::Query(format!("bad long '{}': {}", raw, e)))?,
        ),
        "boolean" => Value::Bool(raw == "true"),
        _ => Value::Text(raw.to_string()),
    };
    Ok(value)
}
