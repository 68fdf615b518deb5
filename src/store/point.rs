//! Store point representation and line-protocol encoding

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// String view of the value, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value, if it is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// A single timestamped record destined for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    /// Indexed labels; BTreeMap keeps line-protocol output deterministic.
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Start a point for the given measurement at the given time.
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Render as one line of InfluxDB line protocol with second precision.
    ///
    /// Measurement, tag keys/values and field keys escape commas, spaces and
    /// equals signs; string field values escape quotes and backslashes.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_key(&self.measurement);
        for (k, v) in &self.tags {
            let _ = write!(line, ",{}={}", escape_key(k), escape_key(v));
        }
        line.push(' ');
        let mut first = true;
        for (k, v) in &self.fields {
            if !first {
                line.push(',');
            }
            first = false;
            let _ = write!(line, "{}=", escape_key(k));
            match v {
                Value::Float(f) => {
                    let _ = write!(line, "{}", f);
                }
                Value::Integer(i) => {
                    let _ = write!(line, "{}i", i);
                }
                Value::Text(s) => {
                    let _ = write!(line, "\"{}\"", escape_string(s));
                }
                Value::Bool(b) => {
                    let _ = write!(line, "{}", b);
                }
            }
        }
        let _ = write!(line, " {}", self.timestamp.timestamp());
        line
    }
}

fn escape_key(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
        .replace('=', "\\=")
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
