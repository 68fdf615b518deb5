//! Typed Flux query builder
//!
//! Query structure is assembled from typed parts and rendered to Flux in one
//! place, so call sites never concatenate query fragments and symbol names
//! are always quoted/escaped.

use super::Measurement;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use std::fmt::Write as _;

/// A point in time as the store understands it: an absolute instant, a
/// store-native relative expression like `-30d`, or `now()`.
#[derive(Debug, Clone, PartialEq)]
pub enum FluxTime {
    Absolute(DateTime<Utc>),
    Relative(String),
    Now,
}

impl FluxTime {
    fn render(&self) -> String {
        match self {
            FluxTime::Absolute(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
            FluxTime::Relative(expr) => expr.clone(),
            FluxTime::Now => "now()".to_string(),
        }
    }

    /// Resolve to a concrete instant relative to `now`. Relative expressions
    /// support the `-<n><unit>` forms with unit s/m/h/d/w.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            FluxTime::Absolute(t) => Some(*t),
            FluxTime::Now => Some(now),
            FluxTime::Relative(expr) => {
                let body = expr.strip_prefix('-')?;
                let split = body.len().checked_sub(1)?;
                let (num, unit) = body.split_at(split);
                let n: i64 = num.parse().ok()?;
                let delta = match unit {
                    "s" => Duration::seconds(n),
                    "m" => Duration::minutes(n),
                    "h" => Duration::hours(n),
                    "d" => Duration::days(n),
                    "w" => Duration::weeks(n),
                    _ => return None,
                };
                Some(now - delta)
            }
        }
    }
}

/// Half-open query window `[start, stop)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub start: FluxTime,
    pub stop: FluxTime,
}

impl TimeRange {
    pub fn new(start: FluxTime, stop: FluxTime) -> Self {
        Self { start, stop }
    }

    pub fn absolute(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self {
            start: FluxTime::Absolute(start),
            stop: FluxTime::Absolute(stop),
        }
    }

    /// Window covering the inclusive date range `[start, end]` as the
    /// half-open instant range `[start 00:00, end+1d 00:00)`.
    pub fn dates(start: NaiveDate, end: NaiveDate) -> Self {
        let start = start.and_hms_opt(0, 0, 0).expect("midnight").and_utc();
        let stop = (end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .expect("midnight")
            .and_utc();
        Self::absolute(start, stop)
    }
}

/// A range query over one bucket: measurement, field and symbol filters plus
/// an optional count aggregate.
#[derive(Debug, Clone)]
pub struct FluxQuery {
    pub bucket: String,
    pub range: TimeRange,
    pub measurements: Vec<Measurement>,
    pub fields: Vec<String>,
    pub symbols: Vec<String>,
    pub count: bool,
}

impl FluxQuery {
    pub fn new(bucket: impl Into<String>, range: TimeRange) -> Self {
        Self {
            bucket: bucket.into(),
            range,
            measurements: Vec::new(),
            fields: Vec::new(),
            symbols: Vec::new(),
            count: false,
        }
    }

    pub fn measurement(mut self, measurement: Measurement) -> Self {
        self.measurements.push(measurement);
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbols.push(symbol.into());
        self
    }

    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// Reduce each series to its record count instead of returning values.
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Render to Flux source.
    pub fn to_flux(&self) -> String {
        let mut q = format!("from(bucket: \"{}\")", escape(&self.bucket));
        let _ = write!(
            q,
            "\n  |> range(start: {}, stop: {})",
            self.range.start.render(),
            self.range.stop.render()
        );
        if !self.measurements.is_empty() {
            let clause = self
                .measurements
                .iter()
                .map(|m| format!("r[\"_measurement\"] == \"{}\"", m.as_str()))
                .collect::<Vec<_>>()
                .join(" or ");
            let _ = write!(q, "\n  |> filter(fn: (r) => {})", clause);
        }
        if !self.fields.is_empty() {
            let clause = self
                .fields
                .iter()
                .map(|f| format!("r[\"_field\"] == \"{}\"", escape(f)))
                .collect::<Vec<_>>()
                .join(" or ");
            let _ = write!(q, "\n  |> filter(fn: (r) => {})", clause);
        }
        if !self.symbols.is_empty() {
            let set = self
                .symbols
                .iter()
                .map(|s| format!("\"{}\"", escape(s)))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(
                q,
                "\n  |> filter(fn: (r) => contains(value: r[\"symbol\"], set: [{}]))",
                set
            );
        }
        if self.count {
            q.push_str("\n  |> count()");
        }
        q
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
