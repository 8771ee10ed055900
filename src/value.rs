use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt::Write as _;

/// One decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(String),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    Interval {
        months: i32,
        days: i32,
        microseconds: i64,
    },
    Array(Vec<Value>),
}

impl Value {
    /// Text form used for everything JSON has no native encoding for.
    pub fn display_string(&self) -> Option<String> {
        match self {
            Value::Decimal(d) => Some(d.clone()),
            Value::Bytes(bytes) => {
                let mut hex = String::with_capacity(2 + bytes.len() * 2);
                hex.push_str("\\x");
                for byte in bytes {
                    let _ = write!(hex, "{:02x}", byte);
                }
                Some(hex)
            }
            Value::Uuid(u) => Some(u.hyphenated().to_string()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => Some(t.format("%H:%M:%S%.f").to_string()),
            Value::DateTime(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::DateTimeUtc(dt) => Some(dt.to_rfc3339()),
            Value::Interval {
                months,
                days,
                microseconds,
            } => Some(interval_string(*months, *days, *microseconds)),
            Value::Float32(f) if !f.is_finite() => Some(f.to_string()),
            Value::Float64(f) if !f.is_finite() => Some(f.to_string()),
            _ => None,
        }
    }
}

/// PostgreSQL's default interval style: `1 year 2 mons 3 days 04:05:06.5`.
fn interval_string(months: i32, days: i32, microseconds: i64) -> String {
    let mut out = String::new();
    let mut negative_before = false;

    for (value, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if value == 0 {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        if negative_before && value > 0 {
            out.push('+');
        }
        let _ = write!(out, "{} {}{}", value, unit, if value == 1 { "" } else { "s" });
        negative_before = value < 0;
    }

    if out.is_empty() || microseconds != 0 {
        if !out.is_empty() {
            out.push(' ');
        }
        if microseconds < 0 {
            out.push('-');
        } else if negative_before {
            out.push('+');
        }
        let total = microseconds.unsigned_abs();
        let seconds = total / 1_000_000;
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60
        );
        let fraction = total % 1_000_000;
        if fraction != 0 {
            let digits = format!("{:06}", fraction);
            out.push('.');
            out.push_str(digits.trim_end_matches('0'));
        }
    }
    out
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(text) = self.display_string() {
            return serializer.serialize_str(&text);
        }

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int16(i) => serializer.serialize_i16(*i),
            Value::Int32(i) => serializer.serialize_i32(*i),
            Value::Int64(i) => serializer.serialize_i64(*i),
            Value::Float32(f) => serializer.serialize_f32(*f),
            Value::Float64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Json(json) => json.serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            // Stringified above.
            _ => serializer.serialize_unit(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
