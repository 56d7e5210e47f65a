//! Filter values.
//!
//! Operator and cast selection dispatch on the *kind* of a value, so the kind
//! is fixed once, here, when the value enters the library. Everything
//! downstream is a `match` over [`FilterValue`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    List(Vec<FilterValue>),
    /// Never a valid operand; carried so mapping inputs fail loudly.
    Map(BTreeMap<String, String>),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    pub fn list<T: Into<FilterValue>>(items: impl IntoIterator<Item = T>) -> Self {
        FilterValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FilterValue::Null => "null",
            FilterValue::Bool(_) => "bool",
            FilterValue::Int(_) => "integer",
            FilterValue::Float(_) => "float",
            FilterValue::Text(_) => "text",
            FilterValue::Date(_) => "date",
            FilterValue::DateTime(_) => "datetime",
            FilterValue::Time(_) => "time",
            FilterValue::List(_) => "list",
            FilterValue::Map(_) => "map",
        }
    }

    /// Convert a JSON value.
    ///
    /// Temporal values have no JSON literal, so they are written as a
    /// single-key object: `{"$date": "2024-01-31"}`, `{"$datetime":
    /// "2024-01-31T12:00:00"}` or `{"$time": "12:00:00"}`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        Ok(match value {
            JsonValue::Null => FilterValue::Null,
            JsonValue::Bool(b) => FilterValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => FilterValue::Int(i),
                None => FilterValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => FilterValue::Text(s.clone()),
            JsonValue::Array(items) => FilterValue::List(
                items
                    .iter()
                    .map(FilterValue::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            JsonValue::Object(map) => {
                if let (1, Some((tag, inner))) = (map.len(), map.iter().next()) {
                    if let Some(parsed) = parse_temporal(tag, inner)? {
                        return Ok(parsed);
                    }
                }
                FilterValue::Map(
                    map.iter()
                        .map(|(k, v)| {
                            let v = match v {
                                JsonValue::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            (k.clone(), v)
                        })
                        .collect(),
                )
            }
        })
    }
}

fn parse_temporal(tag: &str, inner: &JsonValue) -> Result<Option<FilterValue>> {
    if !matches!(tag, "$date" | "$datetime" | "$time") {
        return Ok(None);
    }
    let JsonValue::String(s) = inner else {
        return Err(Error::Json(format!("`{tag}` expects an ISO-8601 string")));
    };
    let bad = |e: chrono::ParseError| Error::Json(format!("invalid `{tag}` value `{s}`: {e}"));
    let value = match tag {
        "$date" => FilterValue::Date(s.parse::<NaiveDate>().map_err(bad)?),
        "$datetime" => FilterValue::DateTime(
            s.parse::<NaiveDateTime>()
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .map_err(bad)?,
        ),
        _ => FilterValue::Time(s.parse::<NaiveTime>().map_err(bad)?),
    };
    Ok(Some(value))
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Null => write!(f, "null"),
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Int(i) => write!(f, "{i}"),
            FilterValue::Float(x) => write!(f, "{x}"),
            FilterValue::Text(s) => write!(f, "{s:?}"),
            FilterValue::Date(d) => write!(f, "date {d}"),
            FilterValue::DateTime(dt) => write!(f, "datetime {dt}"),
            FilterValue::Time(t) => write!(f, "time {t}"),
            FilterValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            FilterValue::Map(map) => write!(f, "{{map with {} keys}}", map.len()),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(v.into())
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        FilterValue::Date(v)
    }
}

impl From<NaiveDateTime> for FilterValue {
    fn from(v: NaiveDateTime) -> Self {
        FilterValue::DateTime(v)
    }
}

impl From<NaiveTime> for FilterValue {
    fn from(v: NaiveTime) -> Self {
        FilterValue::Time(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        FilterValue::list(v)
    }
}

impl From<BTreeMap<String, String>> for FilterValue {
    fn from(v: BTreeMap<String, String>) -> Self {
        FilterValue::Map(v)
    }
}
