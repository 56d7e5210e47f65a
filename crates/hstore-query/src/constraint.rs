//! Per-leaf compiler: one resolved column + map key + value + lookup type
//! becomes one boolean SQL expression and its bound parameters.
//!
//! The map value extracted with `->` is always text. When the comparison value
//! is numeric or temporal the *extracted* side is cast (never the parameter),
//! and empty strings are turned into NULL first so an absent/empty key
//! compares as NULL instead of failing the cast:
//!
//! ```text
//! CAST(NULLIF("t"."data"->'size','') AS integer) > %s
//! lower("t"."data"->'color') = %s
//! "t"."data" ?& %s
//! ```

use serde::Serialize;

use crate::error::{Error, Result};
use crate::lookup::{CastType, LookupType, Operator};
use crate::value::FilterValue;

/// A bound parameter. Every parameter is rendered as one `%s`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Param {
    Value(FilterValue),
    /// Operand of `IN`.
    Tuple(Vec<FilterValue>),
    /// Operand of `?&`.
    Array(Vec<FilterValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lhs {
    /// The whole map column (key-set tests).
    Column,
    Extract,
    Lower,
    Cast(CastType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HStoreConstraint {
    alias: Option<String>,
    column: String,
    key: Option<String>,
    lhs: Lhs,
    operator: Operator,
    values: Vec<Param>,
}

impl HStoreConstraint {
    pub fn new(
        alias: Option<String>,
        column: impl Into<String>,
        value: FilterValue,
        lookup: LookupType,
        key: Option<String>,
    ) -> Result<Self> {
        let column = column.into();
        let invalid = |v: &FilterValue| Error::InvalidValue {
            value: v.to_string(),
            lookup: lookup.to_string(),
        };

        let Some(operator) = lookup.value_operator() else {
            let (operator, param) = match value {
                FilterValue::Text(s) => (Operator::HasKey, Param::Value(FilterValue::Text(s))),
                FilterValue::List(items) => (Operator::HasAllKeys, Param::Array(items)),
                other => return Err(invalid(&other)),
            };
            return Ok(Self::build(alias, column, None, Lhs::Column, operator, param));
        };

        let Some(key) = key else {
            return Err(Error::malformed(
                &column,
                format!("`{lookup}` lookup needs a map key"),
            ));
        };

        let (cast, param) = if lookup == LookupType::In {
            let items = match value {
                FilterValue::List(items) => items,
                other => return Err(invalid(&other)),
            };
            let cast = match items.first() {
                Some(first) => cast_type_for(first).ok_or_else(|| invalid(first))?,
                None => None,
            };
            (cast, Param::Tuple(items))
        } else {
            let cast = cast_type_for(&value).ok_or_else(|| invalid(&value))?;
            (cast, Param::Value(value))
        };

        let constraint = match (cast, param) {
            (Some(cast), param) => {
                Self::build(alias, column, Some(key), Lhs::Cast(cast), operator, param)
            }
            (None, Param::Value(FilterValue::Text(s))) if lookup == LookupType::IExact => {
                let lowered = Param::Value(FilterValue::Text(s.to_lowercase()));
                Self::build(alias, column, Some(key), Lhs::Lower, operator, lowered)
            }
            (None, Param::Tuple(items)) if items.is_empty() => {
                // `x IN ()` is not valid SQL; fall back to a key test.
                let param = Param::Value(FilterValue::Text(key.clone()));
                Self::build(alias, column, Some(key), Lhs::Column, Operator::HasKey, param)
            }
            (None, param) => Self::build(alias, column, Some(key), Lhs::Extract, operator, param),
        };

        tracing::trace!(
            lookup = %lookup,
            operator = %constraint.operator,
            cast = ?constraint.cast_type(),
            "compiled hstore constraint"
        );
        Ok(constraint)
    }

    fn build(
        alias: Option<String>,
        column: String,
        key: Option<String>,
        lhs: Lhs,
        operator: Operator,
        param: Param,
    ) -> Self {
        Self {
            alias,
            column,
            key,
            lhs,
            operator,
            values: vec![param],
        }
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn cast_type(&self) -> Option<CastType> {
        match self.lhs {
            Lhs::Cast(cast) => Some(cast),
            _ => None,
        }
    }

    pub fn values(&self) -> &[Param] {
        &self.values
    }

    pub fn sql_for_column(&self, quote: impl Fn(&str) -> String) -> String {
        match &self.alias {
            Some(alias) => format!("{}.{}", quote(alias), quote(&self.column)),
            None => quote(&self.column),
        }
    }

    /// Render as `(sql, params)`, one `%s` per parameter.
    pub fn as_sql(&self, quote: impl Fn(&str) -> String) -> (String, Vec<Param>) {
        let column = self.sql_for_column(quote);
        let key = self.key.as_deref().unwrap_or_default();
        let lhs = match self.lhs {
            Lhs::Column => column,
            Lhs::Extract => extract(&column, key),
            Lhs::Lower => format!("lower({})", extract(&column, key)),
            Lhs::Cast(cast) => format!("CAST(NULLIF({},'') AS {cast})", extract(&column, key)),
        };
        (format!("{lhs} {} %s", self.operator), self.values.clone())
    }
}

/// `Some(None)`: compare as text. `None`: unsupported kind.
fn cast_type_for(value: &FilterValue) -> Option<Option<CastType>> {
    match value {
        FilterValue::DateTime(_) => Some(Some(CastType::Timestamp)),
        FilterValue::Date(_) => Some(Some(CastType::Date)),
        FilterValue::Time(_) => Some(Some(CastType::Time)),
        FilterValue::Int(_) => Some(Some(CastType::Integer)),
        FilterValue::Float(_) => Some(Some(CastType::DoublePrecision)),
        FilterValue::Text(_) => Some(None),
        FilterValue::Null | FilterValue::Bool(_) | FilterValue::List(_) | FilterValue::Map(_) => {
            None
        }
    }
}

/// `<column>->'<key>'`, with the key escaped as a string literal.
pub fn extract(column: &str, key: &str) -> String {
    format!("{column}->'{}'", escape_key(key))
}

/// Quote doubling for the literal, `%` doubling for the `%s` convention.
pub(crate) fn escape_key(key: &str) -> String {
    key.replace('\'', "''").replace('%', "%%")
}
