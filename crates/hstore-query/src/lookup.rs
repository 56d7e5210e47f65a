//! Lookup tokens, comparison operators, casts and connectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Separator between segments of a lookup path (`data__color__iexact`).
pub const LOOKUP_SEP: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupType {
    #[default]
    Exact,
    IExact,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Contains,
}

impl LookupType {
    /// Recognised tokens. `exact` comes first; it is the default.
    pub const ALL: [LookupType; 8] = [
        LookupType::Exact,
        LookupType::IExact,
        LookupType::Lt,
        LookupType::Lte,
        LookupType::Gt,
        LookupType::Gte,
        LookupType::In,
        LookupType::Contains,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == token)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LookupType::Exact => "exact",
            LookupType::IExact => "iexact",
            LookupType::Lt => "lt",
            LookupType::Lte => "lte",
            LookupType::Gt => "gt",
            LookupType::Gte => "gte",
            LookupType::In => "in",
            LookupType::Contains => "contains",
        }
    }

    /// Operator used when comparing an extracted value; `None` for
    /// `contains`, which tests the key set instead.
    pub fn value_operator(self) -> Option<Operator> {
        match self {
            LookupType::Exact | LookupType::IExact => Some(Operator::Eq),
            LookupType::Lt => Some(Operator::Lt),
            LookupType::Lte => Some(Operator::Lte),
            LookupType::Gt => Some(Operator::Gt),
            LookupType::Gte => Some(Operator::Gte),
            LookupType::In => Some(Operator::In),
            LookupType::Contains => None,
        }
    }
}

impl FromStr for LookupType {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::from_token(token).ok_or_else(|| Error::InvalidLookupType(token.to_string()))
    }
}

impl fmt::Display for LookupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Eq,
    In,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `?`
    HasKey,
    /// `?&`
    HasAllKeys,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::In => "IN",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::HasKey => "?",
            Operator::HasAllKeys => "?&",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// SQL type an extracted (text) map value is cast to before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CastType {
    Timestamp,
    Date,
    Time,
    Integer,
    DoublePrecision,
}

impl CastType {
    pub fn as_sql(self) -> &'static str {
        match self {
            CastType::Timestamp => "timestamp",
            CastType::Date => "date",
            CastType::Time => "time",
            CastType::Integer => "integer",
            CastType::DoublePrecision => "double precision",
        }
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
