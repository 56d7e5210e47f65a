//! Errors raised while building and compiling filter expressions.
//!
//! Everything here is raised eagerly, at query-construction time, before any
//! SQL reaches a database.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The filter value's kind is not supported by the chosen lookup.
    #[error("invalid value {value} for `{lookup}` lookup")]
    InvalidValue { value: String, lookup: String },

    #[error("invalid lookup type `{0}`")]
    InvalidLookupType(String),

    #[error("cannot parse keyword query `{path}`: {reason}")]
    MalformedPath { path: String, reason: String },

    /// An expression was combined with something that is not an expression.
    #[error("cannot combine a filter expression with {0}")]
    TypeMismatch(String),

    /// The host engine could not resolve a relation path.
    #[error("cannot resolve keyword `{name}` into field on `{model}`")]
    FieldError { model: String, name: String },

    #[error("cannot change a query once a slice has been taken")]
    SlicedQuery,

    #[error("invalid filter JSON: {0}")]
    Json(String),
}

impl Error {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Error::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// A schema lookup miss.
///
/// Kept apart from [`Error`]: the path walk treats a missing field as a
/// branch (the segment is a lookup type), not as a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("`{model}` has no field named `{name}`")]
pub struct FieldNotFound {
    pub model: String,
    pub name: String,
}
