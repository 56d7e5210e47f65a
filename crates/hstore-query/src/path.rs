//! Lookup paths: `relation__...__column__key[__lookup]`.
//!
//! A trailing token that spells a lookup type (`gt`, `in`, ...) is only a
//! lookup type if the schema says so. The path is walked field by field from
//! the query's model; the token is taken as the lookup type once a segment
//! fails to resolve as a field, or a segment that must be a relation is not
//! one. If every segment resolves, the token is a field name and the lookup
//! stays `exact`.
//!
//! After that, every lookup except `contains` consumes the last remaining
//! segment as the map key.

use crate::error::{Error, Result};
use crate::host::Schema;
use crate::lookup::{LookupType, LOOKUP_SEP};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPath {
    /// Relation traversal ending on the map column.
    pub relations: Vec<String>,
    pub lookup: LookupType,
    /// `None` only for `contains`.
    pub key: Option<String>,
}

pub fn split_path(path: &str) -> Result<Vec<String>> {
    if path.is_empty() {
        return Err(Error::malformed(path, "empty path"));
    }
    let parts: Vec<String> = path.split(LOOKUP_SEP).map(str::to_string).collect();
    if parts.iter().any(String::is_empty) {
        return Err(Error::malformed(path, "empty path segment"));
    }
    Ok(parts)
}

pub fn parse_lookup_path(path: &str, schema: &dyn Schema, model: &str) -> Result<LookupPath> {
    let mut parts = split_path(path)?;
    let mut lookup = LookupType::default();

    let num_parts = parts.len();
    let candidate = parts.last().and_then(|t| LookupType::from_token(t));
    if let (true, Some(candidate)) = (num_parts > 1, candidate) {
        let mut current = model.to_string();
        let mut index = 0;
        let mut stopped = false;
        while index < num_parts && !stopped {
            match schema.get_field(&current, &parts[index]) {
                Err(_) => stopped = true,
                Ok(field) if index + 1 < num_parts => match field.related_model {
                    Some(next) => current = next,
                    None => stopped = true,
                },
                Ok(_) => {}
            }
            index += 1;
        }
        if stopped {
            parts.pop();
            lookup = candidate;
        }
    }

    let key = match lookup {
        LookupType::Contains => None,
        _ => parts.pop(),
    };
    if parts.is_empty() {
        return Err(Error::malformed(path, "no column to filter on"));
    }

    Ok(LookupPath {
        relations: parts,
        lookup,
        key,
    })
}
