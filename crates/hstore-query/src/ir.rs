//! JSON form of filter expressions (for tooling and the CLI).
//!
//! ```json
//! {"or": [
//!   {"data__color": "red", "data__size__gt": 10},
//!   {"not": {"data__contains": ["discontinued"]}}
//! ]}
//! ```
//!
//! - an object of `path: value` pairs is the keyword form (AND of leaves),
//! - `{"and": [..]}` / `{"or": [..]}` combine expressions,
//! - `{"not": expr}` negates one.
//!
//! Temporal values use the tagged objects accepted by
//! [`FilterValue::from_json`].

use serde_json::Value;

use crate::error::{Error, Result};
use crate::expr::{Operand, HQ};
use crate::lookup::Connector;
use crate::value::FilterValue;

pub fn parse_filter_json(text: &str) -> Result<HQ> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Json(e.to_string()))?;
    filter_from_json(&value)
}

pub fn filter_from_json(value: &Value) -> Result<HQ> {
    let Value::Object(map) = value else {
        return Err(Error::TypeMismatch(format!("JSON {value}")));
    };

    if let (1, Some((head, inner))) = (map.len(), map.iter().next()) {
        match head.as_str() {
            "and" => return combinator(inner, Connector::And),
            "or" => return combinator(inner, Connector::Or),
            "not" => return Ok(filter_from_json(inner)?.negate()),
            _ => {}
        }
    }

    let pairs = map
        .iter()
        .map(|(path, v)| Ok((path.clone(), FilterValue::from_json(v)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(HQ::new(pairs))
}

fn combinator(operands: &Value, connector: Connector) -> Result<HQ> {
    let Value::Array(items) = operands else {
        return Err(Error::Json(format!(
            "`{}` expects an array of expressions",
            connector.as_sql().to_lowercase()
        )));
    };
    let children = items
        .iter()
        .map(|item| {
            let operand = match item {
                Value::Object(_) => Operand::Expr(filter_from_json(item)?),
                other => Operand::Value(FilterValue::from_json(other)?),
            };
            HQ::try_from(operand)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(HQ::node(connector, children))
}
