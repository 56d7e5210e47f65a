//! hstore filter compilation.
//!
//! Turns keyword-style lookups on a key-value (`hstore`) column into SQL
//! WHERE fragments:
//!
//! ```text
//! data__color__iexact = "Red"   ->  lower("items"."data"->'color') = %s      ["red"]
//! data__size__gt      = 10      ->  CAST(NULLIF("items"."data"->'size','') AS integer) > %s
//! data__contains      = [a, b]  ->  "items"."data" ?& %s                     [[a, b]]
//! ```
//!
//! Layers, leaf first:
//! - [`constraint`]: one resolved column + key + value + lookup type → one
//!   SQL expression and its parameters.
//! - [`path`]: splitting `relation__column__key__lookup` with the schema
//!   deciding what the trailing token means.
//! - [`expr`]: AND/OR/NOT trees of lookups, attached to a host query.
//!
//! The host query engine (schema metadata, joins, WHERE tree, quoting) is
//! abstracted by the traits in [`host`]; `hstore-sql` provides one.

pub mod constraint;
pub mod error;
pub mod expr;
pub mod host;
pub mod ir;
pub mod lookup;
pub mod path;
pub mod projection;
pub mod value;

pub use constraint::{HStoreConstraint, Param};
pub use error::{Error, FieldNotFound, Result};
pub use expr::{compile_leaf, Operand, HQ};
pub use host::{
    quote_name, Field, JoinPath, QueryHost, QuerySet, ResolvedColumn, Schema, WhereTree,
};
pub use ir::{filter_from_json, parse_filter_json};
pub use lookup::{CastType, Connector, LookupType, Operator, LOOKUP_SEP};
pub use path::{parse_lookup_path, LookupPath};
pub use projection::add_hstore;
pub use value::FilterValue;
