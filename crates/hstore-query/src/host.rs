//! Contracts with the host query engine.
//!
//! The compiler never allocates aliases, plans joins or renders whole
//! statements itself. It asks a [`QueryHost`] for those, and hands finished
//! constraints to the host's [`WhereTree`].

use crate::constraint::HStoreConstraint;
use crate::error::{FieldNotFound, Result};
use crate::lookup::Connector;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub column: String,
    /// Set for relation fields: the model the relation points at.
    pub related_model: Option<String>,
}

impl Field {
    pub fn plain(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            related_model: None,
        }
    }

    pub fn relation(
        name: impl Into<String>,
        column: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            related_model: Some(model.into()),
        }
    }
}

pub trait Schema {
    fn get_field(&self, model: &str, name: &str) -> Result<Field, FieldNotFound>;
}

/// Result of resolving a relation path, before trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPath {
    /// Field the path ends on.
    pub target: Field,
    /// Model owning `target`.
    pub model: String,
    /// Table aliases along the path, base alias first.
    pub joins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub column: String,
    pub alias: Option<String>,
}

pub trait WhereTree: Sized {
    fn add_node(&mut self, node: Self, connector: Connector);
    fn add_constraint(&mut self, constraint: HStoreConstraint, connector: Connector);
    fn negate(&mut self);
}

/// One query under construction.
pub trait QueryHost {
    type Where: WhereTree;

    /// Base model the query selects from.
    fn model(&self) -> &str;
    fn schema(&self) -> &dyn Schema;
    fn initial_alias(&mut self) -> String;
    fn setup_joins(
        &mut self,
        names: &[String],
        base_alias: &str,
        allow_outer: bool,
    ) -> Result<JoinPath>;
    fn trim_joins(&mut self, path: JoinPath) -> ResolvedColumn;
    /// A fresh, empty WHERE node.
    fn where_class(&self) -> Self::Where;
    fn add_where(&mut self, node: Self::Where, connector: Connector);
}

/// Queryset-like object the projection helper works on.
pub trait QuerySet: Clone {
    /// False once a slice has been taken.
    fn can_filter(&self) -> bool;
    fn add_extra(&mut self, name: &str, sql: String);
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_name(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
