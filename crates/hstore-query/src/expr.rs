//! Boolean filter expressions over hstore lookups.
//!
//! ```text
//! (HQ::leaf("data__color", "red") | HQ::leaf("data__size__gt", 10))
//!     & !HQ::leaf("data__contains", "discontinued")
//! ```
//!
//! Combinators always build a new node around their operands. Negation
//! applies to the combined result of a subtree, never child by child.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::constraint::HStoreConstraint;
use crate::error::{Error, Result};
use crate::host::{QueryHost, WhereTree};
use crate::lookup::Connector;
use crate::path::parse_lookup_path;
use crate::value::FilterValue;

#[derive(Debug, Clone, PartialEq)]
pub enum HQ {
    Leaf { path: String, value: FilterValue },
    And(Vec<HQ>),
    Or(Vec<HQ>),
    Not(Box<HQ>),
}

/// Right-hand side of [`HQ::combine`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(HQ),
    Value(FilterValue),
}

impl From<HQ> for Operand {
    fn from(expr: HQ) -> Self {
        Operand::Expr(expr)
    }
}

impl From<FilterValue> for Operand {
    fn from(value: FilterValue) -> Self {
        Operand::Value(value)
    }
}

impl TryFrom<Operand> for HQ {
    type Error = Error;

    fn try_from(operand: Operand) -> Result<Self> {
        match operand {
            Operand::Expr(expr) => Ok(expr),
            Operand::Value(value) => Err(Error::TypeMismatch(format!(
                "a {} value ({value})",
                value.kind()
            ))),
        }
    }
}

impl Default for HQ {
    fn default() -> Self {
        HQ::And(Vec::new())
    }
}

impl HQ {
    /// Keyword form: every `(path, value)` pair is a leaf, all AND-ed.
    pub fn new<I, P, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        P: Into<String>,
        V: Into<FilterValue>,
    {
        HQ::And(
            pairs
                .into_iter()
                .map(|(path, value)| HQ::leaf(path, value))
                .collect(),
        )
    }

    pub fn leaf(path: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        HQ::Leaf {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn node(connector: Connector, children: Vec<HQ>) -> Self {
        match connector {
            Connector::And => HQ::And(children),
            Connector::Or => HQ::Or(children),
        }
    }

    pub fn connector(&self) -> Option<Connector> {
        match self {
            HQ::And(_) => Some(Connector::And),
            HQ::Or(_) => Some(Connector::Or),
            HQ::Leaf { .. } | HQ::Not(_) => None,
        }
    }

    pub fn combine(self, other: impl Into<Operand>, connector: Connector) -> Result<HQ> {
        let other = HQ::try_from(other.into())?;
        Ok(HQ::node(connector, vec![self, other]))
    }

    pub fn and(self, other: HQ) -> HQ {
        HQ::node(Connector::And, vec![self, other])
    }

    pub fn or(self, other: HQ) -> HQ {
        HQ::node(Connector::Or, vec![self, other])
    }

    pub fn negate(self) -> HQ {
        HQ::Not(Box::new(self))
    }

    /// In-place add. Nodes with fewer than two children adopt `connector`;
    /// otherwise a differing connector wraps the current expression.
    pub fn add(&mut self, other: HQ, connector: Connector) {
        let own = self.connector();
        let current = std::mem::take(self);
        *self = match current {
            HQ::And(mut children) | HQ::Or(mut children)
                if children.len() < 2 || own == Some(connector) =>
            {
                children.push(other);
                HQ::node(connector, children)
            }
            current => HQ::node(connector, vec![current, other]),
        };
    }

    /// Compile every leaf and attach the result to `query`'s WHERE tree.
    pub fn add_to_query<Q: QueryHost>(&self, query: &mut Q) -> Result<()> {
        let mut node = query.where_class();
        self.attach_into(&mut node, query)?;
        query.add_where(node, Connector::And);
        Ok(())
    }

    /// Attach this expression's content directly into `node`.
    fn attach_into<Q: QueryHost>(&self, node: &mut Q::Where, query: &mut Q) -> Result<()> {
        match self {
            HQ::And(children) | HQ::Or(children) => {
                let connector = self.connector().unwrap_or_default();
                for child in children {
                    child.attach(node, connector, query)?;
                }
            }
            HQ::Not(child) => {
                child.attach_into(node, query)?;
                node.negate();
            }
            HQ::Leaf { .. } => self.attach(node, Connector::And, query)?,
        }
        Ok(())
    }

    fn attach<Q: QueryHost>(
        &self,
        parent: &mut Q::Where,
        connector: Connector,
        query: &mut Q,
    ) -> Result<()> {
        match self {
            HQ::Leaf { path, value } => {
                let constraint = compile_leaf(path, value.clone(), query)?;
                parent.add_constraint(constraint, connector);
            }
            _ => {
                let mut node = query.where_class();
                self.attach_into(&mut node, query)?;
                parent.add_node(node, connector);
            }
        }
        Ok(())
    }
}

/// Resolve one `(path, value)` leaf against `query` and compile it.
pub fn compile_leaf<Q: QueryHost>(
    path: &str,
    value: FilterValue,
    query: &mut Q,
) -> Result<HStoreConstraint> {
    let parsed = parse_lookup_path(path, query.schema(), query.model())?;
    let alias = query.initial_alias();
    let joins = query.setup_joins(&parsed.relations, &alias, true)?;
    let resolved = query.trim_joins(joins);
    tracing::debug!(
        path,
        lookup = %parsed.lookup,
        key = ?parsed.key,
        column = %resolved.column,
        alias = ?resolved.alias,
        "resolved hstore lookup"
    );
    HStoreConstraint::new(
        resolved.alias,
        resolved.column,
        value,
        parsed.lookup,
        parsed.key,
    )
}

impl BitAnd for HQ {
    type Output = HQ;

    fn bitand(self, rhs: HQ) -> HQ {
        self.and(rhs)
    }
}

impl BitOr for HQ {
    type Output = HQ;

    fn bitor(self, rhs: HQ) -> HQ {
        self.or(rhs)
    }
}

impl Not for HQ {
    type Output = HQ;

    fn not(self) -> HQ {
        self.negate()
    }
}

impl fmt::Display for HQ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HQ::Leaf { path, value } => write!(f, "{path}={value}"),
            HQ::And(children) | HQ::Or(children) => {
                let sep = format!(" {} ", self.connector().unwrap_or_default());
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(&sep)?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            HQ::Not(child) => write!(f, "NOT {child}"),
        }
    }
}
