//! A small SELECT builder that hosts hstore filters.
//!
//! Aliases follow the usual ORM convention: the first use of a table is
//! aliased by its own name, later uses get `T2`, `T3`, ... (numbered by how
//! many aliases exist). Generated aliases are never quoted.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::anyhow;
use hstore_query::{
    quote_name, Connector, Error, JoinPath, Param, QueryHost, QuerySet, ResolvedColumn, Schema,
    WhereTree, HQ,
};

use crate::catalog::{Catalog, Relation};
use crate::where_node::WhereNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: String,
    pub alias: String,
    pub lhs_alias: String,
    pub lhs_column: String,
    pub rhs_column: String,
    pub outer: bool,
    refcount: usize,
}

impl Join {
    pub fn refcount(&self) -> usize {
        self.refcount
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    catalog: Arc<Catalog>,
    model: String,
    joins: Vec<Join>,
    where_node: WhereNode,
    extra: Vec<(String, String)>,
    low_mark: usize,
    high_mark: Option<usize>,
}

impl Query {
    pub fn new(catalog: Arc<Catalog>, model: &str) -> anyhow::Result<Self> {
        if catalog.model(model).is_none() {
            return Err(anyhow!("unknown model `{model}`"));
        }
        Ok(Self {
            catalog,
            model: model.to_string(),
            joins: Vec::new(),
            where_node: WhereNode::default(),
            extra: Vec::new(),
            low_mark: 0,
            high_mark: None,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn where_node(&self) -> &WhereNode {
        &self.where_node
    }

    pub fn extra(&self) -> &[(String, String)] {
        &self.extra
    }

    /// A copy of this query with `hq` AND-ed into its WHERE clause.
    pub fn filter(&self, hq: &HQ) -> hstore_query::Result<Query> {
        if !self.can_filter() {
            return Err(Error::SlicedQuery);
        }
        let mut clone = self.clone();
        hq.add_to_query(&mut clone)?;
        Ok(clone)
    }

    /// Python-style `[low:high]` relative to any slice already taken.
    pub fn slice(&self, low: usize, high: Option<usize>) -> Query {
        let mut clone = self.clone();
        let base = clone.low_mark;
        clone.high_mark = match (clone.high_mark, high) {
            (Some(current), Some(high)) => Some(current.min(base.saturating_add(high))),
            (None, Some(high)) => Some(base.saturating_add(high)),
            (current, None) => current,
        };
        clone.low_mark = match clone.high_mark {
            Some(high) => base.saturating_add(low).min(high),
            None => base.saturating_add(low),
        };
        clone
    }

    fn aliases(&self) -> BTreeSet<&str> {
        std::iter::once(self.model.as_str())
            .chain(self.joins.iter().map(|j| j.alias.as_str()))
            .collect()
    }

    fn is_generated_alias(&self, name: &str) -> bool {
        self.joins
            .iter()
            .any(|j| j.alias == name && j.alias != j.table)
    }

    pub fn quote_name_unless_alias(&self, name: &str) -> String {
        if self.is_generated_alias(name) {
            name.to_string()
        } else {
            quote_name(name)
        }
    }

    fn table_alias(&self, table: &str) -> String {
        let aliases = self.aliases();
        if aliases.contains(table) {
            format!("T{}", aliases.len() + 1)
        } else {
            table.to_string()
        }
    }

    /// Reuse an equivalent join or allocate a new one; returns its alias.
    fn join(&mut self, lhs_alias: &str, relation: &Relation, allow_outer: bool) -> String {
        if let Some(existing) = self.joins.iter_mut().find(|j| {
            j.lhs_alias == lhs_alias
                && j.lhs_column == relation.column
                && j.table == relation.to_table
                && j.rhs_column == relation.to_column
        }) {
            existing.refcount += 1;
            existing.outer &= allow_outer;
            return existing.alias.clone();
        }

        let alias = self.table_alias(&relation.to_table);
        tracing::debug!(
            table = %relation.to_table,
            alias = %alias,
            lhs = %lhs_alias,
            outer = allow_outer,
            "allocated join"
        );
        self.joins.push(Join {
            table: relation.to_table.clone(),
            alias: alias.clone(),
            lhs_alias: lhs_alias.to_string(),
            lhs_column: relation.column.clone(),
            rhs_column: relation.to_column.clone(),
            outer: allow_outer,
            refcount: 1,
        });
        alias
    }

    /// Render the whole statement, parameters in placeholder order.
    pub fn as_sql(&self) -> (String, Vec<Param>) {
        let quote = |name: &str| self.quote_name_unless_alias(name);

        let mut columns = vec![format!("{}.*", quote(&self.model))];
        for (name, sql) in &self.extra {
            columns.push(format!("({sql}) AS {}", quote_name(name)));
        }

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), quote(&self.model));
        for join in self.joins.iter().filter(|j| j.refcount > 0) {
            let kind = if join.outer { "LEFT OUTER JOIN" } else { "INNER JOIN" };
            let table = if join.alias == join.table {
                quote_name(&join.table)
            } else {
                format!("{} {}", quote_name(&join.table), join.alias)
            };
            sql.push_str(&format!(
                " {kind} {table} ON ({}.{} = {}.{})",
                quote(&join.lhs_alias),
                quote_name(&join.lhs_column),
                quote(&join.alias),
                quote_name(&join.rhs_column),
            ));
        }

        let (where_sql, params) = self.where_node.as_sql(&quote);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        if let Some(high) = self.high_mark {
            sql.push_str(&format!(" LIMIT {}", high - self.low_mark));
        }
        if self.low_mark > 0 {
            sql.push_str(&format!(" OFFSET {}", self.low_mark));
        }
        (sql, params)
    }
}

impl QueryHost for Query {
    type Where = WhereNode;

    fn model(&self) -> &str {
        &self.model
    }

    fn schema(&self) -> &dyn Schema {
        self.catalog.as_ref()
    }

    fn initial_alias(&mut self) -> String {
        self.model.clone()
    }

    fn setup_joins(
        &mut self,
        names: &[String],
        base_alias: &str,
        allow_outer: bool,
    ) -> hstore_query::Result<JoinPath> {
        let mut model = self.model.clone();
        let mut alias = base_alias.to_string();
        let mut joins = vec![alias.clone()];

        for (i, name) in names.iter().enumerate() {
            let field = self
                .catalog
                .get_field(&model, name)
                .map_err(|e| Error::FieldError {
                    model: e.model,
                    name: e.name,
                })?;
            if i + 1 == names.len() {
                return Ok(JoinPath {
                    target: field,
                    model,
                    joins,
                });
            }
            let relation = self
                .catalog
                .model(&model)
                .and_then(|m| m.relation(&field.name))
                .cloned()
                .ok_or_else(|| Error::FieldError {
                    model: model.clone(),
                    name: name.clone(),
                })?;
            alias = self.join(&alias, &relation, allow_outer);
            joins.push(alias.clone());
            model = relation.to_table;
        }

        Err(Error::FieldError {
            model,
            name: String::new(),
        })
    }

    /// Drop trailing joins whose remote column is the one being selected;
    /// the local foreign-key column holds the same value.
    fn trim_joins(&mut self, path: JoinPath) -> ResolvedColumn {
        let JoinPath {
            target, mut joins, ..
        } = path;
        let mut column = target.column;
        while joins.len() > 1 {
            let Some(alias) = joins.last().cloned() else {
                break;
            };
            let Some(join) = self.joins.iter_mut().find(|j| j.alias == alias) else {
                break;
            };
            if join.rhs_column != column {
                break;
            }
            column = join.lhs_column.clone();
            join.refcount = join.refcount.saturating_sub(1);
            joins.pop();
        }
        ResolvedColumn {
            column,
            alias: joins.last().cloned(),
        }
    }

    fn where_class(&self) -> WhereNode {
        WhereNode::default()
    }

    fn add_where(&mut self, node: WhereNode, connector: Connector) {
        self.where_node.add_node(node, connector);
    }
}

impl QuerySet for Query {
    fn can_filter(&self) -> bool {
        self.low_mark == 0 && self.high_mark.is_none()
    }

    fn add_extra(&mut self, name: &str, sql: String) {
        self.extra.push((name.to_string(), sql));
    }
}
