//! A SQL-backed host for `hstore-query`.
//!
//! - [`ddl`]: discover tables, columns and foreign keys from `CREATE TABLE`
//!   statements.
//! - [`catalog`]: expose them as models, fields and relations
//!   ([`hstore_query::Schema`]).
//! - [`where_node`] / [`query`]: a WHERE tree and a SELECT builder that
//!   allocate aliases, plan joins and render the statement.
//!
//! ```text
//! let catalog = Arc::new(Catalog::from_ddl(ddl)?);
//! let q = Query::new(catalog, "items")?.filter(&HQ::leaf("data__size__gt", 10))?;
//! let (sql, params) = q.as_sql();
//! ```

pub mod catalog;
pub mod ddl;
pub mod query;
pub mod where_node;

pub use catalog::{Catalog, Model, Relation};
pub use ddl::{parse_sql_ddl, ColumnDef, ForeignKey, SqlSchema, TableDef};
pub use query::{Join, Query};
pub use where_node::{WhereChild, WhereNode};
