//! SQL schema discovery.
//!
//! Extracts what filter compilation needs from SQL DDL:
//! - Tables -> models
//! - Columns (with their declared type, so `hstore` columns can be found)
//! - Primary keys, the default target of a `REFERENCES t` without columns
//! - Foreign keys, table-level and inline `REFERENCES` -> relations

use anyhow::{Context, Result};
use sqlparser::ast::*;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Discovered SQL schema
#[derive(Debug, Clone, Default)]
pub struct SqlSchema {
    pub tables: Vec<TableDef>,
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
}

impl ColumnDef {
    pub fn is_hstore(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("hstore")
    }
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

fn object_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| name.to_string())
}

fn ident_names(idents: &[Ident]) -> Vec<String> {
    idents.iter().map(|c| c.value.clone()).collect()
}

/// Parse SQL DDL and extract schema
pub fn parse_sql_ddl(sql: &str) -> Result<SqlSchema> {
    let dialect = GenericDialect {};
    let statements = Parser::parse_sql(&dialect, sql).context("failed to parse SQL DDL")?;

    let mut schema = SqlSchema::default();

    for stmt in statements {
        if let Statement::CreateTable {
            name,
            columns: sql_columns,
            constraints: sql_constraints,
            ..
        } = stmt
        {
            let table_name = object_name(&name);
            let mut columns = Vec::new();
            let mut primary_key = Vec::new();

            for col in &sql_columns {
                let column_name = col.name.value.clone();
                for opt in &col.options {
                    match &opt.option {
                        ColumnOption::Unique {
                            is_primary: true, ..
                        } => primary_key.push(column_name.clone()),
                        ColumnOption::ForeignKey {
                            foreign_table,
                            referred_columns,
                            ..
                        } => schema.foreign_keys.push(ForeignKey {
                            from_table: table_name.clone(),
                            from_columns: vec![column_name.clone()],
                            to_table: object_name(foreign_table),
                            to_columns: ident_names(referred_columns),
                        }),
                        _ => {}
                    }
                }
                columns.push(ColumnDef {
                    name: column_name,
                    data_type: col.data_type.to_string(),
                });
            }

            for constraint in &sql_constraints {
                match constraint {
                    TableConstraint::ForeignKey {
                        columns: fk_cols,
                        foreign_table,
                        referred_columns,
                        ..
                    } => {
                        schema.foreign_keys.push(ForeignKey {
                            from_table: table_name.clone(),
                            from_columns: ident_names(fk_cols),
                            to_table: object_name(foreign_table),
                            to_columns: ident_names(referred_columns),
                        });
                    }
                    TableConstraint::Unique {
                        columns: uq_cols,
                        is_primary: true,
                        ..
                    } => {
                        primary_key = ident_names(uq_cols);
                    }
                    _ => {}
                }
            }

            schema.tables.push(TableDef {
                name: table_name,
                columns,
                primary_key,
            });
        }
    }

    Ok(schema)
}
