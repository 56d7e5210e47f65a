//! Model catalog built from discovered DDL.
//!
//! Every table is a model and every column a field. A single-column foreign
//! key `owner_id -> users(id)` is exposed as relation field `owner`, stored in
//! column `owner_id`; foreign-key columns without the `_id` suffix keep their
//! own name.

use std::collections::BTreeMap;

use anyhow::Result;
use hstore_query::{Field, FieldNotFound, Schema};

use crate::ddl::{parse_sql_ddl, SqlSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub field: String,
    pub column: String,
    pub to_table: String,
    pub to_column: String,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub table: String,
    pub fields: Vec<Field>,
    pub relations: Vec<Relation>,
    pub hstore_columns: Vec<String>,
}

impl Model {
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|r| r.field == name || r.column == name)
    }

    fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.column == name))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    models: BTreeMap<String, Model>,
}

impl Catalog {
    pub fn from_ddl(sql: &str) -> Result<Self> {
        Ok(Self::from_schema(&parse_sql_ddl(sql)?))
    }

    pub fn from_schema(schema: &SqlSchema) -> Self {
        let mut models = BTreeMap::new();

        for table in &schema.tables {
            let mut model = Model {
                table: table.name.clone(),
                ..Default::default()
            };

            for column in &table.columns {
                let fk = schema.foreign_keys.iter().find(|fk| {
                    fk.from_table == table.name
                        && fk.from_columns.len() == 1
                        && fk.from_columns[0] == column.name
                });
                match fk {
                    Some(fk) => {
                        let field = column
                            .name
                            .strip_suffix("_id")
                            .filter(|s| !s.is_empty())
                            .unwrap_or(&column.name)
                            .to_string();
                        let to_column = fk
                            .to_columns
                            .first()
                            .or_else(|| referenced_primary_key(schema, &fk.to_table))
                            .cloned()
                            .unwrap_or_else(|| "id".to_string());
                        model.fields.push(Field::relation(
                            field.clone(),
                            column.name.clone(),
                            fk.to_table.clone(),
                        ));
                        model.relations.push(Relation {
                            field,
                            column: column.name.clone(),
                            to_table: fk.to_table.clone(),
                            to_column,
                        });
                    }
                    None => model.fields.push(Field::plain(column.name.clone())),
                }
                if column.is_hstore() {
                    model.hstore_columns.push(column.name.clone());
                }
            }

            tracing::debug!(
                table = %model.table,
                fields = model.fields.len(),
                relations = model.relations.len(),
                "catalogued model"
            );
            models.insert(table.name.clone(), model);
        }

        Self { models }
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn hstore_columns(&self, model: &str) -> &[String] {
        self.models
            .get(model)
            .map(|m| m.hstore_columns.as_slice())
            .unwrap_or_default()
    }
}

/// First primary-key column of `table`, for `REFERENCES table` with no columns.
fn referenced_primary_key<'a>(schema: &'a SqlSchema, table: &str) -> Option<&'a String> {
    schema
        .tables
        .iter()
        .find(|t| t.name == table)
        .and_then(|t| t.primary_key.first())
}

impl Schema for Catalog {
    fn get_field(&self, model: &str, name: &str) -> Result<Field, FieldNotFound> {
        self.models
            .get(model)
            .and_then(|m| m.field(name))
            .cloned()
            .ok_or_else(|| FieldNotFound {
                model: model.to_string(),
                name: name.to_string(),
            })
    }
}
