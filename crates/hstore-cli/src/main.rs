//! hstore CLI
//!
//! Compile key-value filters against a schema discovered from SQL DDL:
//! - `compile`: filter expression -> WHERE clause + parameters
//! - `project`: select one map key as an extra column
//! - `columns`: list the hstore columns of every table

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hstore_query::{add_hstore, parse_filter_json, Connector, FilterValue, Param, HQ};
use hstore_sql::{Catalog, Query};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hstore")]
#[command(author, version, about = "Compile hstore filter expressions into SQL")]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a filter into a SELECT statement and its parameters.
    ///
    /// Filters come either from `--filter` (JSON, `{"and": [...]}`,
    /// `{"or": [...]}`, `{"not": {...}}` or `{"path": value, ...}`) or from
    /// repeated `--where path=value` pairs.
    Compile {
        /// SQL DDL file (CREATE TABLE statements)
        #[arg(short, long)]
        schema: PathBuf,
        /// Table to select from
        #[arg(short, long)]
        model: String,
        /// Filter expression as JSON
        #[arg(short, long, conflicts_with = "wheres")]
        filter: Option<String>,
        /// `path=value` lookup; the value is JSON when it parses, text otherwise
        #[arg(short = 'w', long = "where", value_name = "PATH=VALUE")]
        wheres: Vec<String>,
        /// Combine `--where` lookups with OR instead of AND
        #[arg(long)]
        any: bool,
        /// Negate the whole filter
        #[arg(long)]
        negate: bool,
        /// Print `{"sql": ..., "params": [...]}`
        #[arg(long)]
        json: bool,
    },

    /// Add a map key as an extra output column.
    Project {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(short, long)]
        model: String,
        /// Map column to read from
        #[arg(long)]
        field: String,
        #[arg(short, long)]
        key: String,
        /// Output column name (defaults to the key)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List hstore columns per table.
    Columns {
        #[arg(short, long)]
        schema: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compile {
            schema,
            model,
            filter,
            wheres,
            any,
            negate,
            json,
        } => cmd_compile(
            &schema,
            &model,
            filter.as_deref(),
            &wheres,
            any,
            negate,
            json,
        ),
        Commands::Project {
            schema,
            model,
            field,
            key,
            name,
        } => cmd_project(&schema, &model, &field, &key, name.as_deref()),
        Commands::Columns { schema } => cmd_columns(&schema),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: &Path) -> Result<Arc<Catalog>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let catalog = Catalog::from_ddl(&text)
        .with_context(|| format!("failed to load schema {}", path.display()))?;
    Ok(Arc::new(catalog))
}

/// `path=value`; the value is JSON when it parses, text otherwise.
fn parse_where(arg: &str) -> Result<HQ> {
    let (path, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected PATH=VALUE, got `{arg}`"))?;
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => FilterValue::from_json(&json)
            .with_context(|| format!("invalid value for `{path}`"))?,
        Err(_) => FilterValue::text(raw),
    };
    Ok(HQ::leaf(path.trim(), value))
}

fn build_filter(filter: Option<&str>, wheres: &[String], any: bool) -> Result<Option<HQ>> {
    if let Some(text) = filter {
        return Ok(Some(parse_filter_json(text).context("invalid --filter")?));
    }
    if wheres.is_empty() {
        return Ok(None);
    }
    let leaves = wheres
        .iter()
        .map(|w| parse_where(w))
        .collect::<Result<Vec<_>>>()?;
    let connector = if any { Connector::Or } else { Connector::And };
    Ok(Some(HQ::node(connector, leaves)))
}

fn cmd_compile(
    schema: &Path,
    model: &str,
    filter: Option<&str>,
    wheres: &[String],
    any: bool,
    negate: bool,
    json: bool,
) -> Result<()> {
    let catalog = load_catalog(schema)?;
    let mut query = Query::new(catalog, model)?;

    match build_filter(filter, wheres, any)? {
        Some(hq) => {
            let hq = if negate { !hq } else { hq };
            tracing::debug!(filter = %hq, "compiling");
            query = query.filter(&hq)?;
        }
        None if negate => return Err(anyhow!("--negate needs a filter")),
        None => {}
    }

    let (sql, params) = query.as_sql();
    if json {
        let out = serde_json::json!({ "sql": sql, "params": params });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_statement(&sql, &params)?;
    }
    Ok(())
}

fn cmd_project(
    schema: &Path,
    model: &str,
    field: &str,
    key: &str,
    name: Option<&str>,
) -> Result<()> {
    let catalog = load_catalog(schema)?;
    if !catalog.hstore_columns(model).iter().any(|c| c == field) {
        tracing::warn!(model, field, "projected column is not declared as hstore");
    }
    let query = Query::new(catalog, model)?;
    let projected = add_hstore(&query, field, key, name)?;
    let (sql, params) = projected.as_sql();
    print_statement(&sql, &params)
}

fn cmd_columns(schema: &Path) -> Result<()> {
    let catalog = load_catalog(schema)?;
    let mut found = 0usize;
    for model in catalog.models() {
        if model.hstore_columns.is_empty() {
            continue;
        }
        found += model.hstore_columns.len();
        println!(
            "{} {}",
            format!("{}:", model.table).green().bold(),
            model.hstore_columns.join(", ")
        );
    }
    if found == 0 {
        eprintln!("{} no hstore columns found", "info:".yellow().bold());
    }
    Ok(())
}

fn print_statement(sql: &str, params: &[Param]) -> Result<()> {
    println!("{sql}");
    for (i, param) in params.iter().enumerate() {
        let rendered = match param {
            Param::Value(value) => serde_json::to_string(value)?,
            Param::Tuple(items) | Param::Array(items) => serde_json::to_string(items)?,
        };
        println!("  {} ${} = {}", "→".cyan(), i + 1, rendered);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_values_prefer_json() {
        assert_eq!(
            parse_where("data__size__gt=10").unwrap(),
            HQ::leaf("data__size__gt", 10i64)
        );
        assert_eq!(
            parse_where("data__color=red").unwrap(),
            HQ::leaf("data__color", "red")
        );
        assert_eq!(
            parse_where(r#"data__tags__contains=["a","b"]"#).unwrap(),
            HQ::leaf("data__tags__contains", vec!["a", "b"])
        );
        assert!(parse_where("no-equals-sign").is_err());
    }

    #[test]
    fn wheres_combine_with_the_chosen_connector() {
        let wheres = vec!["data__a=1".to_string(), "data__b=2".to_string()];
        let and = build_filter(None, &wheres, false).unwrap().unwrap();
        assert_eq!(and.connector(), Some(Connector::And));
        let or = build_filter(None, &wheres, true).unwrap().unwrap();
        assert_eq!(or.connector(), Some(Connector::Or));
        assert!(build_filter(None, &[], false).unwrap().is_none());
    }
}
