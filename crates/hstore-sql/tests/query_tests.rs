//! End-to-end statement rendering: DDL -> catalog -> filters -> SQL.

use std::sync::Arc;

use hstore_query::{Connector, Error, FilterValue, Param, HQ};
use hstore_sql::{Catalog, Query};
use proptest::prelude::*;

const DDL: &str = r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        prefs hstore
    );
    CREATE TABLE items (
        id INTEGER PRIMARY KEY,
        owner_id INTEGER REFERENCES users(id),
        data hstore
    );
"#;

fn items() -> Query {
    let catalog = Catalog::from_ddl(DDL).expect("ddl");
    Query::new(Arc::new(catalog), "items").expect("model")
}

fn render(hq: &HQ) -> (String, Vec<Param>) {
    items().filter(hq).expect("filter").as_sql()
}

fn where_clause(hq: &HQ) -> String {
    let (sql, _) = render(hq);
    sql.split_once(" WHERE ")
        .map(|(_, w)| w.to_string())
        .unwrap_or_default()
}

// ============================================================================
// Boolean structure
// ============================================================================

#[test]
fn conjunction_of_casts() {
    let hq = HQ::new([("data__size__gt", FilterValue::Int(10))])
        & HQ::leaf("data__color__iexact", "Red");
    let (sql, params) = render(&hq);
    assert_eq!(
        sql,
        concat!(
            r#"SELECT "items".* FROM "items" WHERE "#,
            r#"CAST(NULLIF("items"."data"->'size','') AS integer) > %s"#,
            r#" AND lower("items"."data"->'color') = %s"#,
        )
    );
    assert_eq!(
        params,
        vec![
            Param::Value(FilterValue::Int(10)),
            Param::Value(FilterValue::text("red")),
        ]
    );
}

#[test]
fn disjunction_under_conjunction_is_parenthesized() {
    let hq = (HQ::leaf("data__a", "1") | HQ::leaf("data__b", "2")) & HQ::leaf("data__c", "3");
    assert_eq!(
        where_clause(&hq),
        r#"("items"."data"->'a' = %s OR "items"."data"->'b' = %s) AND "items"."data"->'c' = %s"#
    );
}

#[test]
fn negation_wraps_the_whole_subtree() {
    let hq = !(HQ::leaf("data__a", "1") & HQ::leaf("data__b", "2"));
    assert_eq!(
        where_clause(&hq),
        r#"NOT ("items"."data"->'a' = %s AND "items"."data"->'b' = %s)"#
    );
}

#[test]
fn negated_leaf_beside_others() {
    let hq = HQ::leaf("data__a", "1") & !HQ::leaf("data__contains", "b");
    assert_eq!(
        where_clause(&hq),
        r#""items"."data"->'a' = %s AND NOT ("items"."data" ? %s)"#
    );
}

#[test]
fn successive_filters_are_anded() {
    let q = items()
        .filter(&HQ::leaf("data__a", "1"))
        .and_then(|q| q.filter(&HQ::leaf("data__b", "2")))
        .expect("filters");
    assert_eq!(
        q.as_sql().0,
        r#"SELECT "items".* FROM "items" WHERE "items"."data"->'a' = %s AND "items"."data"->'b' = %s"#
    );
}

// ============================================================================
// Joins and errors
// ============================================================================

#[test]
fn relation_lookup_joins_the_related_table() {
    let (sql, params) = render(&HQ::leaf("owner__prefs__theme__in", vec!["dark", "dim"]));
    assert_eq!(
        sql,
        concat!(
            r#"SELECT "items".* FROM "items""#,
            r#" LEFT OUTER JOIN "users" ON ("items"."owner_id" = "users"."id")"#,
            r#" WHERE "users"."prefs"->'theme' IN %s"#,
        )
    );
    assert_eq!(
        params,
        vec![Param::Tuple(vec![
            FilterValue::text("dark"),
            FilterValue::text("dim")
        ])]
    );
}

#[test]
fn errors_propagate_from_filter() {
    let err = items()
        .filter(&HQ::leaf("data__size__gt", true))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }), "err={err}");

    let err = items().filter(&HQ::leaf("ghost__k", "v")).unwrap_err();
    assert!(matches!(err, Error::FieldError { .. }), "err={err}");
}

// ============================================================================
// Properties
// ============================================================================

fn leaf() -> impl Strategy<Value = HQ> {
    // Leading `k` keeps keys from spelling a lookup type.
    let key = || proptest::string::string_regex("k[a-z]{0,5}").unwrap();
    prop_oneof![
        (key(), any::<i32>()).prop_map(|(k, v)| HQ::leaf(format!("data__{k}__gte"), v)),
        (key(), "[a-z]{0,6}").prop_map(|(k, v)| HQ::leaf(format!("data__{k}"), v)),
        key().prop_map(|k| HQ::leaf("data__contains", k)),
    ]
}

fn tree() -> impl Strategy<Value = HQ> {
    leaf().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            (proptest::collection::vec(inner.clone(), 1..4), any::<bool>()).prop_map(
                |(children, any)| {
                    let connector = if any { Connector::Or } else { Connector::And };
                    HQ::node(connector, children)
                }
            ),
            inner.prop_map(|child| !child),
        ]
    })
}

fn leaf_count(hq: &HQ) -> usize {
    match hq {
        HQ::Leaf { .. } => 1,
        HQ::And(children) | HQ::Or(children) => children.iter().map(leaf_count).sum(),
        HQ::Not(child) => leaf_count(child),
    }
}

proptest! {
    #[test]
    fn one_placeholder_per_param_per_leaf(hq in tree()) {
        let (sql, params) = render(&hq);
        prop_assert_eq!(sql.matches("%s").count(), params.len());
        prop_assert_eq!(params.len(), leaf_count(&hq));
    }

    #[test]
    fn rendering_is_deterministic(hq in tree()) {
        prop_assert_eq!(render(&hq), render(&hq));
    }

    #[test]
    fn parentheses_balance(hq in tree()) {
        let sql = where_clause(&hq);
        let opens = sql.matches('(').count();
        let closes = sql.matches(')').count();
        prop_assert_eq!(opens, closes);
    }
}
