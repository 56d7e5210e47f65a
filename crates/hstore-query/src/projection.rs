//! Selecting a single map key as an extra output column.

use crate::constraint::escape_key;
use crate::error::{Error, Result};
use crate::host::QuerySet;

/// Return a copy of `queryset` that also selects `field -> 'key'` as `name`
/// (`key` when no name is given). `queryset` itself is left untouched.
pub fn add_hstore<Q: QuerySet>(
    queryset: &Q,
    field: &str,
    key: &str,
    name: Option<&str>,
) -> Result<Q> {
    if !queryset.can_filter() {
        return Err(Error::SlicedQuery);
    }
    let name = name.unwrap_or(key);
    let mut clone = queryset.clone();
    clone.add_extra(name, format!("{field} -> '{}'", escape_key(key)));
    Ok(clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct FakeQs {
        sliced: bool,
        extra: Vec<(String, String)>,
    }

    impl QuerySet for FakeQs {
        fn can_filter(&self) -> bool {
            !self.sliced
        }

        fn add_extra(&mut self, name: &str, sql: String) {
            self.extra.push((name.to_string(), sql));
        }
    }

    #[test]
    fn adds_projection_to_a_clone() {
        let qs = FakeQs::default();
        let out = add_hstore(&qs, "data", "color", None).unwrap();
        assert!(qs.extra.is_empty());
        assert_eq!(
            out.extra,
            vec![("color".to_string(), "data -> 'color'".to_string())]
        );
    }

    #[test]
    fn explicit_output_name() {
        let out = add_hstore(&FakeQs::default(), "data", "color", Some("colour")).unwrap();
        assert_eq!(out.extra[0].0, "colour");
    }

    #[test]
    fn sliced_queryset_is_rejected() {
        let qs = FakeQs {
            sliced: true,
            ..Default::default()
        };
        assert_eq!(
            add_hstore(&qs, "data", "color", None).unwrap_err(),
            Error::SlicedQuery
        );
    }
}
