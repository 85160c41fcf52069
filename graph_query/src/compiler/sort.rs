//! Sorting and limiting of result rows.

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::mem::discriminant;
use tracing::warn;

use crate::formatter::Row;

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

/// Parsed `order_by` / `order` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub fields: Vec<SortField>,
}

impl SortSpec {
    /// Read `order_by` (and `order`) from a definition.
    ///
    /// `order_by: size` sorts by one field, descending only when `order` is
    /// `desc`. `order_by: [{field, direction}, ...]` sorts by several; there a
    /// field is ascending only when its direction is `asc` (the default).
    pub fn from_definition(definition: &Map<String, Value>) -> Option<Self> {
        let order_desc = definition
            .get("order")
            .and_then(Value::as_str)
            .is_some_and(|o| o.eq_ignore_ascii_case("desc"));

        let fields = match definition.get("order_by")? {
            Value::String(field) if !field.is_empty() => vec![SortField {
                field: field.clone(),
                descending: order_desc,
            }],
            Value::Array(specs) if !specs.is_empty() => specs
                .iter()
                .filter_map(|spec| match spec {
                    Value::Object(spec) => {
                        let field = spec.get("field")?.as_str()?.to_string();
                        let direction = spec.get("direction").and_then(Value::as_str).unwrap_or("asc");
                        Some(SortField {
                            field,
                            descending: !direction.eq_ignore_ascii_case("asc"),
                        })
                    }
                    Value::String(field) => Some(SortField {
                        field: field.clone(),
                        descending: order_desc,
                    }),
                    _ => None,
                })
                .collect(),
            Value::Null | Value::String(_) | Value::Array(_) => return None,
            other => {
                warn!(order_by = %other, "invalid order_by clause, results left unsorted");
                return None;
            }
        };

        (!fields.is_empty()).then_some(Self { fields })
    }
}

/// A normalized sort value. Keys of different kinds do not compare.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Text(String),
    Number(f64),
    Time(NaiveDateTime),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Normalize a value for comparison.
///
/// Missing and null values become empty text. Date-like strings (containing
/// `T`, or both `-` and `:`) become timestamps when they parse, other strings
/// are lower-cased. Numbers and booleans compare as numbers, arrays by
/// length, and objects by their lower-cased JSON text.
fn normalize(value: Option<&Value>) -> SortKey {
    match value {
        None | Some(Value::Null) => SortKey::Text(String::new()),
        Some(Value::String(s)) => {
            let date_like = s.contains('T') || (s.contains('-') && s.contains(':'));
            match date_like.then(|| parse_timestamp(s)).flatten() {
                Some(time) => SortKey::Time(time),
                None => SortKey::Text(s.to_lowercase()),
            }
        }
        Some(Value::Number(n)) => SortKey::Number(n.as_f64().unwrap_or(0.0)),
        Some(Value::Bool(b)) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
        Some(Value::Array(items)) => SortKey::Number(items.len() as f64),
        Some(other @ Value::Object(_)) => SortKey::Text(other.to_string().to_lowercase()),
    }
}

/// Parse RFC 3339 (offsets are converted to UTC) or a naive ISO timestamp.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Sort rows in place order-stably. Each key is read from the row, or from
/// `fallback` when the row lacks the field.
///
/// When one field yields keys of different kinds (say numbers and text) the
/// rows are returned unsorted.
pub fn sort_rows<F>(rows: Vec<Row>, spec: &SortSpec, fallback: F) -> Vec<Row>
where
    F: Fn(&Row, &str) -> Option<Value>,
{
    let keyed: Vec<(Vec<SortKey>, Row)> = rows
        .into_iter()
        .map(|row| {
            let keys = spec
                .fields
                .iter()
                .map(|f| match row.get(&f.field) {
                    Some(value) => normalize(Some(value)),
                    None => normalize(fallback(&row, &f.field).as_ref()),
                })
                .collect();
            (keys, row)
        })
        .collect();

    for (index, sort_field) in spec.fields.iter().enumerate() {
        let mut kinds = keyed.iter().map(|(keys, _)| discriminant(&keys[index]));
        if let Some(first) = kinds.next() {
            if kinds.any(|kind| kind != first) {
                warn!(field = %sort_field.field, "cannot sort on values of mixed kinds, keeping input order");
                return keyed.into_iter().map(|(_, row)| row).collect();
            }
        }
    }

    let mut keyed = keyed;
    keyed.sort_by(|(a, _), (b, _)| {
        for (index, sort_field) in spec.fields.iter().enumerate() {
            let ordering = a[index].compare(&b[index]);
            if ordering != Ordering::Equal {
                return if sort_field.descending { ordering.reverse() } else { ordering };
            }
        }
        Ordering::Equal
    });
    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Read a positive `limit`.
pub fn limit_from_definition(definition: &Map<String, Value>) -> Option<usize> {
    definition
        .get("limit")
        .and_then(Value::as_u64)
        .filter(|limit| *limit > 0)
        .map(|limit| limit as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Value) -> Vec<Row> {
        match values {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter().filter_map(|r| r["name"].as_str()).collect()
    }

    fn spec(definition: Value) -> SortSpec {
        match definition {
            Value::Object(map) => SortSpec::from_definition(&map).unwrap(),
            _ => unreachable!(),
        }
    }

    fn no_fallback(_: &Row, _: &str) -> Option<Value> {
        None
    }

    #[test]
    fn test_single_field_numeric() {
        let input = rows(json!([
            {"name": "x", "size": 512},
            {"name": "y", "size": 2048},
            {"name": "z", "size": 1024}
        ]));

        let asc = sort_rows(input.clone(), &spec(json!({"order_by": "size"})), no_fallback);
        assert_eq!(names(&asc), vec!["x", "z", "y"]);

        let desc = sort_rows(input, &spec(json!({"order_by": "size", "order": "DESC"})), no_fallback);
        assert_eq!(names(&desc), vec!["y", "z", "x"]);
    }

    #[test]
    fn test_text_is_case_insensitive_and_stable() {
        let input = rows(json!([
            {"name": "b", "city": "paris"},
            {"name": "a", "city": "Berlin"},
            {"name": "c", "city": "Paris"}
        ]));
        let sorted = sort_rows(input, &spec(json!({"order_by": "city"})), no_fallback);
        assert_eq!(names(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_multi_field() {
        let input = rows(json!([
            {"name": "a", "type": "File", "size": 1},
            {"name": "b", "type": "Folder", "size": 5},
            {"name": "c", "type": "File", "size": 9}
        ]));
        let order = spec(json!({"order_by": [
            {"field": "type", "direction": "asc"},
            {"field": "size", "direction": "desc"}
        ]}));
        assert_eq!(names(&sort_rows(input, &order, no_fallback)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_timestamps_and_missing_values() {
        let input = rows(json!([
            {"name": "late", "at": "2025-07-12T08:00:00Z"},
            {"name": "early", "at": "2025-07-12T09:00:00+02:00"},
            {"name": "naive", "at": "2025-07-11 23:59:59"}
        ]));
        let sorted = sort_rows(input, &spec(json!({"order_by": "at"})), no_fallback);
        assert_eq!(names(&sorted), vec!["naive", "early", "late"]);

        let missing = rows(json!([{"name": "b", "tag": "x"}, {"name": "a"}]));
        let sorted = sort_rows(missing, &spec(json!({"order_by": "tag"})), no_fallback);
        assert_eq!(names(&sorted), vec!["a", "b"]);
    }

    #[test]
    fn test_lists_by_length() {
        let input = rows(json!([
            {"name": "three", "path": ["a", "b", "c"]},
            {"name": "two", "path": ["a", "c"]}
        ]));
        let sorted = sort_rows(input, &spec(json!({"order_by": "path"})), no_fallback);
        assert_eq!(names(&sorted), vec!["two", "three"]);
    }

    #[test]
    fn test_mixed_kinds_keep_order() {
        let input = rows(json!([
            {"name": "n", "v": 3},
            {"name": "t", "v": "abc"},
            {"name": "m", "v": 1}
        ]));
        let sorted = sort_rows(input, &spec(json!({"order_by": "v"})), no_fallback);
        assert_eq!(names(&sorted), vec!["n", "t", "m"]);
    }

    #[test]
    fn test_fallback_lookup() {
        let input = rows(json!([{"name": "y"}, {"name": "x"}]));
        let sizes = |row: &Row, field: &str| match (row["name"].as_str(), field) {
            (Some("x"), "size") => Some(json!(1)),
            (Some("y"), "size") => Some(json!(2)),
            _ => None,
        };
        let sorted = sort_rows(input, &spec(json!({"order_by": "size"})), sizes);
        assert_eq!(names(&sorted), vec!["x", "y"]);
    }

    #[test]
    fn test_clause_parsing() {
        let none = json!({"order_by": 5});
        if let Value::Object(map) = none {
            assert!(SortSpec::from_definition(&map).is_none());
        }

        let map = match json!({"limit": 3}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(limit_from_definition(&map), Some(3));

        let zero = match json!({"limit": 0}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(limit_from_definition(&zero), None);
    }
}
