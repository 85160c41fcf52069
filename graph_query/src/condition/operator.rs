//! Named comparison operators used in `properties` and `where` clauses.

use graph_store::{Entity, PropertyValue};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use tracing::warn;

/// A comparison operator, parsed case-insensitively from its clause key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

impl Operator {
    /// Parse an operator name or symbol.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name.trim().to_lowercase().as_str() {
            "equals" | "eq" | "=" => Operator::Equals,
            "not_equals" | "ne" | "!=" => Operator::NotEquals,
            "gt" | ">" => Operator::Gt,
            "lt" | "<" => Operator::Lt,
            "gte" | ">=" => Operator::Gte,
            "lte" | "<=" => Operator::Lte,
            "contains" | "in" => Operator::Contains,
            "startswith" | "starts_with" => Operator::StartsWith,
            "endswith" | "ends_with" => Operator::EndsWith,
            "regex" => Operator::Regex,
            _ => return None,
        };
        Some(op)
    }
}

/// `field <op> value` against an entity attribute.
#[derive(Debug, Clone)]
pub struct OperatorCondition {
    pub field: String,
    pub operator: Operator,
    pub value: PropertyValue,
    /// Compiled form of `value` for [`Operator::Regex`]; `None` when the
    /// pattern does not compile.
    pattern: Option<Regex>,
}

impl OperatorCondition {
    /// Create a new condition. A regex value is compiled once here.
    pub fn new(field: impl Into<String>, operator: Operator, value: PropertyValue) -> Self {
        let pattern = match operator {
            Operator::Regex => compile_pattern(&value.as_text()),
            _ => None,
        };
        Self {
            field: field.into(),
            operator,
            value,
            pattern,
        }
    }

    /// Evaluate against an entity. A missing attribute never matches.
    pub fn evaluate(&self, entity: &Entity) -> bool {
        match entity.attribute(&self.field) {
            Some(actual) if !actual.is_null() => self.compare(&actual),
            _ => false,
        }
    }

    fn compare(&self, actual: &PropertyValue) -> bool {
        let expected = &self.value;
        match self.operator {
            Operator::Equals => actual.loose_eq(expected),
            Operator::NotEquals => !actual.loose_eq(expected),
            Operator::Gt => ordering(actual, expected) == Some(Ordering::Greater),
            Operator::Lt => ordering(actual, expected) == Some(Ordering::Less),
            Operator::Gte => matches!(
                ordering(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lte => matches!(
                ordering(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Contains => actual
                .as_text()
                .to_lowercase()
                .contains(&expected.as_text().to_lowercase()),
            Operator::StartsWith => actual
                .as_text()
                .to_lowercase()
                .starts_with(&expected.as_text().to_lowercase()),
            Operator::EndsWith => actual
                .as_text()
                .to_lowercase()
                .ends_with(&expected.as_text().to_lowercase()),
            Operator::Regex => self
                .pattern
                .as_ref()
                .is_some_and(|re| re.is_match(&actual.as_text())),
        }
    }
}

/// Numeric order when both sides have a numeric reading, otherwise the
/// lexicographic order of their text forms.
fn ordering(actual: &PropertyValue, expected: &PropertyValue) -> Option<Ordering> {
    match (actual.as_number(), expected.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(actual.as_text().cmp(&expected.as_text())),
    }
}

/// Compile a case-insensitive search pattern, logging invalid ones.
pub(crate) fn compile_pattern(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern, error = %e, "invalid regex in query, condition will never match");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entity {
        Entity::new("report.pdf", "File")
            .with_description("Quarterly Report")
            .with_property("size", 2048)
            .with_property("created_date", "2025-07-11")
            .with_property("ratio", "0.75")
    }

    fn check(field: &str, op: &str, value: impl Into<PropertyValue>) -> bool {
        let operator = Operator::parse(op).unwrap();
        OperatorCondition::new(field, operator, value.into()).evaluate(&sample())
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Operator::parse("EQ"), Some(Operator::Equals));
        assert_eq!(Operator::parse("!="), Some(Operator::NotEquals));
        assert_eq!(Operator::parse("starts_with"), Some(Operator::StartsWith));
        assert_eq!(Operator::parse("in"), Some(Operator::Contains));
        assert_eq!(Operator::parse("between"), None);
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(check("size", "gt", 1024));
        assert!(check("size", ">=", 2048));
        assert!(!check("size", "lt", 100));
        assert!(check("ratio", "lte", 0.75));
        assert!(check("size", "gt", "1000"));
    }

    #[test]
    fn test_string_fallback_ordering() {
        assert!(check("created_date", "gt", "2025-07-10"));
        assert!(!check("created_date", "gt", "2025-07-12"));
    }

    #[test]
    fn test_equality() {
        assert!(check("size", "equals", 2048.0));
        assert!(check("type", "eq", "File"));
        assert!(!check("type", "eq", "file"));
        assert!(check("type", "ne", "Folder"));
    }

    #[test]
    fn test_text_operators() {
        assert!(check("description", "contains", "REPORT"));
        assert!(check("description", "startswith", "quarterly"));
        assert!(check("description", "endswith", "report"));
        assert!(check("description", "regex", "^quart.*rt$"));
        assert!(!check("description", "regex", "(unclosed"));
    }

    #[test]
    fn test_missing_field_never_matches() {
        assert!(!check("owner", "ne", "nobody"));
        assert!(!check("owner", "contains", ""));
    }
}
