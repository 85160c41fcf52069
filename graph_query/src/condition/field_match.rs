//! Text matchers for the `description` and `filter` clauses.

use graph_store::Entity;
use regex::Regex;
use serde_json::{Map, Value};

use super::operator::compile_pattern;
use super::value_text;

/// A case-insensitive test on the text form of one attribute.
#[derive(Debug, Clone)]
pub enum FieldMatch {
    Contains(String),
    Equals(String),
    /// `None` when the pattern did not compile.
    Regex(Option<Regex>),
    StartsWith(String),
    EndsWith(String),
    /// No recognised key; matches nothing.
    Never,
}

impl FieldMatch {
    /// Matcher for a field-spec clause such as `description: {contains: x}`.
    /// Keys are consulted in the order contains, equals, regex, startswith,
    /// endswith; the first one present wins.
    pub fn from_field_spec(spec: &Map<String, Value>) -> Self {
        const PRIORITY: [&str; 5] = ["contains", "equals", "regex", "startswith", "endswith"];
        Self::from_keys(spec, &PRIORITY)
    }

    /// Matcher for one `filter` entry. A plain string is a substring test;
    /// a mapping is consulted in the order regex, contains, equals,
    /// startswith, endswith.
    pub fn from_filter_entry(entry: &Value) -> Self {
        const PRIORITY: [&str; 5] = ["regex", "contains", "equals", "startswith", "endswith"];
        match entry {
            Value::String(s) => FieldMatch::Contains(s.to_lowercase()),
            Value::Object(spec) => Self::from_keys(spec, &PRIORITY),
            _ => FieldMatch::Never,
        }
    }

    fn from_keys(spec: &Map<String, Value>, priority: &[&str]) -> Self {
        let Some((key, value)) = priority
            .iter()
            .find_map(|key| spec.get(*key).map(|value| (*key, value)))
        else {
            return FieldMatch::Never;
        };

        let text = value_text(value);
        match key {
            "contains" => FieldMatch::Contains(text.to_lowercase()),
            "equals" => FieldMatch::Equals(text.to_lowercase()),
            "regex" => FieldMatch::Regex(compile_pattern(&text)),
            "startswith" => FieldMatch::StartsWith(text.to_lowercase()),
            "endswith" => FieldMatch::EndsWith(text.to_lowercase()),
            _ => FieldMatch::Never,
        }
    }

    /// Test an attribute text. Empty text never matches.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        match self {
            FieldMatch::Contains(needle) => text.contains(needle.as_str()),
            FieldMatch::Equals(expected) => text == *expected,
            FieldMatch::Regex(pattern) => pattern.as_ref().is_some_and(|re| re.is_match(&text)),
            FieldMatch::StartsWith(prefix) => text.starts_with(prefix.as_str()),
            FieldMatch::EndsWith(suffix) => text.ends_with(suffix.as_str()),
            FieldMatch::Never => false,
        }
    }
}

/// A [`FieldMatch`] bound to the attribute it reads.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: String,
    pub matcher: FieldMatch,
}

impl FieldSpec {
    pub fn new(field: impl Into<String>, matcher: FieldMatch) -> Self {
        Self {
            field: field.into(),
            matcher,
        }
    }

    /// Evaluate against an entity. Missing, empty, zero and `false`
    /// attributes never match.
    pub fn evaluate(&self, entity: &Entity) -> bool {
        entity
            .attribute(&self.field)
            .filter(|v| v.is_truthy())
            .is_some_and(|v| self.matcher.matches(&v.as_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_field_spec_priority() {
        let matcher = FieldMatch::from_field_spec(&spec(json!({"equals": "nope", "contains": "invoice"})));
        assert!(matches!(matcher, FieldMatch::Contains(ref s) if s == "invoice"));
        assert!(matcher.matches("Unpaid INVOICE from Acme"));

        let unknown = FieldMatch::from_field_spec(&spec(json!({"like": "x"})));
        assert!(!unknown.matches("x"));
    }

    #[test]
    fn test_filter_entry_priority() {
        let matcher = FieldMatch::from_filter_entry(&json!({"contains": "zzz", "regex": "^inv.*\\.pdf$"}));
        assert!(matcher.matches("Invoice-2025.PDF"));

        let plain = FieldMatch::from_filter_entry(&json!("Report"));
        assert!(plain.matches("quarterly report"));
    }

    #[test]
    fn test_field_spec_on_entity() {
        let entity = Entity::new("notes.md", "File").with_description("An onboarding guide");
        let empty = Entity::new("empty.md", "File");

        let starts = FieldSpec::new("description", FieldMatch::StartsWith("an".into()));
        assert!(starts.evaluate(&entity));
        assert!(!starts.evaluate(&empty));

        let ends = FieldSpec::new("description", FieldMatch::EndsWith("GUIDE".to_lowercase()));
        assert!(ends.evaluate(&entity));
    }

    #[test]
    fn test_falsy_attributes_never_match() {
        let entity = Entity::new("draft.md", "File")
            .with_property("pages", 0)
            .with_property("archived", false);

        let zero = FieldSpec::new("pages", FieldMatch::Equals("0".into()));
        assert!(!zero.evaluate(&entity));

        let flag = FieldSpec::new("archived", FieldMatch::Contains("false".into()));
        assert!(!flag.evaluate(&entity));
    }
}
