//! Condition evaluation - typed condition trees built once from query
//! clauses and evaluated per entity.
//!
//! A `where` clause compiles into a [`Condition`]:
//!
//! - `{all: [...]}`, `{any: [...]}`, `{not: ...}` combine sub-conditions
//! - `{field: value}` demands loose equality
//! - `{field: {op: value, ...}}` demands every listed operator to hold
//! - `"field op value"` strings are parsed as [`StringCondition`]s

mod expr;
mod field_match;
mod operator;

pub use expr::*;
pub use field_match::*;
pub use operator::*;

use graph_store::{Entity, PropertyValue};
use serde_json::Value;
use tracing::warn;

/// One test on one attribute.
#[derive(Debug, Clone)]
pub enum FieldCondition {
    /// Loose equality; a null value also matches a missing attribute.
    Equals { field: String, value: PropertyValue },
    Compare(OperatorCondition),
    /// An operator name that was not recognised; never matches.
    UnknownOperator { field: String, operator: String },
}

impl FieldCondition {
    /// Build from an operator name and operand.
    pub fn from_operator(field: &str, operator: &str, value: &Value) -> Self {
        match Operator::parse(operator) {
            Some(op) => FieldCondition::Compare(OperatorCondition::new(field, op, value.into())),
            None => {
                warn!(field, operator, "unknown operator in query condition");
                FieldCondition::UnknownOperator {
                    field: field.to_string(),
                    operator: operator.to_string(),
                }
            }
        }
    }

    /// Build the conditions for one clause entry: a mapping yields one
    /// operator condition per key, anything else an equality test.
    pub fn from_entry(field: &str, spec: &Value) -> Vec<Self> {
        match spec {
            Value::Object(ops) => ops
                .iter()
                .map(|(op, value)| Self::from_operator(field, op, value))
                .collect(),
            other => vec![FieldCondition::Equals {
                field: field.to_string(),
                value: other.into(),
            }],
        }
    }

    pub fn evaluate(&self, entity: &Entity) -> bool {
        match self {
            FieldCondition::Equals { field, value } => entity
                .attribute(field)
                .unwrap_or_default()
                .loose_eq(value),
            FieldCondition::Compare(cond) => cond.evaluate(entity),
            FieldCondition::UnknownOperator { .. } => false,
        }
    }
}

/// A compiled `where` condition.
#[derive(Debug, Clone)]
pub enum Condition {
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    /// Every field condition must hold.
    Fields(Vec<FieldCondition>),
    Expr(StringCondition),
    /// Unparseable input; never matches.
    Never,
}

impl Condition {
    /// Compile a condition from its clause value.
    ///
    /// In a mapping `all` takes precedence over `any`, which takes precedence
    /// over `not`; other keys are only read when none of the three is present.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(children) = map.get("all") {
                    Condition::All(Self::children(children))
                } else if let Some(children) = map.get("any") {
                    Condition::Any(Self::children(children))
                } else if let Some(child) = map.get("not") {
                    Condition::Not(Box::new(Self::from_value(child)))
                } else {
                    Condition::Fields(
                        map.iter()
                            .flat_map(|(field, spec)| FieldCondition::from_entry(field, spec))
                            .collect(),
                    )
                }
            }
            Value::String(text) => match StringCondition::parse(text) {
                Some(cond) => Condition::Expr(cond),
                None => {
                    warn!(condition = %text, "unparseable condition expression");
                    Condition::Never
                }
            },
            _ => Condition::Never,
        }
    }

    fn children(value: &Value) -> Vec<Condition> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_value).collect(),
            single => vec![Self::from_value(single)],
        }
    }

    /// Evaluate against an entity.
    pub fn evaluate(&self, entity: &Entity) -> bool {
        match self {
            Condition::All(children) => children.iter().all(|c| c.evaluate(entity)),
            Condition::Any(children) => children.iter().any(|c| c.evaluate(entity)),
            Condition::Not(child) => !child.evaluate(entity),
            Condition::Fields(fields) => fields.iter().all(|f| f.evaluate(entity)),
            Condition::Expr(expr) => expr.evaluate(entity),
            Condition::Never => false,
        }
    }
}

/// Text form of a clause value: strings as-is, everything else as JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity() -> Entity {
        Entity::new("John", "Person")
            .with_description("Backend engineer")
            .with_property("age", 41)
            .with_property("city", "Paris")
    }

    fn eval(value: Value) -> bool {
        Condition::from_value(&value).evaluate(&entity())
    }

    #[test]
    fn test_field_map() {
        assert!(eval(json!({"type": "Person", "age": {"gte": 40, "lt": 50}})));
        assert!(!eval(json!({"type": "Person", "age": {"gte": 40, "lt": 41}})));
        assert!(!eval(json!({"city": "London"})));
        assert!(eval(json!({"nickname": null})));
    }

    #[test]
    fn test_combinators() {
        assert!(eval(json!({"all": ["age > 30", {"city": "Paris"}]})));
        assert!(eval(json!({"any": ["age > 60", "city == Paris"]})));
        assert!(!eval(json!({"not": "description contains engineer"})));
        assert!(eval(json!({"not": {"any": ["age < 18", "city == Rome"]}})));
    }

    #[test]
    fn test_all_takes_precedence() {
        // `city` is ignored because `all` is present.
        assert!(eval(json!({"all": ["age > 30"], "city": "Rome"})));
    }

    #[test]
    fn test_unknown_operator_and_bad_input() {
        assert!(!eval(json!({"age": {"between": [1, 100]}})));
        assert!(!eval(json!("no operator here")));
        assert!(!eval(json!(42)));
        assert!(eval(json!({})));
    }
}
