//! One-line string conditions such as `age > 30` or `name CONTAINS "jo"`.

use graph_store::Entity;
use regex::Regex;
use std::sync::OnceLock;

static EXPRESSION: OnceLock<Option<Regex>> = OnceLock::new();

fn expression() -> Option<&'static Regex> {
    EXPRESSION
        .get_or_init(|| {
            Regex::new(r#"(?i)^\s*(\w+)\s*([><=!]+|CONTAINS)\s*(["'].*["']|\S+)\s*"#).ok()
        })
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprOperator {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Ne,
    Contains,
    /// Matched the symbol class but is not a known comparison (e.g. `=>`).
    Unsupported,
}

impl ExprOperator {
    fn parse(symbol: &str) -> Self {
        match symbol.to_uppercase().as_str() {
            ">" => ExprOperator::Gt,
            "<" => ExprOperator::Lt,
            ">=" => ExprOperator::Gte,
            "<=" => ExprOperator::Lte,
            "==" => ExprOperator::Eq,
            "!=" => ExprOperator::Ne,
            "CONTAINS" => ExprOperator::Contains,
            _ => ExprOperator::Unsupported,
        }
    }
}

/// A parsed `field op value` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct StringCondition {
    field: String,
    operator: ExprOperator,
    value: String,
}

impl StringCondition {
    /// Parse an expression. Returns `None` when the text has no
    /// `field op value` prefix.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = expression()?.captures(text)?;
        Some(Self {
            field: caps[1].to_string(),
            operator: ExprOperator::parse(&caps[2]),
            value: caps[3].trim_matches(|c| c == '"' || c == '\'').to_string(),
        })
    }

    /// Field name the expression reads.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Evaluate against an entity.
    ///
    /// `CONTAINS` is a case-insensitive substring test. The other operators
    /// compare numerically when both sides parse as numbers; otherwise only
    /// `==` and `!=` fall back to comparing the text.
    pub fn evaluate(&self, entity: &Entity) -> bool {
        let Some(actual) = entity.attribute(&self.field).filter(|v| !v.is_null()) else {
            return false;
        };

        if self.operator == ExprOperator::Contains {
            return actual
                .as_text()
                .to_lowercase()
                .contains(&self.value.to_lowercase());
        }

        let expected = self.value.trim().parse::<f64>().ok();
        match (actual.as_number(), expected) {
            (Some(a), Some(b)) => match self.operator {
                ExprOperator::Gt => a > b,
                ExprOperator::Lt => a < b,
                ExprOperator::Gte => a >= b,
                ExprOperator::Lte => a <= b,
                ExprOperator::Eq => a == b,
                ExprOperator::Ne => a != b,
                ExprOperator::Contains | ExprOperator::Unsupported => false,
            },
            _ => match self.operator {
                ExprOperator::Eq => actual.as_text() == self.value,
                ExprOperator::Ne => actual.as_text() != self.value,
                _ => false,
            },
        }
    }
}
