//! Semantic-similarity filtering and threshold parsing.

use graph_store::GraphStore;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{error, warn};

use crate::embedding::{dot, EmbeddingProvider};
use crate::error::Result;

static THRESHOLD: OnceLock<Option<Regex>> = OnceLock::new();

fn threshold_expression() -> Option<&'static Regex> {
    THRESHOLD
        .get_or_init(|| Regex::new(r"^\s*(>=|<=|>|<|==|!=)\s*([-\d.]+)\s*$").ok())
        .as_ref()
}

/// Comparison applied to a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
    Ne,
}

impl Comparison {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">=" => Some(Comparison::Gte),
            ">" => Some(Comparison::Gt),
            "<=" => Some(Comparison::Lte),
            "<" => Some(Comparison::Lt),
            "==" => Some(Comparison::Eq),
            "!=" => Some(Comparison::Ne),
            _ => None,
        }
    }
}

/// A similarity threshold such as `> 0.7`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub comparison: Comparison,
    pub value: f64,
}

impl Threshold {
    /// `>= value`.
    pub fn at_least(value: f64) -> Self {
        Self {
            comparison: Comparison::Gte,
            value,
        }
    }

    /// Parse a `threshold` clause.
    ///
    /// A number means `>= n`. A string may carry an operator (`"> 0.7"`) or
    /// be a bare number. Anything else falls back to `>= 0.0`.
    pub fn parse(spec: &Value) -> Self {
        match spec {
            Value::Number(n) => match n.as_f64() {
                Some(value) => Self::at_least(value),
                None => Self::fallback(spec),
            },
            Value::String(text) => Self::parse_str(text).unwrap_or_else(|| Self::fallback(spec)),
            _ => Self::fallback(spec),
        }
    }

    fn parse_str(text: &str) -> Option<Self> {
        if let Some(caps) = threshold_expression().and_then(|re| re.captures(text)) {
            if let (Some(comparison), Ok(value)) =
                (Comparison::from_symbol(&caps[1]), caps[2].parse::<f64>())
            {
                return Some(Self { comparison, value });
            }
        }
        text.trim().parse::<f64>().ok().map(Self::at_least)
    }

    fn fallback(spec: &Value) -> Self {
        warn!(threshold = %spec, "could not parse similarity threshold, using >= 0.0");
        Self::at_least(0.0)
    }

    /// Check a similarity score against the threshold.
    pub fn accepts(&self, similarity: f64) -> bool {
        match self.comparison {
            Comparison::Gte => similarity >= self.value,
            Comparison::Gt => similarity > self.value,
            Comparison::Lte => similarity <= self.value,
            Comparison::Lt => similarity < self.value,
            Comparison::Eq => similarity == self.value,
            Comparison::Ne => similarity != self.value,
        }
    }
}

/// `similar_to` + `threshold` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticFilter {
    pub similar_to: String,
    pub threshold: Threshold,
}

impl SemanticFilter {
    pub fn new(similar_to: impl Into<String>, threshold: Threshold) -> Self {
        Self {
            similar_to: similar_to.into(),
            threshold,
        }
    }

    fn query_embedding(&self, provider: &dyn EmbeddingProvider) -> Result<Vec<f32>> {
        Ok(provider.embed(&self.similar_to)?)
    }
}

/// Keep candidates whose embedding text is similar enough to the query.
///
/// Without a provider the result is empty. A failure to embed the query
/// also empties the result; a failure on one candidate drops only that
/// candidate.
pub fn by_semantic_similarity(
    store: &GraphStore,
    provider: Option<&dyn EmbeddingProvider>,
    candidates: Vec<String>,
    filter: &SemanticFilter,
) -> Vec<String> {
    let Some(provider) = provider else {
        warn!("no embedding provider available for semantic filtering");
        return Vec::new();
    };

    let target = match filter.query_embedding(provider) {
        Ok(target) => target,
        Err(e) => {
            error!(similar_to = %filter.similar_to, error = %e, "could not embed similarity query");
            return Vec::new();
        }
    };

    candidates
        .into_iter()
        .filter(|id| {
            let Some(entity) = store.get_entity(id) else {
                return false;
            };
            match provider.embed(entity.embedding_text()) {
                Ok(embedding) => filter.threshold.accepts(f64::from(dot(&target, &embedding))),
                Err(e) => {
                    warn!(candidate = %id, error = %e, "could not score candidate similarity");
                    false
                }
            }
        })
        .collect()
}
