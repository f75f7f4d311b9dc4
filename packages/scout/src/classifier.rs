//! Text classification boundary.
//!
//! The pipeline only depends on single-text scoring; how the score is
//! produced (local heuristic, remote model) is behind the trait.

use crate::types::Classification;

/// Single-text scorer: label plus a confidence in [0, 1].
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

/// Deterministic lexical scorer used as the default implementation.
///
/// Scores by vocabulary hits: each distinct matched term contributes a fixed
/// increment, clamped to 1.0. Good enough to drive the confidence gate
/// without dragging in an ML runtime; swap in a model-backed `Classifier`
/// where real scoring is needed.
pub struct LexicalClassifier {
    vocabulary: Vec<&'static str>,
    per_hit: f32,
}

const TECH_VOCABULARY: &[&str] = &[
    "software",
    "engineer",
    "developer",
    "programming",
    "backend",
    "frontend",
    "cloud",
    "api",
    "database",
    "python",
    "rust",
    "java",
    "javascript",
    "kubernetes",
    "docker",
    "microservices",
    "ci/cd",
    "agile",
    "distributed",
    "scalable",
];

impl LexicalClassifier {
    pub fn new() -> Self {
        Self {
            vocabulary: TECH_VOCABULARY.to_vec(),
            per_hit: 0.15,
        }
    }
}

impl Default for LexicalClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LexicalClassifier {
    fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();
        let hits = self
            .vocabulary
            .iter()
            .filter(|term| lower.contains(*term))
            .count();

        let score = (hits as f32 * self.per_hit).min(1.0);
        let label = if score >= 0.5 { "tech" } else { "other" };

        Classification {
            label: label.to_string(),
            score,
        }
    }
}
