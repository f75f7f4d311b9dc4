//! Filter engine: the ordered, short-circuiting accept/reject decision.
//!
//! Three gates, each terminal on failure: classifier confidence, role
//! heuristic, geographic eligibility. Deterministic given identical inputs:
//! no retries, no external calls.

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::roles;
use crate::types::Classification;

/// Tunables for the filter decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterContext {
    pub min_score: f32,
}

impl Default for FilterContext {
    fn default() -> Self {
        Self { min_score: 0.5 }
    }
}

/// The full decision, with a human-readable reason for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub passed: bool,
    pub reason: String,
    pub score: f32,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl FilterResult {
    fn rejected(reason: String, score: f32) -> Self {
        Self {
            passed: false,
            reason,
            score,
            region: None,
            city: None,
        }
    }
}

/// Inputs for one evaluation. All extracted fields are optional.
#[derive(Debug, Clone, Default)]
pub struct FilterInput<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub location: Option<&'a str>,
}

/// Evaluate the ordered gates. The first failing gate is the decision.
pub fn evaluate(
    classification: &Classification,
    input: FilterInput<'_>,
    context: &FilterContext,
) -> FilterResult {
    let score = classification.score;

    // Gate 1: model confidence.
    if score < context.min_score {
        return FilterResult::rejected(
            format!(
                "model score below threshold ({score:.2} < {:.2})",
                context.min_score
            ),
            score,
        );
    }

    // Gate 2: role heuristic.
    let verdict = roles::is_dev_role(input.title, input.description, input.summary);
    if !verdict.is_dev {
        return FilterResult::rejected(verdict.reason, score);
    }

    // Gate 3: geographic eligibility.
    let resolution = geo::resolve(input.location);
    if !resolution.eligible {
        return FilterResult {
            passed: false,
            reason: "location outside Israel".to_string(),
            score,
            region: Some(resolution.region),
            city: resolution.city,
        };
    }

    FilterResult {
        passed: true,
        reason: "passed filter".to_string(),
        score,
        region: Some(resolution.region),
        city: resolution.city,
    }
}
