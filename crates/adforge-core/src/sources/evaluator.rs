//! Structural evaluator for creative outputs.
//!
//! Scores a creative output by the fraction of a fixed set of checks it
//! passes. Failed checks are reported as messages.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::creative::{CreativeOutput, MAX_HEADLINE_CHARS};
use crate::error::StageError;
use crate::models::{DataPackage, DataStatus, Evaluation, InsightsPackage};
use crate::stage::EvaluationSource;

/// Formats a healthy output should spread across (fewer if it has fewer
/// variants).
const MIN_DISTINCT_FORMATS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEvaluator;

impl HeuristicEvaluator {
    /// Run every check and collect a message for each failure.
    pub fn score(
        &self,
        creative: &CreativeOutput,
        data: &DataPackage,
        insights: &InsightsPackage,
    ) -> Evaluation {
        let variants = &creative.variants;
        let distinct_formats: HashSet<_> = variants.iter().map(|v| v.format).collect();
        let distinct_ids: HashSet<_> = variants.iter().map(|v| v.id.as_str()).collect();
        let long_headlines = variants
            .iter()
            .filter(|v| v.headline.chars().count() > MAX_HEADLINE_CHARS)
            .count();
        let wanted_formats = MIN_DISTINCT_FORMATS.min(variants.len());

        let checks: Vec<(bool, String)> = vec![
            (
                creative.is_ok(),
                format!(
                    "creative stage reported an error: {}",
                    creative.message.as_deref().unwrap_or("no detail")
                ),
            ),
            (!variants.is_empty(), "no creative variants produced".to_owned()),
            (
                long_headlines == 0,
                format!("{long_headlines} headlines exceed {MAX_HEADLINE_CHARS} characters"),
            ),
            (
                distinct_ids.len() == variants.len(),
                "variant ids are not unique".to_owned(),
            ),
            (
                distinct_formats.len() >= wanted_formats,
                format!(
                    "only {} distinct formats across {} variants",
                    distinct_formats.len(),
                    variants.len()
                ),
            ),
            (
                data.status != DataStatus::Failed,
                format!("data collection failed: {}", data.errors.join("; ")),
            ),
            (
                insights.error.is_none(),
                format!(
                    "insights unavailable: {}",
                    insights.error.as_deref().unwrap_or_default()
                ),
            ),
        ];

        let total = checks.len();
        let mut messages: Vec<String> = checks
            .into_iter()
            .filter(|(passed, _)| !passed)
            .map(|(_, msg)| msg)
            .collect();
        let passed = total - messages.len();

        if messages.is_empty() {
            messages.push(format!("all {total} checks passed"));
        }

        Evaluation {
            score: round2(passed as f64 / total as f64),
            messages,
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[async_trait]
impl EvaluationSource for HeuristicEvaluator {
    async fn evaluate(
        &self,
        creative: &CreativeOutput,
        data: &DataPackage,
        insights: &InsightsPackage,
    ) -> Result<Evaluation, StageError> {
        let evaluation = self.score(creative, data, insights);
        tracing::info!(score = evaluation.score, "evaluated creative output");
        Ok(evaluation)
    }
}
