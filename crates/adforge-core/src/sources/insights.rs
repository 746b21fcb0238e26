//! Insight source that reads insights precomputed alongside the data.

use async_trait::async_trait;

use crate::error::StageError;
use crate::models::{DataPackage, DataStatus, InsightsPackage};
use crate::stage::InsightSource;

/// Payload key holding the precomputed insights object.
pub const INSIGHTS_KEY: &str = "insights";

/// Takes the `insights` object out of a data payload. Performs no
/// computation of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedInsightSource;

#[async_trait]
impl InsightSource for PrecomputedInsightSource {
    async fn generate(&self, data: &DataPackage) -> Result<InsightsPackage, StageError> {
        if data.status != DataStatus::Ok {
            let reason = data
                .errors
                .first()
                .map(String::as_str)
                .unwrap_or("no detail");
            return Err(StageError::insight(format!(
                "data package is {}: {reason}",
                data.status
            )));
        }

        let raw = data
            .data
            .as_ref()
            .and_then(|payload| payload.get(INSIGHTS_KEY))
            .ok_or_else(|| StageError::insight("data payload has no insights object"))?;

        let insights: InsightsPackage = serde_json::from_value(raw.clone())
            .map_err(|e| StageError::insight(format!("malformed insights: {e}")))?;

        tracing::info!(keys = ?insights.keys(), "read precomputed insights");
        Ok(insights)
    }
}
