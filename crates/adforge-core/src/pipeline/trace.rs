//! Run trace: per-stage status, timing and the aggregated result.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::creative::{CreativeOutput, CreativeStatus};
use crate::error::StageError;
use crate::models::{DataStatus, DataSummary, Evaluation, ExecutionPlan, InsightsPackage};
use crate::stage::Stage;

/// Lifecycle of a run. A run that returns is always `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    Finished,
}

/// Outcome of a single stage as recorded in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Ok,
    /// The stage raised (or panicked) and a placeholder was substituted.
    Error,
    /// The stage ran but reported a failed package.
    Failed,
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

impl From<DataStatus> for StageStatus {
    fn from(status: DataStatus) -> Self {
        match status {
            DataStatus::Ok => Self::Ok,
            DataStatus::Failed => Self::Failed,
            DataStatus::Skipped => Self::Skipped,
        }
    }
}

impl From<CreativeStatus> for StageStatus {
    fn from(status: CreativeStatus) -> Self {
        match status {
            CreativeStatus::Ok => Self::Ok,
            CreativeStatus::Error => Self::Error,
        }
    }
}

/// Trace entry for one stage: a status plus stage-specific diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl StageTrace {
    pub fn new(status: StageStatus) -> Self {
        Self {
            status,
            error: None,
            error_kind: None,
            details: Map::new(),
        }
    }

    pub fn skipped() -> Self {
        Self::new(StageStatus::Skipped)
    }

    pub fn from_error(err: &StageError) -> Self {
        Self {
            status: StageStatus::Error,
            error: Some(err.message().to_owned()),
            error_kind: Some(err.kind().to_owned()),
            details: Map::new(),
        }
    }

    /// Attach a diagnostic field.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_owned(), value);
        self
    }
}

/// The five sections every run produces, however many stages degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub plan: ExecutionPlan,
    pub data_package: DataSummary,
    pub insights: InsightsPackage,
    pub creative_output: CreativeOutput,
    pub evaluation: Evaluation,
}

/// Everything recorded about one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTrace {
    pub task: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub agent_traces: BTreeMap<Stage, StageTrace>,
    /// Seconds per stage, rounded to milliseconds.
    pub timing: BTreeMap<Stage, f64>,
    pub result: Option<RunResult>,
    pub total_time_s: f64,
}

impl RunTrace {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            status: RunStatus::Started,
            started_at: Utc::now(),
            agent_traces: BTreeMap::new(),
            timing: BTreeMap::new(),
            result: None,
            total_time_s: 0.0,
        }
    }

    pub fn record(&mut self, stage: Stage, entry: StageTrace, seconds: f64) {
        self.agent_traces.insert(stage, entry);
        self.timing.insert(stage, round_millis(seconds));
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageTrace> {
        self.agent_traces.get(&stage)
    }

    pub fn finish(&mut self, result: RunResult, total_seconds: f64) {
        self.status = RunStatus::Finished;
        self.result = Some(result);
        self.total_time_s = round_millis(total_seconds);
    }

    /// Top-level fields in display order, each rendered to JSON. The five
    /// result sections stay nested under `result`.
    pub fn sections(&self) -> serde_json::Result<Vec<(&'static str, Value)>> {
        Ok(vec![
            ("task", serde_json::to_value(&self.task)?),
            ("status", serde_json::to_value(self.status)?),
            ("started_at", serde_json::to_value(self.started_at)?),
            ("agent_traces", serde_json::to_value(&self.agent_traces)?),
            ("timing", serde_json::to_value(&self.timing)?),
            ("result", serde_json::to_value(&self.result)?),
            ("total_time_s", serde_json::to_value(self.total_time_s)?),
        ])
    }
}

/// Round to three decimal places.
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_millis_keeps_three_decimals() {
        assert_eq!(round_millis(0.123456), 0.123);
        assert_eq!(round_millis(2.0006), 2.001);
        assert_eq!(round_millis(0.0), 0.0);
    }

    #[test]
    fn stage_trace_flattens_details() {
        let entry = StageTrace::new(StageStatus::Ok).with("n_variants", json!(3));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "status": "ok", "n_variants": 3 })
        );
    }

    #[test]
    fn error_trace_carries_message_and_kind() {
        let entry = StageTrace::from_error(&StageError::collection("timeout"));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "status": "error", "error": "timeout", "error_kind": "collection_error" })
        );
    }

    #[test]
    fn agent_traces_are_keyed_by_stage() {
        let mut trace = RunTrace::new("t");
        trace.record(Stage::Evaluator, StageTrace::new(StageStatus::Ok), 0.0);
        trace.record(Stage::Planner, StageTrace::new(StageStatus::Ok), 0.0);
        let stages: Vec<Stage> = trace.agent_traces.keys().copied().collect();
        assert_eq!(stages, vec![Stage::Planner, Stage::Evaluator]);

        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(value["agent_traces"]["planner"]["status"], "ok");
        assert_eq!(value["timing"]["evaluator"], json!(0.0));
    }

    #[test]
    fn sections_cover_every_top_level_field() {
        let mut trace = RunTrace::new("t");
        trace.record(
            Stage::Data,
            StageTrace::from_error(&StageError::collection("timeout")),
            0.25,
        );

        let sections = trace.sections().unwrap();
        let names: Vec<&str> = sections.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["task", "status", "started_at", "agent_traces", "timing", "result", "total_time_s"]
        );

        let value = serde_json::to_value(&trace).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), names.len());
        for name in &names {
            assert!(object.contains_key(*name), "missing {name}");
        }

        let traces = &sections[3].1;
        assert_eq!(traces["data"]["error"], "timeout");
        assert_eq!(sections[4].1["data"], json!(0.25));
    }
}
