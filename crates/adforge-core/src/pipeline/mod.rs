//! Pipeline coordinator: runs the five stages in order, isolating each
//! stage's failures so a run always finishes with a complete result.

pub mod trace;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::Instrument;

use crate::creative::CreativeOutput;
use crate::error::StageError;
use crate::models::{DataPackage, DataSummary, Evaluation, ExecutionPlan, InsightsPackage};
use crate::stage::{
    CreativeStage, DataSource, EvaluationSource, InsightSource, Stage, TaskClassifier,
};

pub use trace::{RunResult, RunStatus, RunTrace, StageStatus, StageTrace, round_millis};

/// The collaborators a pipeline drives, one per stage.
pub struct PipelineStages {
    pub classifier: Box<dyn TaskClassifier>,
    pub data: Box<dyn DataSource>,
    pub insights: Box<dyn InsightSource>,
    pub creative: Box<dyn CreativeStage>,
    pub evaluator: Box<dyn EvaluationSource>,
}

/// Sequences the stages of one run and assembles its trace.
///
/// The random source lives here so a seeded pipeline reproduces the same
/// variant angles, CTAs and ids across runs.
pub struct Pipeline {
    stages: PipelineStages,
    rng: StdRng,
}

impl Pipeline {
    pub fn new(stages: PipelineStages, rng: StdRng) -> Self {
        Self { stages, rng }
    }

    /// Run every stage for `task`.
    ///
    /// Never fails: a stage that errors or panics is recorded in the trace
    /// and replaced by a placeholder value for the stages after it.
    pub async fn run(&mut self, task: &str) -> RunTrace {
        let run_started = Instant::now();
        let mut trace = RunTrace::new(task);
        tracing::info!(task = %task, "pipeline run started");

        // 1. Planner. A failed classification falls back to the full path.
        let (outcome, secs) =
            guarded(Stage::Planner, self.stages.classifier.create_plan(task)).await;
        let plan = match outcome {
            Ok(plan) => {
                let entry = StageTrace::new(StageStatus::Ok)
                    .with("output_summary", json!(plan));
                trace.record(Stage::Planner, entry, secs);
                plan
            }
            Err(err) => {
                tracing::warn!(error = %err, "classification failed, running full pipeline");
                trace.record(Stage::Planner, StageTrace::from_error(&err), secs);
                ExecutionPlan::empty()
            }
        };
        let creative_only = plan.is_creative_only();

        // 2. Data.
        let data = if creative_only {
            let started = Instant::now();
            let pkg = DataPackage::skipped();
            trace.record(Stage::Data, StageTrace::skipped(), started.elapsed().as_secs_f64());
            pkg
        } else {
            let (outcome, secs) =
                guarded(Stage::Data, self.stages.data.collect(&plan, task)).await;
            match outcome {
                Ok(pkg) => {
                    let entry = StageTrace::new(pkg.status.into())
                        .with("source", json!(pkg.source))
                        .with("meta", json!(pkg.meta));
                    trace.record(Stage::Data, entry, secs);
                    pkg
                }
                Err(err) => {
                    tracing::warn!(error = %err, "data stage failed");
                    trace.record(Stage::Data, StageTrace::from_error(&err), secs);
                    DataPackage::failed(err.message())
                }
            }
        };

        // 3. Insights.
        let insights = if creative_only {
            let started = Instant::now();
            let insights = InsightsPackage::default();
            trace.record(
                Stage::Insights,
                StageTrace::skipped(),
                started.elapsed().as_secs_f64(),
            );
            insights
        } else {
            let (outcome, secs) =
                guarded(Stage::Insights, self.stages.insights.generate(&data)).await;
            match outcome {
                Ok(insights) => {
                    let entry = StageTrace::new(StageStatus::Ok)
                        .with("summary_keys", json!(insights.keys()));
                    trace.record(Stage::Insights, entry, secs);
                    insights
                }
                Err(err) => {
                    tracing::warn!(error = %err, "insight stage failed");
                    trace.record(Stage::Insights, StageTrace::from_error(&err), secs);
                    InsightsPackage::from_error(err.message())
                }
            }
        };

        // 4. Creative, always.
        let creative_fut = self
            .stages
            .creative
            .create_output(&insights, &plan, &mut self.rng);
        let (outcome, secs) = guarded(Stage::Creative, creative_fut).await;
        let creative = match outcome {
            Ok(output) => {
                let mut entry = StageTrace::new(output.status.into())
                    .with("n_variants", json!(output.variants.len()));
                if let Some(message) = &output.message {
                    entry = entry.with("message", json!(message));
                }
                trace.record(Stage::Creative, entry, secs);
                output
            }
            Err(err) => {
                tracing::warn!(error = %err, "creative stage failed");
                trace.record(Stage::Creative, StageTrace::from_error(&err), secs);
                CreativeOutput::error(err.message())
            }
        };

        // 5. Evaluator, always.
        let (outcome, secs) = guarded(
            Stage::Evaluator,
            self.stages.evaluator.evaluate(&creative, &data, &insights),
        )
        .await;
        let evaluation = match outcome {
            Ok(evaluation) => {
                let entry =
                    StageTrace::new(StageStatus::Ok).with("score", json!(evaluation.score));
                trace.record(Stage::Evaluator, entry, secs);
                evaluation
            }
            Err(err) => {
                tracing::warn!(error = %err, "evaluation stage failed");
                trace.record(Stage::Evaluator, StageTrace::from_error(&err), secs);
                Evaluation::failed(err.message())
            }
        };

        let score = evaluation.score;
        let result = RunResult {
            plan,
            data_package: DataSummary::from(&data),
            insights,
            creative_output: creative,
            evaluation,
        };
        trace.finish(result, run_started.elapsed().as_secs_f64());

        tracing::info!(
            score,
            total_time_s = trace.total_time_s,
            "pipeline run finished"
        );
        trace
    }
}

/// Await one stage inside its tracing span, converting a panic into that
/// stage's error. Returns the outcome and the elapsed seconds.
async fn guarded<T, F>(stage: Stage, fut: F) -> (Result<T, StageError>, f64)
where
    F: Future<Output = Result<T, StageError>>,
{
    let started = Instant::now();
    let span = tracing::info_span!("stage", stage = %stage);
    let outcome = match AssertUnwindSafe(fut.instrument(span)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(stage = %stage, panic = %message, "stage panicked");
            Err(StageError::for_stage(stage, message))
        }
    };
    (outcome, started.elapsed().as_secs_f64())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");

        let owned: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(owned.as_ref()), "kaboom");

        let other: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(other.as_ref()), "stage panicked");
    }

    async fn explode() -> Result<(), StageError> {
        panic!("disk on fire")
    }

    #[tokio::test]
    async fn guarded_converts_panics_to_stage_errors() {
        let (outcome, secs) = guarded(Stage::Data, explode()).await;
        assert_eq!(outcome, Err(StageError::collection("disk on fire")));
        assert!(secs >= 0.0);
    }

    #[tokio::test]
    async fn guarded_passes_errors_through() {
        let (outcome, _) =
            guarded::<(), _>(Stage::Insights, async { Err(StageError::insight("bad")) }).await;
        assert_eq!(outcome.unwrap_err().kind(), "insight_error");
    }
}
