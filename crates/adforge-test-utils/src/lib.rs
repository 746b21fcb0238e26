//! Shared test doubles for adforge pipeline tests.
//!
//! Two kinds of stand-in stage:
//! - [`Counted`] wraps a real stage and counts how often it is invoked.
//! - [`Faulty`] implements every stage trait and either returns an error
//!   or panics, also counting invocations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;

use adforge_core::creative::{CreativeConfig, CreativeEngine, CreativeOutput};
use adforge_core::error::StageError;
use adforge_core::models::{DataPackage, Evaluation, ExecutionPlan, InsightsPackage};
use adforge_core::pipeline::{Pipeline, PipelineStages};
use adforge_core::planner::KeywordClassifier;
use adforge_core::sources::{FixtureDataSource, HeuristicEvaluator, PrecomputedInsightSource};
use adforge_core::stage::{
    CreativeStage, DataSource, EvaluationSource, InsightSource, Stage, TaskClassifier,
};

/// Shared invocation counter. Clones observe the same count.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A real stage wrapped with an invocation counter.
pub struct Counted<S> {
    inner: S,
    calls: Calls,
}

impl<S> Counted<S> {
    /// Wrap `inner`, returning the wrapper and a handle to its counter.
    pub fn new(inner: S) -> (Self, Calls) {
        let calls = Calls::default();
        (
            Self {
                inner,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl<S: TaskClassifier> TaskClassifier for Counted<S> {
    async fn create_plan(&self, task: &str) -> Result<ExecutionPlan, StageError> {
        self.calls.hit();
        self.inner.create_plan(task).await
    }
}

#[async_trait]
impl<S: DataSource> DataSource for Counted<S> {
    async fn collect(&self, plan: &ExecutionPlan, task: &str) -> Result<DataPackage, StageError> {
        self.calls.hit();
        self.inner.collect(plan, task).await
    }
}

#[async_trait]
impl<S: InsightSource> InsightSource for Counted<S> {
    async fn generate(&self, data: &DataPackage) -> Result<InsightsPackage, StageError> {
        self.calls.hit();
        self.inner.generate(data).await
    }
}

#[async_trait]
impl<S: CreativeStage> CreativeStage for Counted<S> {
    async fn create_output(
        &self,
        insights: &InsightsPackage,
        plan: &ExecutionPlan,
        rng: &mut StdRng,
    ) -> Result<CreativeOutput, StageError> {
        self.calls.hit();
        self.inner.create_output(insights, plan, rng).await
    }
}

#[async_trait]
impl<S: EvaluationSource> EvaluationSource for Counted<S> {
    async fn evaluate(
        &self,
        creative: &CreativeOutput,
        data: &DataPackage,
        insights: &InsightsPackage,
    ) -> Result<Evaluation, StageError> {
        self.calls.hit();
        self.inner.evaluate(creative, data, insights).await
    }
}

#[derive(Debug, Clone)]
enum Fault {
    Error(String),
    Panic(String),
}

/// A stage that always fails, by error or by panic.
#[derive(Debug, Clone)]
pub struct Faulty {
    fault: Fault,
    calls: Calls,
}

impl Faulty {
    /// Fail with the stage's tagged error carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            fault: Fault::Error(message.into()),
            calls: Calls::default(),
        }
    }

    /// Panic with `message`.
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            fault: Fault::Panic(message.into()),
            calls: Calls::default(),
        }
    }

    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }

    fn fail<T>(&self, stage: Stage) -> Result<T, StageError> {
        self.calls.hit();
        match &self.fault {
            Fault::Error(message) => Err(StageError::for_stage(stage, message.clone())),
            Fault::Panic(message) => panic!("{message}"),
        }
    }
}

#[async_trait]
impl TaskClassifier for Faulty {
    async fn create_plan(&self, _task: &str) -> Result<ExecutionPlan, StageError> {
        self.fail(Stage::Planner)
    }
}

#[async_trait]
impl DataSource for Faulty {
    async fn collect(&self, _plan: &ExecutionPlan, _task: &str) -> Result<DataPackage, StageError> {
        self.fail(Stage::Data)
    }
}

#[async_trait]
impl InsightSource for Faulty {
    async fn generate(&self, _data: &DataPackage) -> Result<InsightsPackage, StageError> {
        self.fail(Stage::Insights)
    }
}

#[async_trait]
impl CreativeStage for Faulty {
    async fn create_output(
        &self,
        _insights: &InsightsPackage,
        _plan: &ExecutionPlan,
        _rng: &mut StdRng,
    ) -> Result<CreativeOutput, StageError> {
        self.fail(Stage::Creative)
    }
}

#[async_trait]
impl EvaluationSource for Faulty {
    async fn evaluate(
        &self,
        _creative: &CreativeOutput,
        _data: &DataPackage,
        _insights: &InsightsPackage,
    ) -> Result<Evaluation, StageError> {
        self.fail(Stage::Evaluator)
    }
}

/// The reference stage set: keyword planner, embedded sample data,
/// precomputed insights, default creative engine and heuristic evaluator.
pub fn default_stages() -> PipelineStages {
    let engine =
        CreativeEngine::new(CreativeConfig::default()).expect("default creative config is valid");
    PipelineStages {
        classifier: Box::new(KeywordClassifier::default()),
        data: Box::new(FixtureDataSource::embedded()),
        insights: Box::new(PrecomputedInsightSource),
        creative: Box::new(engine),
        evaluator: Box::new(HeuristicEvaluator),
    }
}

/// A pipeline over `stages` with a fixed seed.
pub fn seeded_pipeline(stages: PipelineStages, seed: u64) -> Pipeline {
    Pipeline::new(stages, StdRng::seed_from_u64(seed))
}
