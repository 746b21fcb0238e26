//! The stage traits: adapter interfaces for every pipeline collaborator.
//!
//! All traits are object-safe so they can be stored as `Box<dyn ...>` in
//! [`crate::pipeline::PipelineStages`].

use async_trait::async_trait;
use rand::rngs::StdRng;

use crate::creative::CreativeOutput;
use crate::error::StageError;
use crate::models::{DataPackage, Evaluation, ExecutionPlan, InsightsPackage};

/// Turns free task text into an [`ExecutionPlan`].
#[async_trait]
pub trait TaskClassifier: Send + Sync {
    async fn create_plan(&self, task: &str) -> Result<ExecutionPlan, StageError>;
}

/// Collects the raw data package an analytics plan needs.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn collect(&self, plan: &ExecutionPlan, task: &str) -> Result<DataPackage, StageError>;
}

/// Computes metrics and drivers from a data package.
#[async_trait]
pub trait InsightSource: Send + Sync {
    async fn generate(&self, data: &DataPackage) -> Result<InsightsPackage, StageError>;
}

/// Produces creative variants from insights.
///
/// The random source is owned by the caller so runs can be reproduced
/// from a seed.
#[async_trait]
pub trait CreativeStage: Send + Sync {
    async fn create_output(
        &self,
        insights: &InsightsPackage,
        plan: &ExecutionPlan,
        rng: &mut StdRng,
    ) -> Result<CreativeOutput, StageError>;
}

/// Scores a creative output against the data and insights it came from.
#[async_trait]
pub trait EvaluationSource: Send + Sync {
    async fn evaluate(
        &self,
        creative: &CreativeOutput,
        data: &DataPackage,
        insights: &InsightsPackage,
    ) -> Result<Evaluation, StageError>;
}

// Compile-time assertion: every stage trait must be usable as `dyn`.
const _: () = {
    fn _assert_object_safe(
        _: &dyn TaskClassifier,
        _: &dyn DataSource,
        _: &dyn InsightSource,
        _: &dyn CreativeStage,
        _: &dyn EvaluationSource,
    ) {
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier(ExecutionPlan);

    #[async_trait]
    impl TaskClassifier for FixedClassifier {
        async fn create_plan(&self, _task: &str) -> Result<ExecutionPlan, StageError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn classifier_is_usable_as_trait_object() {
        let classifier: Box<dyn TaskClassifier> =
            Box::new(FixedClassifier(ExecutionPlan::CreativeOnly));
        let plan = classifier.create_plan("anything").await.unwrap();
        assert!(plan.is_creative_only());
    }
}
