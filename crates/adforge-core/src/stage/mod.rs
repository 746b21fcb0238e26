//! Stage interfaces for the creative pipeline.
//!
//! The pipeline runs five stages in a fixed order. Each stage is reached
//! through an object-safe trait, so the coordinator can hold any mix of
//! real and test implementations.
//!
//! ```text
//! task text
//!     |
//!     v
//! TaskClassifier --create_plan--> ExecutionPlan
//!     |
//!     v   (skipped when CreativeOnly)
//! DataSource ------collect------> DataPackage
//!     |
//!     v   (skipped when CreativeOnly)
//! InsightSource ---generate-----> InsightsPackage
//!     |
//!     v
//! CreativeStage ---create_output-> CreativeOutput
//!     |
//!     v
//! EvaluationSource --evaluate---> Evaluation
//! ```

pub mod trait_def;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use trait_def::{CreativeStage, DataSource, EvaluationSource, InsightSource, TaskClassifier};

/// One of the five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Planner,
    Data,
    Insights,
    Creative,
    Evaluator,
}

impl Stage {
    /// All stages in the order the coordinator runs them.
    pub const ALL: [Stage; 5] = [
        Stage::Planner,
        Stage::Data,
        Stage::Insights,
        Stage::Creative,
        Stage::Evaluator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Data => "data",
            Self::Insights => "insights",
            Self::Creative => "creative",
            Self::Evaluator => "evaluator",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
