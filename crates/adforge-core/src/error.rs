//! Tagged errors raised by pipeline stages and by configuration checks.

use thiserror::Error;

use crate::stage::Stage;

/// A failure inside one pipeline stage.
///
/// Each variant names the stage that raised it, so the coordinator can
/// record the failure against the right trace entry without inspecting
/// the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("classification failed: {message}")]
    Classification { message: String },

    #[error("data collection failed: {message}")]
    Collection { message: String },

    #[error("insight generation failed: {message}")]
    Insight { message: String },

    #[error("creative generation failed: {message}")]
    Creative { message: String },

    #[error("evaluation failed: {message}")]
    Evaluation { message: String },
}

impl StageError {
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification {
            message: message.into(),
        }
    }

    pub fn collection(message: impl Into<String>) -> Self {
        Self::Collection {
            message: message.into(),
        }
    }

    pub fn insight(message: impl Into<String>) -> Self {
        Self::Insight {
            message: message.into(),
        }
    }

    pub fn creative(message: impl Into<String>) -> Self {
        Self::Creative {
            message: message.into(),
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Build the error a given stage raises.
    pub fn for_stage(stage: Stage, message: impl Into<String>) -> Self {
        match stage {
            Stage::Planner => Self::classification(message),
            Stage::Data => Self::collection(message),
            Stage::Insights => Self::insight(message),
            Stage::Creative => Self::creative(message),
            Stage::Evaluator => Self::evaluation(message),
        }
    }

    /// The stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Classification { .. } => Stage::Planner,
            Self::Collection { .. } => Stage::Data,
            Self::Insight { .. } => Stage::Insights,
            Self::Creative { .. } => Stage::Creative,
            Self::Evaluation { .. } => Stage::Evaluator,
        }
    }

    /// The bare message, without the stage prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Classification { message }
            | Self::Collection { message }
            | Self::Insight { message }
            | Self::Creative { message }
            | Self::Evaluation { message } => message,
        }
    }

    /// Short machine-readable tag recorded in run traces.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Classification { .. } => "classification_error",
            Self::Collection { .. } => "collection_error",
            Self::Insight { .. } => "insight_error",
            Self::Creative { .. } => "creative_error",
            Self::Evaluation { .. } => "evaluation_error",
        }
    }
}

/// Invalid engine configuration, detected once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("creative format list must not be empty")]
    NoFormats,

    #[error("unknown creative format {0:?}")]
    UnknownFormat(String),

    #[error("template {template} uses placeholder {{{placeholder}}} which has no resolver")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("template {template} has an unterminated placeholder")]
    UnterminatedPlaceholder { template: String },
}
