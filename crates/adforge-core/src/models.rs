//! Records exchanged between pipeline stages.
//!
//! Every type here is created fresh for a single run and serialised as-is
//! into the final result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Execution plan
// ---------------------------------------------------------------------------

/// Step label the classifier emits for the creative-only fast path.
pub const CREATIVE_ONLY_STEP: &str = "generate_creatives";

/// What the classifier decided to do with a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum ExecutionPlan {
    /// Skip data collection and insights; go straight to creatives.
    CreativeOnly,
    /// Full analytics path, described by ordered human-readable steps.
    Steps(Vec<String>),
}

impl ExecutionPlan {
    /// An analytics plan with no steps. Used when classification fails.
    pub fn empty() -> Self {
        Self::Steps(Vec::new())
    }

    pub fn is_creative_only(&self) -> bool {
        matches!(self, Self::CreativeOnly)
    }

    /// The step labels, with the sentinel rendered as its single step.
    pub fn steps(&self) -> Vec<&str> {
        match self {
            Self::CreativeOnly => vec![CREATIVE_ONLY_STEP],
            Self::Steps(steps) => steps.iter().map(String::as_str).collect(),
        }
    }
}

impl From<Vec<String>> for ExecutionPlan {
    fn from(steps: Vec<String>) -> Self {
        if steps.len() == 1 && steps[0] == CREATIVE_ONLY_STEP {
            Self::CreativeOnly
        } else {
            Self::Steps(steps)
        }
    }
}

impl From<ExecutionPlan> for Vec<String> {
    fn from(plan: ExecutionPlan) -> Self {
        match plan {
            ExecutionPlan::CreativeOnly => vec![CREATIVE_ONLY_STEP.to_owned()],
            ExecutionPlan::Steps(steps) => steps,
        }
    }
}

// ---------------------------------------------------------------------------
// Data package
// ---------------------------------------------------------------------------

/// Outcome of the data-collection stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Ok,
    Failed,
    Skipped,
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Raw data handed from the data source to the insight source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPackage {
    pub status: DataStatus,
    /// Where the payload came from (file path, "embedded_sample", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl DataPackage {
    /// A successfully collected package.
    pub fn ok(source: impl Into<String>, data: Value, meta: Map<String, Value>) -> Self {
        Self {
            status: DataStatus::Ok,
            source: Some(source.into()),
            data: Some(data),
            errors: Vec::new(),
            meta,
        }
    }

    /// Placeholder for a collection that raised an error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: DataStatus::Failed,
            source: None,
            data: None,
            errors: vec![message.into()],
            meta: Map::new(),
        }
    }

    /// Placeholder used when the plan never needed data.
    pub fn skipped() -> Self {
        Self {
            status: DataStatus::Skipped,
            source: None,
            data: None,
            errors: Vec::new(),
            meta: Map::new(),
        }
    }
}

/// The part of a [`DataPackage`] that ends up in the final result. The raw
/// payload is deliberately left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub status: DataStatus,
    pub meta: Map<String, Value>,
}

impl From<&DataPackage> for DataSummary {
    fn from(pkg: &DataPackage) -> Self {
        Self {
            status: pkg.status,
            meta: pkg.meta.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Insights package
// ---------------------------------------------------------------------------

/// Severity attached to drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(SeverityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Severity`] string.
#[derive(Debug, Clone)]
pub struct SeverityParseError(pub String);

impl fmt::Display for SeverityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid severity: {:?}", self.0)
    }
}

impl std::error::Error for SeverityParseError {}

/// A ranked metric movement reported by the insight source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSignal {
    pub segment: String,
    pub metric: String,
    pub delta_pct: f64,
    pub severity: Severity,
}

/// Optional copy hints a segment record may carry. They feed template
/// placeholders that would otherwise fall back to stock phrasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agitation: Option<String>,
}

/// An under-performing segment, as listed in `low_ctr_segments` or
/// `low_roas_segments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetric {
    pub segment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas: Option<f64>,
    #[serde(flatten)]
    pub hints: CopyHints,
}

impl SegmentMetric {
    pub fn with_ctr(segment: impl Into<String>, ctr: f64) -> Self {
        Self {
            segment: segment.into(),
            ctr: Some(ctr),
            roas: None,
            hints: CopyHints::default(),
        }
    }

    pub fn with_roas(segment: impl Into<String>, roas: f64) -> Self {
        Self {
            segment: segment.into(),
            ctr: None,
            roas: Some(roas),
            hints: CopyHints::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas_trend_slope: Option<f64>,
}

/// Aggregated metrics and drivers computed from a [`DataPackage`].
///
/// An entirely empty package means "no analytical signal" (creative-only
/// runs). A package whose `error` is set signals an upstream failure.
/// Keys this crate does not know about are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_ctr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_roas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drivers: Option<Vec<DriverSignal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_ctr_segments: Option<Vec<SegmentMetric>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_roas_segments: Option<Vec<SegmentMetric>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InsightsPackage {
    /// A package carrying only an upstream error marker.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// `true` when no key at all is present.
    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Names of the keys present, in declaration order followed by any
    /// unknown keys.
    pub fn keys(&self) -> Vec<String> {
        let known = [
            ("error", self.error.is_some()),
            ("avg_ctr", self.avg_ctr.is_some()),
            ("avg_roas", self.avg_roas.is_some()),
            ("drivers", self.drivers.is_some()),
            ("low_ctr_segments", self.low_ctr_segments.is_some()),
            ("low_roas_segments", self.low_roas_segments.is_some()),
            ("trend", self.trend.is_some()),
        ];
        known
            .iter()
            .filter(|(_, present)| *present)
            .map(|(name, _)| (*name).to_owned())
            .chain(self.extra.keys().cloned())
            .collect()
    }

    /// Slope of the ROAS trend, `0.0` when not reported.
    pub fn roas_trend_slope(&self) -> f64 {
        self.trend
            .as_ref()
            .and_then(|t| t.roas_trend_slope)
            .unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Score assigned to a creative output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Evaluation {
    /// Zero score carrying the failure as its only message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            messages: vec![message.into()],
        }
    }
}
