//! Per-segment creative drivers derived from an insights package.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{CopyHints, InsightsPackage, Severity};

/// Segment used when insights name no under-performing segment.
pub const GENERAL_AUDIENCE: &str = "audience:general";

/// What is wrong with a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverIssue {
    LowCtr,
    LowRoas,
    Exploratory,
}

impl fmt::Display for DriverIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LowCtr => "low_ctr",
            Self::LowRoas => "low_roas",
            Self::Exploratory => "exploratory",
        };
        f.write_str(s)
    }
}

/// Metric a creative is expected to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Ctr,
    Roas,
}

/// Recommended creative direction for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub issue: DriverIssue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas: Option<f64>,
    pub solution: String,
    pub severity: Severity,
    pub expected_metric: Metric,
    #[serde(flatten)]
    pub hints: CopyHints,
}

impl Driver {
    pub fn low_ctr(ctr: Option<f64>, hints: CopyHints) -> Self {
        Self {
            issue: DriverIssue::LowCtr,
            ctr,
            roas: None,
            solution: "UGC/video/testimonial to improve attention".to_owned(),
            severity: Severity::Medium,
            expected_metric: Metric::Ctr,
            hints,
        }
    }

    pub fn low_roas(roas: Option<f64>, hints: CopyHints) -> Self {
        Self {
            issue: DriverIssue::LowRoas,
            ctr: None,
            roas,
            solution: "offer + landing page test".to_owned(),
            severity: Severity::High,
            expected_metric: Metric::Roas,
            hints,
        }
    }

    pub fn exploratory() -> Self {
        Self {
            issue: DriverIssue::Exploratory,
            ctr: None,
            roas: None,
            solution: "run fast A/B tests with high-performing creative formats".to_owned(),
            severity: Severity::Low,
            expected_metric: Metric::Ctr,
            hints: CopyHints::default(),
        }
    }
}

/// Drivers keyed by segment, in first-insertion order.
///
/// Replacing an existing segment keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverMap {
    entries: Vec<(String, Driver)>,
}

impl DriverMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the driver for `segment`. Returns the replaced
    /// driver, if any.
    pub fn upsert(&mut self, segment: impl Into<String>, driver: Driver) -> Option<Driver> {
        let segment = segment.into();
        match self.entries.iter_mut().find(|(s, _)| *s == segment) {
            Some((_, slot)) => Some(std::mem::replace(slot, driver)),
            None => {
                self.entries.push((segment, driver));
                None
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, segment: &str) -> Option<&Driver> {
        self.entries
            .iter()
            .find(|(s, _)| s == segment)
            .map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Driver)> {
        self.entries.iter().map(|(s, d)| (s.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive one driver per segment from the low-CTR and low-ROAS lists.
///
/// Low-CTR segments are applied first and low-ROAS second, so a segment in
/// both lists ends up with the low-ROAS driver. When neither list names a
/// segment the map holds a single exploratory driver for
/// [`GENERAL_AUDIENCE`].
pub fn derive_drivers(insights: &InsightsPackage) -> DriverMap {
    let mut drivers = DriverMap::new();

    for seg in insights.low_ctr_segments.iter().flatten() {
        drivers.upsert(&seg.segment, Driver::low_ctr(seg.ctr, seg.hints.clone()));
    }

    for seg in insights.low_roas_segments.iter().flatten() {
        let replaced = drivers.upsert(&seg.segment, Driver::low_roas(seg.roas, seg.hints.clone()));
        if replaced.is_some() {
            tracing::debug!(segment = %seg.segment, "low ROAS driver replaces low CTR driver");
        }
    }

    if drivers.is_empty() {
        drivers.upsert(GENERAL_AUDIENCE, Driver::exploratory());
    }

    drivers
}
