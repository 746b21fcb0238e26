//! Executive summary aligned with insight drivers.

use serde::{Deserialize, Serialize};

use crate::models::InsightsPackage;

/// How many drivers are spelled out under "Opportunities".
const SHOWN_DRIVERS: usize = 3;

const NO_DRIVERS_NOTE: &str =
    "No clear metric-driven issues - run exploratory UGC + video testing.";
const FALLING_ROAS_RISK: &str = "ROAS trend decreasing - avoid aggressive scaling.";
const LOW_CONFIDENCE_RISK: &str =
    "Low statistical confidence in smaller segments - use rolling windows.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    /// The three sections below, rendered under fixed headers.
    pub text: String,
    pub observations: Vec<String>,
    pub opportunities: Vec<String>,
    /// Never empty.
    pub risks: Vec<String>,
}

impl ExecutiveSummary {
    /// Build the summary from aggregate metrics, drivers and trend.
    pub fn from_insights(insights: &InsightsPackage) -> Self {
        let mut observations = Vec::new();
        if let Some(ctr) = insights.avg_ctr {
            observations.push(format!("Global CTR: {ctr:.4}"));
        }
        if let Some(roas) = insights.avg_roas {
            observations.push(format!("Global ROAS: {roas:.2}"));
        }

        let drivers = insights.drivers.as_deref().unwrap_or_default();
        let mut opportunities = Vec::new();
        if drivers.is_empty() {
            opportunities.push(NO_DRIVERS_NOTE.to_owned());
        } else {
            opportunities.push(format!("{} performance drivers detected:", drivers.len()));
            opportunities.extend(drivers.iter().take(SHOWN_DRIVERS).map(|d| {
                format!(
                    "{} - {} changed {:?}% (severity: {})",
                    d.segment, d.metric, d.delta_pct, d.severity
                )
            }));
        }

        let risks = if insights.roas_trend_slope() < 0.0 {
            vec![FALLING_ROAS_RISK.to_owned()]
        } else {
            vec![LOW_CONFIDENCE_RISK.to_owned()]
        };

        let text = render(&observations, &opportunities, &risks);
        Self {
            text,
            observations,
            opportunities,
            risks,
        }
    }
}

fn render(observations: &[String], opportunities: &[String], risks: &[String]) -> String {
    let mut lines = vec!["EXECUTIVE SUMMARY".to_owned(), String::new()];
    let sections = [
        ("Observations:", observations),
        ("Opportunities:", opportunities),
        ("Risks & Considerations:", risks),
    ];
    for (i, (header, items)) in sections.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push((*header).to_owned());
        lines.extend(items.iter().map(|item| format!("- {item}")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DriverSignal, Severity, Trend};

    fn signal(segment: &str, delta: f64) -> DriverSignal {
        DriverSignal {
            segment: segment.into(),
            metric: "ctr".into(),
            delta_pct: delta,
            severity: Severity::High,
        }
    }

    #[test]
    fn observations_only_for_present_metrics() {
        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            avg_roas: Some(2.456),
            ..InsightsPackage::default()
        });
        assert_eq!(summary.observations, vec!["Global ROAS: 2.46"]);

        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            avg_ctr: Some(0.0123456),
            avg_roas: Some(3.0),
            ..InsightsPackage::default()
        });
        assert_eq!(
            summary.observations,
            vec!["Global CTR: 0.0123", "Global ROAS: 3.00"]
        );
    }

    #[test]
    fn zero_metrics_still_produce_observations() {
        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            avg_ctr: Some(0.0),
            avg_roas: Some(0.0),
            ..InsightsPackage::default()
        });
        assert_eq!(
            summary.observations,
            vec!["Global CTR: 0.0000", "Global ROAS: 0.00"]
        );
        assert!(summary.text.contains("- Global CTR: 0.0000"));
    }

    #[test]
    fn opportunities_show_count_and_first_three_drivers() {
        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            drivers: Some(vec![
                signal("a", -30.0),
                signal("b", -12.5),
                signal("c", 4.0),
                signal("d", 1.0),
            ]),
            ..InsightsPackage::default()
        });
        assert_eq!(
            summary.opportunities,
            vec![
                "4 performance drivers detected:",
                "a - ctr changed -30.0% (severity: high)",
                "b - ctr changed -12.5% (severity: high)",
                "c - ctr changed 4.0% (severity: high)",
            ]
        );
    }

    #[test]
    fn no_drivers_gives_exploratory_note() {
        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            drivers: Some(vec![]),
            ..InsightsPackage::default()
        });
        assert_eq!(summary.opportunities, vec![NO_DRIVERS_NOTE]);
    }

    #[test]
    fn negative_slope_raises_roas_risk() {
        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            trend: Some(Trend {
                roas_trend_slope: Some(-0.2),
            }),
            ..InsightsPackage::default()
        });
        assert_eq!(summary.risks, vec![FALLING_ROAS_RISK]);
    }

    #[test]
    fn risks_default_to_low_confidence() {
        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            trend: Some(Trend {
                roas_trend_slope: Some(0.0),
            }),
            ..InsightsPackage::default()
        });
        assert_eq!(summary.risks, vec![LOW_CONFIDENCE_RISK]);
    }

    #[test]
    fn text_uses_fixed_headers() {
        let summary = ExecutiveSummary::from_insights(&InsightsPackage {
            avg_ctr: Some(0.02),
            ..InsightsPackage::default()
        });
        let expected = format!(
            "EXECUTIVE SUMMARY\n\nObservations:\n- Global CTR: 0.0200\n\n\
             Opportunities:\n- {NO_DRIVERS_NOTE}\n\n\
             Risks & Considerations:\n- {LOW_CONFIDENCE_RISK}"
        );
        assert_eq!(summary.text, expected);
    }
}
