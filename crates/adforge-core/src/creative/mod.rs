//! Creative engine: turns insights into a bounded set of driver-tied
//! variants plus an executive summary.
//!
//! Two disjoint modes, chosen by whether the insights package is empty:
//!
//! - **Fallback**: no insights at all. A fixed set of promotional variants
//!   is returned so the engine never comes back empty-handed.
//! - **Insight-driven**: drivers are derived per segment and each driver
//!   gets up to `variants_per_segment` variants, capped globally at
//!   `max_variants`.

pub mod config;
pub mod driver;
pub mod fallback;
pub mod summary;
pub mod template;
pub mod text;

use async_trait::async_trait;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigError, StageError};
use crate::models::{ExecutionPlan, InsightsPackage};
use crate::stage::CreativeStage;

pub use config::{CreativeConfig, CreativeFormat};
pub use driver::{Driver, DriverIssue, DriverMap, Metric, derive_drivers};
pub use summary::ExecutiveSummary;
pub use template::{MAX_HEADLINE_CHARS, Template, TemplateId};

/// Calls to action picked at random for each variant body.
const CTAS: [&str; 5] = [
    "Shop now",
    "Learn more",
    "Get 20% off",
    "Try now",
    "Upgrade today",
];

/// Length of the random hex suffix on variant ids.
const ID_SUFFIX_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativeStatus {
    Ok,
    Error,
}

/// A single ad creative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// `{segment}_v{n}_{suffix}` for driver variants.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<TemplateId>,
    pub format: CreativeFormat,
    pub headline: String,
    pub body: String,
    pub visual_direction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_metric: Option<Metric>,
    /// The driver this variant was written for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<Driver>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeMeta {
    pub n_variants: usize,
}

/// Everything the creative stage hands to evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeOutput {
    pub status: CreativeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_structured: Option<ExecutiveSummary>,
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_reference: Option<ExecutionPlan>,
    #[serde(default)]
    pub meta: CreativeMeta,
}

impl CreativeOutput {
    /// An error output with no variants.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CreativeStatus::Error,
            message: Some(message.into()),
            summary: String::new(),
            summary_structured: None,
            variants: Vec::new(),
            plan_reference: None,
            meta: CreativeMeta::default(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CreativeStatus::Ok
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Generates creatives from insights.
#[derive(Debug, Clone)]
pub struct CreativeEngine {
    config: CreativeConfig,
    templates: Vec<Template>,
}

impl CreativeEngine {
    /// Create an engine with the built-in template set.
    pub fn new(config: CreativeConfig) -> Result<Self, ConfigError> {
        let templates = template::builtin_templates()?;
        for tpl in &templates {
            let holes: Vec<&str> = tpl.placeholders().iter().map(|p| p.name()).collect();
            tracing::debug!(template = ?tpl.id(), placeholders = ?holes, "template loaded");
        }
        Ok(Self { config, templates })
    }

    pub fn config(&self) -> &CreativeConfig {
        &self.config
    }

    /// Produce creatives for `insights`.
    ///
    /// Never fails: an `error` key in the insights yields an output with
    /// [`CreativeStatus::Error`], and missing fields fall back to defaults.
    pub fn create_output<R: Rng + ?Sized>(
        &self,
        insights: &InsightsPackage,
        plan: &ExecutionPlan,
        rng: &mut R,
    ) -> CreativeOutput {
        if insights.is_empty() {
            tracing::info!("generating promotional creatives without insights");
            let variants = fallback::promotional_variants(rng);
            return CreativeOutput {
                status: CreativeStatus::Ok,
                message: None,
                summary: fallback::FALLBACK_SUMMARY.to_owned(),
                summary_structured: None,
                meta: CreativeMeta {
                    n_variants: variants.len(),
                },
                variants,
                plan_reference: None,
            };
        }

        if let Some(message) = &insights.error {
            tracing::warn!(error = %message, "insights carry an upstream error, skipping variants");
            return CreativeOutput::error(message.clone());
        }

        let summary = ExecutiveSummary::from_insights(insights);
        let drivers = derive_drivers(insights);
        let variants = self.generate_variants(&drivers, rng);

        tracing::info!(
            drivers = drivers.len(),
            variants = variants.len(),
            "produced insight-driven variants"
        );

        CreativeOutput {
            status: CreativeStatus::Ok,
            message: None,
            summary: summary.text.clone(),
            summary_structured: Some(summary),
            meta: CreativeMeta {
                n_variants: variants.len(),
            },
            variants,
            plan_reference: Some(plan.clone()),
        }
    }

    /// Walk drivers in order, emitting up to `variants_per_segment` each and
    /// stopping outright at `max_variants`.
    fn generate_variants<R: Rng + ?Sized>(&self, drivers: &DriverMap, rng: &mut R) -> Vec<Variant> {
        let max = self.config.max_variants();
        let mut variants = Vec::new();
        let mut idx = 0usize;

        'drivers: for (segment, driver) in drivers.iter() {
            for _ in 0..self.config.variants_per_segment() {
                if variants.len() >= max {
                    break 'drivers;
                }
                variants.push(self.make_variant(segment, driver, idx, rng));
                idx += 1;
            }
        }
        variants
    }

    fn make_variant<R: Rng + ?Sized>(
        &self,
        segment: &str,
        driver: &Driver,
        idx: usize,
        rng: &mut R,
    ) -> Variant {
        let format = self.config.format_at(idx);
        // Always non-empty: builtin_templates returns four.
        let template = &self.templates[rng.random_range(0..self.templates.len())];
        let cta = CTAS.choose(rng).copied().unwrap_or(CTAS[0]);

        Variant {
            id: format!(
                "{}_v{}_{}",
                id_segment(segment),
                idx + 1,
                variant_id_suffix(rng)
            ),
            target_segment: Some(segment.to_owned()),
            angle: Some(template.id()),
            format,
            headline: template.render_headline(driver, cta),
            body: text::clean_text(&template.render_body(driver, cta)),
            visual_direction: format.visual_direction().to_owned(),
            expected_metric: Some(driver.expected_metric),
            rationale: Some(driver.clone()),
        }
    }
}

#[async_trait]
impl CreativeStage for CreativeEngine {
    async fn create_output(
        &self,
        insights: &InsightsPackage,
        plan: &ExecutionPlan,
        rng: &mut StdRng,
    ) -> Result<CreativeOutput, StageError> {
        Ok(CreativeEngine::create_output(self, insights, plan, rng))
    }
}

/// Segment name made safe for use inside an id.
fn id_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Short random hex suffix for variant ids.
pub(crate) fn variant_id_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    let uuid = uuid::Builder::from_random_bytes(rng.random()).into_uuid();
    hex_prefix(&uuid)
}

fn hex_prefix(uuid: &Uuid) -> String {
    uuid.simple().to_string()[..ID_SUFFIX_LEN].to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SegmentMetric, Trend};
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn engine(config: CreativeConfig) -> CreativeEngine {
        CreativeEngine::new(config).unwrap()
    }

    fn segments(n: usize) -> InsightsPackage {
        InsightsPackage {
            avg_ctr: Some(0.012),
            low_ctr_segments: Some(
                (0..n)
                    .map(|i| SegmentMetric::with_ctr(format!("seg:{i}"), 0.004))
                    .collect(),
            ),
            ..InsightsPackage::default()
        }
    }

    fn plan() -> ExecutionPlan {
        ExecutionPlan::Steps(vec!["1. Understand task".into()])
    }

    #[test]
    fn engine_keeps_its_config() {
        let config = CreativeConfig::new(vec![CreativeFormat::Ugc], 1, 2).unwrap();
        let built = engine(config.clone());
        assert_eq!(built.config(), &config);
        assert_eq!(built.templates.len(), 4);
    }

    #[test]
    fn empty_insights_use_fallback_mode() {
        let out = engine(CreativeConfig::default()).create_output(
            &InsightsPackage::default(),
            &ExecutionPlan::CreativeOnly,
            &mut rng(),
        );
        assert!(out.is_ok());
        assert_eq!(out.variants.len(), 3);
        assert_eq!(out.meta.n_variants, 3);
        assert!(out.summary_structured.is_none());
        assert_eq!(out.summary, fallback::FALLBACK_SUMMARY);
    }

    #[test]
    fn error_marker_short_circuits() {
        let out = engine(CreativeConfig::default()).create_output(
            &InsightsPackage::from_error("X"),
            &plan(),
            &mut rng(),
        );
        assert_eq!(out.status, CreativeStatus::Error);
        assert_eq!(out.message.as_deref(), Some("X"));
        assert!(out.variants.is_empty());
        assert_eq!(out.meta.n_variants, 0);
    }

    #[test]
    fn variants_per_segment_is_respected() {
        let out = engine(CreativeConfig::default()).create_output(&segments(2), &plan(), &mut rng());
        assert_eq!(out.variants.len(), 6);
        let first_seg = out.variants.iter().filter(|v| v.target_segment.as_deref() == Some("seg:0"));
        assert_eq!(first_seg.count(), 3);
    }

    #[test]
    fn cap_stops_generation_mid_segment() {
        let cfg = CreativeConfig::new(CreativeFormat::ALL.to_vec(), 3, 4).unwrap();
        let out = engine(cfg).create_output(&segments(5), &plan(), &mut rng());
        assert_eq!(out.variants.len(), 4);
        assert_eq!(out.meta.n_variants, 4);
        let segs: Vec<&str> = out
            .variants
            .iter()
            .filter_map(|v| v.target_segment.as_deref())
            .collect();
        assert_eq!(segs, vec!["seg:0", "seg:0", "seg:0", "seg:1"]);
    }

    #[test]
    fn default_cap_is_thirty() {
        let out = engine(CreativeConfig::default()).create_output(&segments(20), &plan(), &mut rng());
        assert_eq!(out.variants.len(), 30);
    }

    #[test]
    fn formats_follow_global_round_robin() {
        let formats = vec![
            CreativeFormat::Ugc,
            CreativeFormat::Story,
            CreativeFormat::Image,
            CreativeFormat::Carousel,
        ];
        let cfg = CreativeConfig::new(formats.clone(), 3, 30).unwrap();
        let out = engine(cfg).create_output(&segments(3), &plan(), &mut rng());
        for (i, v) in out.variants.iter().enumerate() {
            assert_eq!(v.format, formats[i % formats.len()], "variant {i}");
            assert_eq!(v.visual_direction, v.format.visual_direction());
        }
    }

    #[test]
    fn format_sequence_is_independent_of_seed() {
        let e = engine(CreativeConfig::default());
        let a = e.create_output(&segments(4), &plan(), &mut StdRng::seed_from_u64(1));
        let b = e.create_output(&segments(4), &plan(), &mut StdRng::seed_from_u64(999));
        let fa: Vec<_> = a.variants.iter().map(|v| v.format).collect();
        let fb: Vec<_> = b.variants.iter().map(|v| v.format).collect();
        assert_eq!(fa, fb);
    }

    #[test]
    fn same_seed_reproduces_output() {
        let e = engine(CreativeConfig::default());
        let a = e.create_output(&segments(3), &plan(), &mut rng());
        let b = e.create_output(&segments(3), &plan(), &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn headlines_never_exceed_limit() {
        let mut insights = segments(2);
        if let Some(segs) = insights.low_ctr_segments.as_mut() {
            for seg in segs {
                seg.hints.claim = Some("x".repeat(500));
                seg.hints.feature = Some("y".repeat(500));
            }
        }
        for seed in 0..20 {
            let out = engine(CreativeConfig::default()).create_output(
                &insights,
                &plan(),
                &mut StdRng::seed_from_u64(seed),
            );
            for v in &out.variants {
                assert!(v.headline.chars().count() <= MAX_HEADLINE_CHARS, "{}", v.headline);
            }
        }
    }

    #[test]
    fn ids_combine_segment_sequence_and_suffix() {
        let out = engine(CreativeConfig::default()).create_output(&segments(2), &plan(), &mut rng());
        assert!(out.variants[0].id.starts_with("seg_0_v1_"));
        assert!(out.variants[3].id.starts_with("seg_1_v4_"));
        for v in &out.variants {
            let suffix = v.id.rsplit('_').next().unwrap();
            assert_eq!(suffix.len(), 6);
            assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        }
        let ids: HashSet<&str> = out.variants.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids.len(), out.variants.len());
    }

    #[test]
    fn overlapping_segment_is_written_for_low_roas() {
        let insights = InsightsPackage {
            low_ctr_segments: Some(vec![SegmentMetric::with_ctr("geo:us", 0.003)]),
            low_roas_segments: Some(vec![SegmentMetric::with_roas("geo:us", 0.6)]),
            ..InsightsPackage::default()
        };
        let out = engine(CreativeConfig::default()).create_output(&insights, &plan(), &mut rng());
        assert_eq!(out.variants.len(), 3);
        for v in &out.variants {
            let rationale = v.rationale.as_ref().unwrap();
            assert_eq!(rationale.issue, DriverIssue::LowRoas);
            assert_eq!(v.expected_metric, Some(Metric::Roas));
        }
    }

    #[test]
    fn no_segments_fall_back_to_general_audience() {
        let insights = InsightsPackage {
            avg_roas: Some(1.8),
            trend: Some(Trend {
                roas_trend_slope: Some(-0.1),
            }),
            ..InsightsPackage::default()
        };
        let out = engine(CreativeConfig::default()).create_output(&insights, &plan(), &mut rng());
        assert_eq!(out.variants.len(), 3);
        assert!(
            out.variants
                .iter()
                .all(|v| v.target_segment.as_deref() == Some(driver::GENERAL_AUDIENCE))
        );
        assert!(out.variants[0].id.starts_with("audience_general_v1_"));
        let summary = out.summary_structured.unwrap();
        assert_eq!(summary.risks.len(), 1);
        assert!(summary.risks[0].contains("ROAS trend decreasing"));
    }

    #[test]
    fn plan_is_passed_through() {
        let out = engine(CreativeConfig::default()).create_output(&segments(1), &plan(), &mut rng());
        assert_eq!(out.plan_reference, Some(plan()));
        assert_eq!(out.summary, out.summary_structured.as_ref().unwrap().text);
    }

    #[test]
    fn zero_cap_yields_no_variants() {
        let cfg = CreativeConfig::new(CreativeFormat::ALL.to_vec(), 3, 0).unwrap();
        let out = engine(cfg).create_output(&segments(2), &plan(), &mut rng());
        assert!(out.is_ok());
        assert!(out.variants.is_empty());
    }

    #[test]
    fn bodies_are_sanitised() {
        let insights = InsightsPackage {
            low_ctr_segments: Some(vec![SegmentMetric {
                hints: crate::models::CopyHints {
                    claim: Some("itâ€™s comfy &amp; light".into()),
                    feature: Some("itâ€™s comfy &amp; light".into()),
                    benefit: Some("itâ€™s comfy &amp; light".into()),
                    agitation: Some("itâ€™s comfy &amp; light".into()),
                    stat: None,
                },
                ..SegmentMetric::with_ctr("geo:uk", 0.002)
            }]),
            ..InsightsPackage::default()
        };
        let out = engine(CreativeConfig::default()).create_output(&insights, &plan(), &mut rng());
        for v in &out.variants {
            assert!(!v.body.contains("â€"), "{}", v.body);
            assert!(!v.body.contains("&amp;"), "{}", v.body);
            assert!(v.body.contains("it's comfy & light"), "{}", v.body);
        }
    }
}
