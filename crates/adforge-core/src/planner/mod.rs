//! Keyword-driven task classifier.
//!
//! Tasks that mention any creative trigger phrase take the creative-only
//! fast path. Everything else gets the fixed analytics plan.

use async_trait::async_trait;

use crate::error::StageError;
use crate::models::ExecutionPlan;
use crate::stage::TaskClassifier;

/// Trigger phrases used when no custom list is configured.
///
/// Matching is on whole words, so plural forms are listed separately.
/// "sales" is absent: it selects the segmentation step instead.
pub const DEFAULT_CREATIVE_KEYWORDS: &[&str] = &[
    "write",
    "ad",
    "ads",
    "copy",
    "creative",
    "creatives",
    "headline",
    "headlines",
    "caption",
    "captions",
    "facebook ad",
    "facebook ads",
    "instagram ad",
    "instagram ads",
    "black friday",
    "cyber monday",
    "shoes",
    "footwear",
    "discount",
    "discounts",
    "offer",
    "offers",
    "deal",
    "deals",
    "sale",
    "promo",
    "promos",
];

/// The analytics plan every non-creative task receives.
pub const ANALYTICS_STEPS: [&str; 6] = [
    "1. Understand task and define subgoals",
    "2. Collect and load relevant data",
    "3. Clean and preprocess data",
    "4. Analyze data and compute metrics",
    "5. Generate insights and recommendations",
    "6. Create final deliverable (summary/report)",
];

/// Extra step inserted for sales-oriented tasks.
pub const SALES_SEGMENT_STEP: &str = "3b. Segment sales by product, time and region";

/// Zero-based index at which [`SALES_SEGMENT_STEP`] is inserted.
const SALES_SEGMENT_INDEX: usize = 3;

/// Classifies tasks by whole-word keyword matching.
///
/// Matching is case-insensitive and works on word boundaries, so `"ad"`
/// matches "shoes ad" but not "load", and `"sale"` does not match "sales".
/// Multi-word phrases must appear as consecutive words.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<Vec<String>>,
}

impl KeywordClassifier {
    /// Build a classifier from a custom list of trigger phrases.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| words(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Whether `task` mentions any trigger phrase.
    pub fn is_creative(&self, task: &str) -> bool {
        let task_words = words(task);
        self.keywords
            .iter()
            .any(|phrase| contains_phrase(&task_words, phrase))
    }

    /// Classify a task. Pure and infallible.
    pub fn classify(&self, task: &str) -> ExecutionPlan {
        if self.is_creative(task) {
            return ExecutionPlan::CreativeOnly;
        }

        let mut steps: Vec<String> = ANALYTICS_STEPS.iter().map(|s| (*s).to_owned()).collect();
        if words(task).iter().any(|w| w == "sales") {
            steps.insert(SALES_SEGMENT_INDEX, SALES_SEGMENT_STEP.to_owned());
        }
        ExecutionPlan::Steps(steps)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CREATIVE_KEYWORDS)
    }
}

#[async_trait]
impl TaskClassifier for KeywordClassifier {
    async fn create_plan(&self, task: &str) -> Result<ExecutionPlan, StageError> {
        let plan = self.classify(task);
        tracing::debug!(creative_only = plan.is_creative_only(), "classified task");
        Ok(plan)
    }
}

/// Lowercased alphanumeric words of `text`.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(haystack: &[String], phrase: &[String]) -> bool {
    haystack.windows(phrase.len()).any(|window| window == phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_friday_ad_is_creative_only() {
        let plan = KeywordClassifier::default().classify("Write a Black Friday shoes ad");
        assert_eq!(plan, ExecutionPlan::CreativeOnly);
    }

    #[test]
    fn summary_task_gets_six_analytics_steps() {
        let plan = KeywordClassifier::default().classify("Generate a marketing performance summary");
        let ExecutionPlan::Steps(steps) = plan else {
            panic!("expected analytics plan");
        };
        assert_eq!(steps, ANALYTICS_STEPS);
    }

    #[test]
    fn sales_task_inserts_segmentation_at_position_four() {
        let plan = KeywordClassifier::default().classify("Summarize Q3 sales performance");
        let ExecutionPlan::Steps(steps) = plan else {
            panic!("expected analytics plan");
        };
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[3], SALES_SEGMENT_STEP);
        assert_eq!(steps[2], ANALYTICS_STEPS[2]);
        assert_eq!(steps[4], ANALYTICS_STEPS[3]);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let classifier = KeywordClassifier::default();
        assert!(!classifier.is_creative("Load the spreadsheet"));
        assert!(!classifier.is_creative("Report weekly sales"));
        assert!(classifier.is_creative("Plan the summer SALE"));
        assert!(classifier.is_creative("need a new headline!"));
    }

    #[test]
    fn plural_phrasings_are_creative_only() {
        let classifier = KeywordClassifier::default();
        for task in [
            "Create Facebook ads for our spring line",
            "Draft Instagram ads",
            "List holiday deals",
            "Brainstorm new creatives",
            "Polish the headlines and captions",
            "Stack discounts, offers and promos",
        ] {
            assert_eq!(classifier.classify(task), ExecutionPlan::CreativeOnly, "{task}");
        }
        assert!(!classifier.is_creative("Report weekly sales"));
    }

    #[test]
    fn multi_word_phrases_need_consecutive_words() {
        let classifier = KeywordClassifier::new(["cyber monday"]);
        assert!(classifier.is_creative("Prep for Cyber Monday"));
        assert!(!classifier.is_creative("Cyber security review on monday"));
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let classifier = KeywordClassifier::new(["banner"]);
        assert!(classifier.is_creative("Design a banner"));
        assert!(!classifier.is_creative("Write a Black Friday shoes ad"));
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let classifier = KeywordClassifier::new(["", "   "]);
        assert!(!classifier.is_creative("anything at all"));
    }

    #[tokio::test]
    async fn trait_impl_never_fails() {
        let plan = KeywordClassifier::default().create_plan("").await.unwrap();
        assert_eq!(plan.steps().len(), 6);
    }
}
