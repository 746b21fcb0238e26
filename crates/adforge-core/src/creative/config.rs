//! Creative formats and the immutable engine configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Delivery format of a creative variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreativeFormat {
    Image,
    VideoShort,
    Carousel,
    Story,
    Testimonials,
    Ugc,
    LongformVideo,
    HeadlineExperiments,
}

impl CreativeFormat {
    /// Every format, in the default round-robin order.
    pub const ALL: [CreativeFormat; 8] = [
        CreativeFormat::Image,
        CreativeFormat::VideoShort,
        CreativeFormat::Carousel,
        CreativeFormat::Story,
        CreativeFormat::Testimonials,
        CreativeFormat::Ugc,
        CreativeFormat::LongformVideo,
        CreativeFormat::HeadlineExperiments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::VideoShort => "video_short",
            Self::Carousel => "carousel",
            Self::Story => "story",
            Self::Testimonials => "testimonials",
            Self::Ugc => "ugc",
            Self::LongformVideo => "longform_video",
            Self::HeadlineExperiments => "headline_experiments",
        }
    }

    /// Production directive for the visual team.
    pub fn visual_direction(&self) -> &'static str {
        match self {
            Self::Image => {
                "High-contrast lifestyle still showing product on model; single-frame CTA overlay."
            }
            Self::VideoShort => "15s demo with strong hook; end with CTA card. Optimized for reels.",
            Self::Carousel => "4-slide carousel: benefit -> feature -> proof -> CTA.",
            Self::Story => "Vertical format, quick demo, swipe CTA.",
            Self::Testimonials => "Customer testimonials with trust badges.",
            Self::Ugc => "Raw-feel UGC clip, minimal editing, authentic tone.",
            Self::LongformVideo => "Narrative-style longer demo with deeper storytelling.",
            Self::HeadlineExperiments => "6 headline variants for rapid A/B testing.",
        }
    }
}

impl fmt::Display for CreativeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreativeFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownFormat(s.to_owned()))
    }
}

/// Settings for [`super::CreativeEngine`].
///
/// Validated once in [`CreativeConfig::new`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeConfig {
    formats: Vec<CreativeFormat>,
    variants_per_segment: usize,
    max_variants: usize,
}

impl CreativeConfig {
    pub const DEFAULT_VARIANTS_PER_SEGMENT: usize = 3;
    pub const DEFAULT_MAX_VARIANTS: usize = 30;

    /// Create a config.
    ///
    /// `formats` is the round-robin sequence used to assign variant formats
    /// and must not be empty.
    pub fn new(
        formats: Vec<CreativeFormat>,
        variants_per_segment: usize,
        max_variants: usize,
    ) -> Result<Self, ConfigError> {
        if formats.is_empty() {
            return Err(ConfigError::NoFormats);
        }
        Ok(Self {
            formats,
            variants_per_segment,
            max_variants,
        })
    }

    /// Parse format names (e.g. from a config file) and build a config.
    pub fn from_names<S: AsRef<str>>(
        formats: &[S],
        variants_per_segment: usize,
        max_variants: usize,
    ) -> Result<Self, ConfigError> {
        let formats = formats
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(formats, variants_per_segment, max_variants)
    }

    pub fn formats(&self) -> &[CreativeFormat] {
        &self.formats
    }

    pub fn variants_per_segment(&self) -> usize {
        self.variants_per_segment
    }

    pub fn max_variants(&self) -> usize {
        self.max_variants
    }

    /// Format assigned to the `index`-th generated variant.
    pub fn format_at(&self, index: usize) -> CreativeFormat {
        self.formats[index % self.formats.len()]
    }
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            formats: CreativeFormat::ALL.to_vec(),
            variants_per_segment: Self::DEFAULT_VARIANTS_PER_SEGMENT,
            max_variants: Self::DEFAULT_MAX_VARIANTS,
        }
    }
}
