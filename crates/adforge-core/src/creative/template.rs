//! Rhetorical copy templates.
//!
//! A [`Template`] is parsed once at construction: every `{name}` in its
//! headline and body must be a known [`Placeholder`], otherwise
//! construction fails. Rendering then looks each placeholder up in the
//! driver, falling back to a fixed default per placeholder and copy slot.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::driver::Driver;
use crate::error::ConfigError;

/// Longest headline a variant may carry, in characters.
pub const MAX_HEADLINE_CHARS: usize = 140;

/// The four rhetorical frameworks a variant can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateId {
    /// Problem, agitate, solve.
    #[serde(rename = "PAS")]
    Pas,
    /// Attention, interest, desire, action.
    #[serde(rename = "AIDA")]
    Aida,
    /// Feature, advantage, benefit.
    #[serde(rename = "FAB")]
    Fab,
    #[serde(rename = "SocialProof")]
    SocialProof,
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pas => "PAS",
            Self::Aida => "AIDA",
            Self::Fab => "FAB",
            Self::SocialProof => "SocialProof",
        };
        f.write_str(s)
    }
}

/// Which part of the copy is being rendered. Defaults differ per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Headline,
    Body,
}

/// A named hole in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Problem,
    Solution,
    Attention,
    Interest,
    Desire,
    Feature,
    Benefit,
    Stat,
    Claim,
    Agitation,
    Cta,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        let p = match name {
            "problem" => Self::Problem,
            "solution" => Self::Solution,
            "attention" => Self::Attention,
            "interest" => Self::Interest,
            "desire" => Self::Desire,
            "feature" => Self::Feature,
            "benefit" => Self::Benefit,
            "stat" => Self::Stat,
            "claim" => Self::Claim,
            "agitation" => Self::Agitation,
            "cta" => Self::Cta,
            _ => return None,
        };
        Some(p)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Problem => "problem",
            Self::Solution => "solution",
            Self::Attention => "attention",
            Self::Interest => "interest",
            Self::Desire => "desire",
            Self::Feature => "feature",
            Self::Benefit => "benefit",
            Self::Stat => "stat",
            Self::Claim => "claim",
            Self::Agitation => "agitation",
            Self::Cta => "cta",
        }
    }

    /// Value for this placeholder, taken from the driver when it has one.
    pub fn resolve<'a>(&self, slot: Slot, driver: &'a Driver, cta: &'a str) -> Cow<'a, str> {
        let hints = &driver.hints;
        let headline = slot == Slot::Headline;
        let or = |value: Option<&'a String>, default: &'static str| -> Cow<'a, str> {
            value.map_or(Cow::Borrowed(default), |v| Cow::Borrowed(v.as_str()))
        };

        match self {
            Self::Problem | Self::Attention => Cow::Owned(driver.issue.to_string()),
            Self::Solution | Self::Interest => Cow::Borrowed(driver.solution.as_str()),
            Self::Desire => or(hints.benefit.as_ref(), "improved funnel performance"),
            Self::Feature if headline => or(hints.feature.as_ref(), "clear product value"),
            Self::Feature => or(hints.feature.as_ref(), "value-led messaging"),
            Self::Benefit if headline => or(hints.benefit.as_ref(), "higher engagement"),
            Self::Benefit => or(hints.benefit.as_ref(), ""),
            Self::Stat => or(hints.stat.as_ref(), "80"),
            Self::Claim if headline => or(hints.claim.as_ref(), "customers prefer this product"),
            Self::Claim => or(hints.claim.as_ref(), ""),
            Self::Agitation => or(
                hints.agitation.as_ref(),
                "current creatives are not resonating",
            ),
            Self::Cta => Cow::Borrowed(cta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(&'static str),
    Hole(Placeholder),
}

/// A validated copy template.
#[derive(Debug, Clone)]
pub struct Template {
    id: TemplateId,
    headline: Vec<Piece>,
    body: Vec<Piece>,
}

impl Template {
    /// Parse and validate a template.
    pub fn new(
        id: TemplateId,
        headline: &'static str,
        body: &'static str,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            id,
            headline: parse(id, headline)?,
            body: parse(id, body)?,
        })
    }

    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Distinct placeholders this template needs, in first-use order.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut seen = Vec::new();
        for piece in self.headline.iter().chain(&self.body) {
            if let Piece::Hole(p) = piece {
                if !seen.contains(p) {
                    seen.push(*p);
                }
            }
        }
        seen
    }

    /// Render the headline, truncated to [`MAX_HEADLINE_CHARS`].
    pub fn render_headline(&self, driver: &Driver, cta: &str) -> String {
        let full = render(&self.headline, Slot::Headline, driver, cta);
        match full.char_indices().nth(MAX_HEADLINE_CHARS) {
            Some((cut, _)) => full[..cut].to_owned(),
            None => full,
        }
    }

    /// Render the body. The result is not sanitised.
    pub fn render_body(&self, driver: &Driver, cta: &str) -> String {
        render(&self.body, Slot::Body, driver, cta)
    }
}

fn render(pieces: &[Piece], slot: Slot, driver: &Driver, cta: &str) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(t) => out.push_str(t),
            Piece::Hole(p) => out.push_str(&p.resolve(slot, driver, cta)),
        }
    }
    out
}

fn parse(id: TemplateId, src: &'static str) -> Result<Vec<Piece>, ConfigError> {
    let mut pieces = Vec::new();
    let mut rest = src;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            pieces.push(Piece::Text(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| ConfigError::UnterminatedPlaceholder {
                template: id.to_string(),
            })?;
        let name = &after[..close];
        let placeholder =
            Placeholder::from_name(name).ok_or_else(|| ConfigError::UnknownPlaceholder {
                template: id.to_string(),
                placeholder: name.to_owned(),
            })?;
        pieces.push(Piece::Hole(placeholder));
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }
    Ok(pieces)
}

/// The stock template set, one per [`TemplateId`].
pub fn builtin_templates() -> Result<Vec<Template>, ConfigError> {
    Ok(vec![
        Template::new(
            TemplateId::Pas,
            "{problem}? Try {solution}.",
            "Problem: {problem}. Agitation: {agitation}. Solution: {solution}. CTA: {cta}",
        )?,
        Template::new(
            TemplateId::Aida,
            "{attention} - {interest}",
            "Desire: {desire}. Action: {cta}",
        )?,
        Template::new(
            TemplateId::Fab,
            "Feature: {feature} - Benefit: {benefit}",
            "{feature}. This means {benefit}. Try now: {cta}",
        )?,
        Template::new(
            TemplateId::SocialProof,
            "{stat}% of users say {claim}",
            "{claim}. See how others experienced it. CTA: {cta}",
        )?,
    ])
}
