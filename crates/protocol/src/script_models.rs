//! Script template models.
//!
//! These types describe the input and output of the script template engine:
//! a creative [`ScriptStyle`], the [`Product`] being advertised, and the
//! resulting [`PromptClip`] records that seed a project's clips.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;

/// The closed set of creative styles the script engine knows how to expand.
///
/// Tags are kebab-case on the wire and on the command line:
/// `transformation`, `street-testimonial`, `product-reveal`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptStyle {
    /// Before/after arc: the pain point, then the relief.
    Transformation,

    /// Street-interview arc: surprise, then intrigue.
    StreetTestimonial,

    /// Reveal arc: setup, then the product shown on camera.
    ProductReveal,
}

impl ScriptStyle {
    /// Every supported style, in a stable order.
    pub const ALL: [ScriptStyle; 3] = [
        ScriptStyle::Transformation,
        ScriptStyle::StreetTestimonial,
        ScriptStyle::ProductReveal,
    ];

    /// The wire tag for this style.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptStyle::Transformation => "transformation",
            ScriptStyle::StreetTestimonial => "street-testimonial",
            ScriptStyle::ProductReveal => "product-reveal",
        }
    }
}

impl fmt::Display for ScriptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a style tag is outside the supported set.
///
/// There is no fallback style.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized script style: '{0}' (expected one of: transformation, street-testimonial, product-reveal)")]
pub struct UnrecognizedStyleError(pub String);

impl FromStr for ScriptStyle {
    type Err = UnrecognizedStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        ScriptStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == tag)
            .ok_or_else(|| UnrecognizedStyleError(s.to_string()))
    }
}

/// The product a script is written for.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct Product {
    /// Product display name, spoken in the voice lines.
    pub name: String,

    /// Free-text audience description, e.g.
    /// `"women aged 45-65 experiencing joint pain, low energy"`.
    ///
    /// The pain point is extracted from this text.
    #[serde(default)]
    pub target_audience: String,
}

/// One generation-ready clip produced by the script engine.
///
/// Not yet attached to a project; converted into a clip spec when applied.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PromptClip {
    /// 1-based position within the script.
    pub clip_number: u32,

    /// Time window label, e.g. `"0-8s"`.
    pub timestamp: String,

    /// Section label, e.g. `"PREHOOK — BEFORE"`.
    pub section: String,

    /// Still-image generation prompt.
    pub image_prompt: String,

    /// Motion prompt. Always embeds `voice_line` verbatim.
    pub video_prompt: String,

    /// The spoken line.
    pub voice_line: String,
}
