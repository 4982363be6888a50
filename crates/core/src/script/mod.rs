//! Script template engine.
//!
//! Expands a [`ScriptStyle`] plus product and avatar descriptions into
//! generation-ready [`PromptClip`]s. Everything here is pure: no I/O, no
//! state, and the same input always yields the same clips.
//!
//! # Example
//!
//! ```
//! use cf_core::script::generate_script;
//! use cf_protocol::Product;
//!
//! let product = Product {
//!     name: "FlexiJoint".to_string(),
//!     target_audience: "women aged 45-65 experiencing joint pain, low energy".to_string(),
//! };
//! let clips = generate_script("transformation", &product, "a warm woman in her fifties").unwrap();
//! assert_eq!(clips.len(), 2);
//! assert!(clips[0].voice_line.contains("joint pain"));
//! ```

pub mod pain_point;
pub mod templates;

use cf_protocol::{Product, PromptClip, ScriptStyle, UnrecognizedStyleError};

pub use pain_point::{extract_pain_point, find_pain_point, DEFAULT_PAIN_POINT};
use templates::TemplateContext;

/// Stand-in for a blank avatar description.
pub const DEFAULT_AVATAR: &str = "a relatable on-camera presenter";

/// Stand-in for a blank product name.
pub const DEFAULT_PRODUCT: &str = "this product";

/// Generate the prehook clips for a style tag.
///
/// # Arguments
///
/// * `style` - Style tag such as `"transformation"`; case and surrounding
///   whitespace are ignored
/// * `product` - The advertised product; its audience text yields the pain point
/// * `avatar_description` - Who appears on camera
///
/// # Errors
///
/// Returns `UnrecognizedStyleError` for any tag outside the supported set.
/// No clips are produced in that case.
pub fn generate_script(
    style: &str,
    product: &Product,
    avatar_description: &str,
) -> Result<Vec<PromptClip>, UnrecognizedStyleError> {
    let style: ScriptStyle = style.parse()?;
    Ok(generate_for_style(style, product, avatar_description))
}

/// Generate the prehook clips for an already-parsed style.
pub fn generate_for_style(
    style: ScriptStyle,
    product: &Product,
    avatar_description: &str,
) -> Vec<PromptClip> {
    let pain_point = extract_pain_point(&product.target_audience);
    let ctx = TemplateContext {
        avatar: non_blank(avatar_description, DEFAULT_AVATAR),
        product: non_blank(&product.name, DEFAULT_PRODUCT),
        pain_point: &pain_point,
    };
    templates::render(style, &ctx)
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            name: "FlexiJoint".to_string(),
            target_audience: "women aged 45-65 experiencing joint pain, low energy".to_string(),
        }
    }

    #[test]
    fn test_every_style_yields_two_ordered_clips() {
        for style in ScriptStyle::ALL {
            let clips = generate_script(style.as_str(), &product(), "a warm woman").unwrap();
            assert_eq!(clips.len(), 2, "{style}");
            assert_eq!(clips[0].clip_number, 1);
            assert_eq!(clips[1].clip_number, 2);
            for clip in &clips {
                assert!(clip.video_prompt.contains(&clip.voice_line));
            }
        }
    }

    #[test]
    fn test_unrecognized_style() {
        let err = generate_script("documentary", &product(), "a warm woman").unwrap_err();
        assert_eq!(err, UnrecognizedStyleError("documentary".to_string()));
    }

    #[test]
    fn test_style_tag_is_case_insensitive() {
        let upper = generate_script("  STREET-TESTIMONIAL ", &product(), "a student").unwrap();
        let lower = generate_script("street-testimonial", &product(), "a student").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_blank_inputs_fall_back() {
        let blank = Product {
            name: "   ".to_string(),
            target_audience: String::new(),
        };
        let clips = generate_for_style(ScriptStyle::ProductReveal, &blank, "");
        assert!(clips[0].image_prompt.contains(DEFAULT_AVATAR));
        assert!(clips[0].voice_line.contains(DEFAULT_PAIN_POINT));
        assert!(clips[1].voice_line.contains(DEFAULT_PRODUCT));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = generate_for_style(ScriptStyle::Transformation, &product(), "a nurse");
        let b = generate_for_style(ScriptStyle::Transformation, &product(), "a nurse");
        assert_eq!(a, b);
    }
}
