//! Prehook clip templates, two per style.
//!
//! Every template renders a voice line first and then embeds it verbatim at
//! the end of the video prompt, so consumers may read either field.

use cf_protocol::{PromptClip, ScriptStyle};

/// Time windows covered by the two prehook clips.
pub const CLIP_WINDOWS: [&str; 2] = ["0-8s", "8-16s"];

/// Values interpolated into every template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext<'a> {
    pub avatar: &'a str,
    pub product: &'a str,
    pub pain_point: &'a str,
}

struct ClipTemplate {
    section: &'static str,
    image_prompt: String,
    motion: String,
    voice_line: String,
}

/// Render both clips for `style`.
pub fn render(style: ScriptStyle, ctx: &TemplateContext<'_>) -> Vec<PromptClip> {
    let templates = match style {
        ScriptStyle::Transformation => transformation(ctx),
        ScriptStyle::StreetTestimonial => street_testimonial(ctx),
        ScriptStyle::ProductReveal => product_reveal(ctx),
    };

    templates
        .into_iter()
        .zip(CLIP_WINDOWS)
        .enumerate()
        .map(|(i, (template, window))| PromptClip {
            clip_number: i as u32 + 1,
            timestamp: window.to_string(),
            section: template.section.to_string(),
            image_prompt: template.image_prompt,
            video_prompt: speaking_prompt(&template.motion, &template.voice_line),
            voice_line: template.voice_line,
        })
        .collect()
}

fn speaking_prompt(motion: &str, voice_line: &str) -> String {
    format!("{motion} The character speaks ALL THE WORDS: \"{voice_line}\"")
}

fn transformation(ctx: &TemplateContext<'_>) -> [ClipTemplate; 2] {
    let TemplateContext {
        avatar,
        product,
        pain_point,
    } = ctx;
    [
        ClipTemplate {
            section: "PREHOOK — BEFORE",
            image_prompt: format!(
                "Vertical 9:16 UGC selfie shot of {avatar} at home in flat morning light, \
                 visibly worn down by {pain_point}, tired eyes, no makeup, candid and unpolished"
            ),
            motion: format!(
                "Handheld selfie framing. {avatar} sighs, rubs their temple and looks straight \
                 into the lens, frustrated by {pain_point}."
            ),
            voice_line: format!(
                "Six months ago {pain_point} was running my whole day, and I honestly thought that was just how it had to be."
            ),
        },
        ClipTemplate {
            section: "PREHOOK — AFTER",
            image_prompt: format!(
                "Vertical 9:16 UGC selfie shot of the same {avatar} outdoors in warm golden light, \
                 energetic and smiling, holding {product} toward the camera"
            ),
            motion: format!(
                "Walking selfie shot. {avatar} lifts {product} into frame with a relieved grin, \
                 natural bounce in their step."
            ),
            voice_line: format!(
                "Then I found {product}, and now {pain_point} doesn't get to decide how my day goes."
            ),
        },
    ]
}

fn street_testimonial(ctx: &TemplateContext<'_>) -> [ClipTemplate; 2] {
    let TemplateContext {
        avatar,
        product,
        pain_point,
    } = ctx;
    [
        ClipTemplate {
            section: "PREHOOK — SURPRISE",
            image_prompt: format!(
                "Vertical 9:16 street-interview shot on a busy sidewalk, {avatar} stopped \
                 mid-walk by an off-camera interviewer holding a microphone, daylight, shallow depth of field"
            ),
            motion: format!(
                "Quick push-in as {avatar} reacts with genuine surprise to the question about \
                 {pain_point}, eyebrows raised, half laughing."
            ),
            voice_line: format!(
                "Wait, you're asking me about {pain_point}? Nobody ever asks me that."
            ),
        },
        ClipTemplate {
            section: "PREHOOK — INTRIGUE",
            image_prompt: format!(
                "Vertical 9:16 street-interview close-up of {avatar} leaning toward the \
                 microphone, conspiratorial expression, {product} peeking out of their bag"
            ),
            motion: format!(
                "Slow handheld drift closer. {avatar} lowers their voice and taps {product} \
                 as if sharing a secret."
            ),
            voice_line: format!(
                "Okay, but here's the thing nobody tells you about {product}."
            ),
        },
    ]
}

fn product_reveal(ctx: &TemplateContext<'_>) -> [ClipTemplate; 2] {
    let TemplateContext {
        avatar,
        product,
        pain_point,
    } = ctx;
    [
        ClipTemplate {
            section: "PREHOOK — SETUP",
            image_prompt: format!(
                "Vertical 9:16 close-up of {avatar} at a kitchen counter, hands hidden behind \
                 their back, playful knowing look, soft window light"
            ),
            motion: format!(
                "Static tripod shot. {avatar} leans into the lens and raises one eyebrow \
                 while talking about {pain_point}."
            ),
            voice_line: format!(
                "If {pain_point} is the thing you've tried everything for, stay with me for ten seconds."
            ),
        },
        ClipTemplate {
            section: "PREHOOK — REVEAL",
            image_prompt: format!(
                "Vertical 9:16 hero shot of {avatar} holding {product} up beside their face, \
                 label facing the camera, bright clean background"
            ),
            motion: format!(
                "Snap zoom as {avatar} swings {product} into frame and holds it still, \
                 label in sharp focus."
            ),
            voice_line: format!("This is {product}, and it's the one that finally worked for me."),
        },
    ]
}
