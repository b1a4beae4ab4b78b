//! Prompt templating and the built-in preset list.
//!
//! A template is instruction text that is combined with the user's input to
//! form the resolved prompt. Templates either contain the [`PLACEHOLDER`]
//! marker, which is replaced by the input, or they don't, in which case the
//! input is appended as a quoted suffix.
//!
//! ```
//! use promptpad::prompt::build_prompt;
//!
//! assert_eq!(
//!     build_prompt("hello world", "Summarize: {{text}}"),
//!     "Summarize: hello world"
//! );
//! assert_eq!(build_prompt("hello", "Summarize"), r#"Summarize "hello""#);
//! ```

use serde::Serialize;

/// Marker substituted with the user's text.
pub const PLACEHOLDER: &str = "{{text}}";

/// Combine raw user text with a template into the resolved prompt.
///
/// Only the first occurrence of [`PLACEHOLDER`] is replaced; later occurrences
/// are left as-is. Neither argument is trimmed or escaped.
pub fn build_prompt(raw_text: &str, template: &str) -> String {
    if template.contains(PLACEHOLDER) {
        template.replacen(PLACEHOLDER, raw_text, 1)
    } else {
        format!("{template} \"{raw_text}\"")
    }
}

/// One entry of the fixed template list offered in templated mode.
///
/// The display `text` is used as the template verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Stable identifier used by API clients.
    pub id: &'static str,
    /// Display text, doubling as the template.
    pub text: &'static str,
}

const PRESETS: &[Preset] = &[
    Preset {
        id: "summarize",
        text: "Summarize the following text:",
    },
    Preset {
        id: "explain",
        text: "Explain the following text in simple terms:",
    },
    Preset {
        id: "professional",
        text: "Rewrite the following text in a professional tone:",
    },
    Preset {
        id: "bullet_points",
        text: "Turn the following notes into concise bullet points: {{text}}",
    },
    Preset {
        id: "tweet",
        text: "Write an engaging tweet about: {{text}}",
    },
    Preset {
        id: "blog_outline",
        text: "Create a blog post outline for the topic: {{text}}",
    },
    Preset {
        id: "translate_french",
        text: "Translate the following text into French:",
    },
];

impl Preset {
    /// All presets, in display order.
    pub fn all() -> &'static [Preset] {
        PRESETS
    }

    /// Look up a preset by its id.
    pub fn find(id: &str) -> Option<Preset> {
        PRESETS.iter().copied().find(|p| p.id == id)
    }
}

impl Default for Preset {
    /// The first entry of the list, selected when the page loads.
    fn default() -> Self {
        PRESETS[0]
    }
}
