//! Failure taxonomy for generate / regenerate actions.
//!
//! Every kind maps to exactly one user-visible message (its `Display`), so the
//! presentation layer can render a failure without a lookup table of its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a generate or regenerate action did not produce text.
///
/// All kinds are terminal for the current action. None of them is fatal to the
/// session; the user may retry immediately.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailure {
    /// The trimmed input text was empty.
    #[error("Please enter some text to generate output.")]
    EmptyInput,
    /// Custom mode is selected but the custom prompt is blank.
    #[error("Please enter a custom prompt.")]
    EmptyCustomPrompt,
    /// The service answered, but without a usable candidate text.
    #[error("Error: No valid response from AI. Please try again.")]
    MalformedResponse,
    /// The service could not be reached or its reply could not be read.
    #[error(
        "Error: Could not connect to the AI service. Please check your network connection and try again."
    )]
    TransportError,
    /// Regenerate was requested before any prompt had been sent.
    #[error("Nothing to regenerate. Please generate output first.")]
    NothingToRegenerate,
    /// Another request is still outstanding.
    #[error("A generation is already in progress. Please wait for it to finish.")]
    Busy,
}

impl GenerationFailure {
    /// Whether the failure happened before any request was issued.
    ///
    /// Rejections never touch `last_output`; request failures clear it.
    pub fn is_rejection(self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::EmptyCustomPrompt | Self::NothingToRegenerate | Self::Busy
        )
    }
}

/// Outcome of a single generation request: the candidate text, verbatim.
pub type GenerationResult = Result<String, GenerationFailure>;
