//! Interaction state for one page session.
//!
//! A [`Session`] owns the [`SessionState`] behind an `Arc<Mutex<_>>` and is
//! the only thing that mutates it:
//!
//! ```text
//! presentation ──generate/regenerate──▶ Session ──prompt──▶ GenerationBackend
//!      ▲                                   │
//!      └──────── SessionObserver ◀─────────┘ (state updated, lock released)
//! ```
//!
//! A request moves through `Idle → Pending → {Success, Failure} → Idle`.
//! Presentation layers read a [`SessionSnapshot`] to render the output area,
//! the loading indicator and the regenerate button.

mod controller;
pub mod events;

pub use controller::Session;
pub use events::{
    CompositeObserver, FnObserver, LoggingObserver, NoopObserver, SessionEvent, SessionObserver,
};

use serde::{Deserialize, Serialize};

use crate::GenerationFailure;
use crate::prompt::Preset;

/// Where the template comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One of the fixed [`Preset`]s.
    #[default]
    Templated,
    /// Free-form text typed by the user.
    Custom,
}

/// What the output area currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputArea {
    /// Nothing (initial state, or a request is loading).
    #[default]
    Empty,
    /// Generated text, verbatim.
    Output(String),
    /// The message of a failure.
    Error(GenerationFailure),
}

/// The template choices visible on the page when an action fires.
///
/// Which one applies depends on the session's [`Mode`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected entry of the preset list.
    pub preset: Preset,
    /// Contents of the custom prompt field.
    pub custom_prompt: String,
}

impl Selection {
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            custom_prompt: String::new(),
        }
    }

    pub fn custom(custom_prompt: impl Into<String>) -> Self {
        Self {
            preset: Preset::default(),
            custom_prompt: custom_prompt.into(),
        }
    }
}

/// Mutable state of a session.
///
/// Only [`Session`] writes to it. `last_output` is set only by a successful,
/// well-formed response and cleared by any failed request.
#[derive(Debug, Default)]
pub struct SessionState {
    pub mode: Mode,
    /// Resolved prompt last sent.
    pub last_prompt: Option<String>,
    /// Template `last_prompt` was built from.
    pub last_template: Option<String>,
    /// Last successfully generated text.
    pub last_output: Option<String>,
    /// A request is outstanding.
    pub is_pending: bool,
    pub output_area: OutputArea,
    /// Sequence number of the most recently issued request (0 = none yet).
    pub latest_request: u64,
}

impl SessionState {
    /// Regenerate is offered only after a non-empty successful output.
    pub fn can_regenerate(&self) -> bool {
        self.last_output.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Serializable view of [`SessionState`] for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    /// Generated text shown in the output area, if any.
    pub output: Option<String>,
    /// Failure message shown in the output area, if any.
    pub error: Option<String>,
    pub error_kind: Option<GenerationFailure>,
    pub loading: bool,
    pub can_regenerate: bool,
    pub last_prompt: Option<String>,
}

impl SessionSnapshot {
    /// Build a snapshot. Call while holding the state lock.
    pub fn from_state(state: &SessionState) -> Self {
        let (output, error_kind) = match &state.output_area {
            OutputArea::Empty => (None, None),
            OutputArea::Output(text) => (Some(text.clone()), None),
            OutputArea::Error(failure) => (None, Some(*failure)),
        };
        Self {
            mode: state.mode,
            output,
            error: error_kind.map(|f| f.to_string()),
            error_kind,
            loading: state.is_pending,
            can_regenerate: state.can_regenerate(),
            last_prompt: state.last_prompt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle_templated() {
        let state = SessionState::default();
        assert_eq!(state.mode, Mode::Templated);
        assert!(state.last_prompt.is_none());
        assert!(state.last_output.is_none());
        assert!(!state.is_pending);
        assert!(!state.can_regenerate());
    }

    #[test]
    fn empty_output_does_not_enable_regenerate() {
        let state = SessionState {
            last_output: Some(String::new()),
            ..Default::default()
        };
        assert!(!state.can_regenerate());
    }

    #[test]
    fn snapshot_carries_error_message() {
        let state = SessionState {
            output_area: OutputArea::Error(GenerationFailure::MalformedResponse),
            ..Default::default()
        };
        let snap = SessionSnapshot::from_state(&state);
        assert_eq!(snap.output, None);
        assert_eq!(snap.error_kind, Some(GenerationFailure::MalformedResponse));
        assert_eq!(
            snap.error.as_deref(),
            Some("Error: No valid response from AI. Please try again.")
        );
    }

    #[test]
    fn snapshot_serializes_mode_in_snake_case() {
        let state = SessionState {
            mode: Mode::Custom,
            output_area: OutputArea::Output("Hi".into()),
            last_output: Some("Hi".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(SessionSnapshot::from_state(&state)).unwrap();
        assert_eq!(json["mode"], "custom");
        assert_eq!(json["output"], "Hi");
        assert_eq!(json["can_regenerate"], true);
        assert_eq!(json["loading"], false);
    }

    #[test]
    fn mode_deserializes_from_lowercase() {
        let mode: Mode = serde_json::from_str(r#""templated""#).unwrap();
        assert_eq!(mode, Mode::Templated);
    }
}
