//! The generate / regenerate controller.

use std::sync::{Arc, Mutex, MutexGuard};

use super::events::{NoopObserver, SessionEvent, SessionObserver};
use super::{Mode, OutputArea, Selection, SessionSnapshot, SessionState};
use crate::config::{PendingPolicy, RegenerateStrategy, SessionConfig};
use crate::prompt::build_prompt;
use crate::{GenerationBackend, GenerationFailure, GenerationResult};

/// Owns the state of one session and runs its two user actions.
///
/// The state lock is never held across the backend call, and observers are
/// always notified after the lock is released.
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    backend: Arc<dyn GenerationBackend>,
    observer: Arc<dyn SessionObserver>,
    config: SessionConfig,
}

impl Session {
    /// Create an idle session in templated mode.
    pub fn new(backend: impl GenerationBackend + 'static) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Create a session around an already shared backend.
    pub fn with_backend(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            backend,
            observer: Arc::new(NoopObserver),
            config: SessionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Shared handle to the raw state.
    pub fn state(&self) -> Arc<Mutex<SessionState>> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_state(&self.lock())
    }

    pub fn mode(&self) -> Mode {
        self.lock().mode
    }

    /// Switch between preset and custom templates.
    pub fn set_mode(&self, mode: Mode) {
        self.lock().mode = mode;
        self.observer.on_event(&SessionEvent::ModeChanged(mode));
    }

    /// Build a prompt from `raw_text` and the current selection, and send it.
    ///
    /// Validation failures are reported without touching the last prompt,
    /// the last output or the pending flag.
    pub async fn generate(&self, raw_text: &str, selection: &Selection) -> GenerationResult {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(self.reject(GenerationFailure::EmptyInput));
        }

        let template = match self.mode() {
            Mode::Custom => {
                let custom = selection.custom_prompt.trim();
                if custom.is_empty() {
                    return Err(self.reject(GenerationFailure::EmptyCustomPrompt));
                }
                custom.to_string()
            }
            Mode::Templated => selection.preset.text.to_string(),
        };

        self.run(text, template).await
    }

    /// Send again, using the last prompt as the template for `raw_text`.
    ///
    /// With [`RegenerateStrategy::Retemplate`] the previous resolved prompt is
    /// passed back through the prompt builder, so a template without a
    /// placeholder gains another quoted copy of the input. The input is
    /// trimmed but may be empty.
    pub async fn regenerate(&self, raw_text: &str) -> GenerationResult {
        let template = {
            let s = self.lock();
            match self.config.regenerate_strategy {
                RegenerateStrategy::Retemplate => s.last_prompt.clone(),
                RegenerateStrategy::ReuseTemplate => s.last_template.clone(),
            }
        };
        let Some(template) = template else {
            return Err(self.reject(GenerationFailure::NothingToRegenerate));
        };

        self.run(raw_text.trim(), template).await
    }

    /// Issue one request and apply its outcome.
    async fn run(&self, raw_text: &str, template: String) -> GenerationResult {
        let prompt = build_prompt(raw_text, &template);

        let request_id = {
            let mut s = self.lock();
            if s.is_pending && self.config.pending_policy == PendingPolicy::Reject {
                drop(s);
                return Err(self.reject(GenerationFailure::Busy));
            }
            s.latest_request += 1;
            s.last_prompt = Some(prompt.clone());
            s.last_template = Some(template);
            s.is_pending = true;
            s.output_area = OutputArea::Empty;
            s.latest_request
        };
        self.observer.on_event(&SessionEvent::Started {
            request_id,
            prompt: &prompt,
        });

        let mut guard = PendingGuard {
            state: self.state.as_ref(),
            request_id,
            armed: true,
        };
        let result = self.backend.generate(&prompt).await;
        guard.armed = false;

        let applied = {
            let mut s = self.lock();
            if s.latest_request == request_id {
                s.is_pending = false;
                match &result {
                    Ok(text) => {
                        s.last_output = Some(text.clone());
                        s.output_area = OutputArea::Output(text.clone());
                    }
                    Err(failure) => {
                        s.last_output = None;
                        s.output_area = OutputArea::Error(*failure);
                    }
                }
                true
            } else {
                false
            }
        };

        let event = match (&result, applied) {
            (_, false) => SessionEvent::Discarded { request_id },
            (Ok(output), true) => SessionEvent::Completed { request_id, output },
            (Err(failure), true) => SessionEvent::Failed {
                request_id,
                failure: *failure,
            },
        };
        self.observer.on_event(&event);

        result
    }

    /// Report a failure that happened before any request was issued.
    ///
    /// A pending request owns the output area, so the message is only
    /// displayed when the session is idle.
    fn reject(&self, failure: GenerationFailure) -> GenerationFailure {
        debug_assert!(failure.is_rejection(), "{failure:?} is not a rejection");
        {
            let mut s = self.lock();
            if !s.is_pending {
                s.output_area = OutputArea::Error(failure);
            }
        }
        self.observer.on_event(&SessionEvent::Rejected(failure));
        failure
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clears the pending flag if a request future is dropped before completion.
struct PendingGuard<'a> {
    state: &'a Mutex<SessionState>,
    request_id: u64,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut s = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if s.latest_request == self.request_id {
            s.is_pending = false;
        }
    }
}
