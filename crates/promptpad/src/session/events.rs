//! Events and observers for a [`Session`](super::Session).
//!
//! The session reports every state transition through [`SessionEvent`]
//! variants. Presentation layers implement [`SessionObserver`] to re-render,
//! broadcast, or log. Observers are always called with the state lock
//! released, so they may read [`Session::snapshot`](super::Session::snapshot)
//! freely.
//!
//! | Observer | Use case |
//! |----------|----------|
//! | [`NoopObserver`] | Tests, headless use |
//! | [`LoggingObserver`] | Structured logging via `tracing` |
//! | [`FnObserver`] | Quick closures |
//! | [`CompositeObserver`] | Fan out to several observers in order |

use tracing::{debug, info, warn};

use super::Mode;
use crate::GenerationFailure;

/// State transitions emitted by a session.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    /// The prompt mode was switched.
    ModeChanged(Mode),
    /// An action was refused before any request was issued.
    Rejected(GenerationFailure),
    /// A request was issued; loading begins and the output area is cleared.
    Started { request_id: u64, prompt: &'a str },
    /// The latest request succeeded.
    Completed { request_id: u64, output: &'a str },
    /// The latest request failed.
    Failed {
        request_id: u64,
        failure: GenerationFailure,
    },
    /// A superseded request finished and its result was dropped.
    Discarded { request_id: u64 },
}

/// Receives [`SessionEvent`]s.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent<'_>) {
        let _ = event;
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;
impl SessionObserver for NoopObserver {}

/// An observer backed by a closure.
///
/// ```ignore
/// let observer = FnObserver::new(|event| {
///     if let SessionEvent::Completed { output, .. } = event {
///         println!("{output}");
///     }
/// });
/// ```
pub struct FnObserver<F>(F)
where
    F: Fn(&SessionEvent<'_>) + Send + Sync;

impl<F> FnObserver<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> SessionObserver for FnObserver<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches each event to several observers in registration order.
///
/// ```ignore
/// let observer = CompositeObserver::new()
///     .with(LoggingObserver)
///     .with(my_broadcaster);
/// ```
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn SessionObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl SessionObserver for CompositeObserver {
    fn on_event(&self, event: &SessionEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

/// Logs events via `tracing`.
pub struct LoggingObserver;

impl SessionObserver for LoggingObserver {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::ModeChanged(mode) => {
                debug!("Prompt mode set to {mode:?}");
            }
            SessionEvent::Rejected(failure) => {
                debug!("Action rejected: {failure:?}");
            }
            SessionEvent::Started { request_id, prompt } => {
                let preview: String = prompt.chars().take(200).collect();
                info!(
                    "[request {request_id}] generating: {preview}{}",
                    if prompt.chars().count() > 200 { "..." } else { "" }
                );
            }
            SessionEvent::Completed { request_id, output } => {
                info!("[request {request_id}] completed: {} chars", output.len());
            }
            SessionEvent::Failed {
                request_id,
                failure,
            } => {
                warn!("[request {request_id}] failed: {failure:?}");
            }
            SessionEvent::Discarded { request_id } => {
                debug!("[request {request_id}] superseded, result discarded");
            }
        }
    }
}
