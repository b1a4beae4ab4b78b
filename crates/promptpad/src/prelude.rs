//! Convenience re-exports for common `promptpad` types.
//!
//! ```ignore
//! use promptpad::prelude::*;
//! ```

pub use crate::config::{GenerationConfig, PendingPolicy, RegenerateStrategy, SessionConfig};
pub use crate::error::{GenerationFailure, GenerationResult};
pub use crate::prompt::{PLACEHOLDER, Preset, build_prompt};
pub use crate::session::{
    CompositeObserver, FnObserver, LoggingObserver, Mode, NoopObserver, Selection, Session,
    SessionEvent, SessionObserver, SessionSnapshot,
};
pub use crate::{GeminiClient, GenerationBackend, GenerationFuture};
