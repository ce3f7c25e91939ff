//! Shader hot-reload pipeline: debounced edits, off-screen validation and atomic
//! program swaps, driven alongside a render loop that never waits on them.

pub mod debounce;
pub mod engine;
pub mod error_log;
pub mod geometry;
pub mod render_loop;
pub mod session;
pub mod source;
pub mod swap;
pub mod uniforms;
pub mod validator;

#[cfg(test)]
mod fake;

pub use debounce::{EditDebouncer, Generation};
pub use engine::{EngineError, FrameState, RenderEngine, SceneState};
pub use error_log::ErrorLog;
pub use geometry::{GeometryKind, GeometrySlot};
pub use render_loop::{RenderLoop, TickOutcome};
pub use session::{Session, SessionConfig, SessionError};
pub use source::ShaderSource;
pub use swap::{ApplyOutcome, ProgramSwapManager, ValidationAttempt};
pub use uniforms::{UniformClock, UniformSet};
pub use validator::{Diagnostics, ProgramValidator};
