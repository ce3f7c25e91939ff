use std::time::{Duration, Instant};

use liveconfig::{ClockConfig, LiveConfig};

use crate::debounce::{EditDebouncer, Generation};
use crate::engine::{EngineError, RenderEngine, SceneState};
use crate::error_log::ErrorLog;
use crate::geometry::{GeometryKind, GeometrySlot};
use crate::render_loop::{RenderLoop, TickOutcome};
use crate::source::ShaderSource;
use crate::swap::{ApplyOutcome, ProgramSwapManager, ValidationAttempt};
use crate::uniforms::{UniformClock, UniformSet};
use crate::validator::{Diagnostics, ProgramValidator};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("default shader source failed to validate:\n{0}")]
    DefaultSource(Diagnostics),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Runtime knobs for a [`Session`], usually derived from [`LiveConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub quiet_period: Duration,
    pub validation_budget: Option<Duration>,
    pub clock: ClockConfig,
    pub geometry: GeometryKind,
    pub auto_rotate: bool,
    pub rotation_step: f32,
    pub wireframe: bool,
    pub keep_mesh_on_error: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&LiveConfig::default())
    }
}

impl SessionConfig {
    pub fn from_config(config: &LiveConfig) -> Self {
        Self {
            quiet_period: config.pipeline.quiet_period,
            validation_budget: config.pipeline.validation_budget,
            clock: config.clock.clone(),
            geometry: config.view.geometry.into(),
            auto_rotate: config.view.auto_rotate,
            rotation_step: config.view.rotation_step,
            wireframe: config.view.wireframe,
            keep_mesh_on_error: config.view.keep_mesh_on_error,
        }
    }
}

/// Owns the whole hot-reload pipeline for one view.
///
/// Edits only schedule work. [`Session::pump`] runs due validations between
/// frames and [`Session::tick`] draws, so the active program never changes mid-draw.
pub struct Session<E: RenderEngine> {
    engine: E,
    default_source: ShaderSource,
    source: ShaderSource,
    pending_geometry: Option<GeometryKind>,
    geometry: GeometrySlot<E::Geometry>,
    swap: ProgramSwapManager<E::Program>,
    log: ErrorLog,
    debouncer: EditDebouncer,
    validator: ProgramValidator,
    render_loop: RenderLoop,
    scene: SceneState,
    validations: u64,
}

impl<E: RenderEngine> Session<E> {
    pub fn new(
        mut engine: E,
        default_source: ShaderSource,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let validator = ProgramValidator::new(config.validation_budget);
        let geometry = GeometrySlot::create(&mut engine, config.geometry)?;
        let program = match validator.validate(&mut engine, &default_source, 0.0) {
            Ok(program) => program,
            Err(diagnostics) => {
                engine.dispose_geometry(geometry.into_handle());
                return Err(SessionError::DefaultSource(diagnostics));
            }
        };
        tracing::debug!(geometry = %config.geometry, "session started");

        Ok(Self {
            engine,
            source: default_source.clone(),
            default_source,
            pending_geometry: None,
            geometry,
            swap: ProgramSwapManager::new(program, config.keep_mesh_on_error),
            log: ErrorLog::new(),
            debouncer: EditDebouncer::new(config.quiet_period),
            validator,
            render_loop: RenderLoop::new(
                UniformClock::from_config(&config.clock),
                config.rotation_step,
                config.auto_rotate,
            ),
            scene: SceneState {
                wireframe: config.wireframe,
                ..SceneState::default()
            },
            validations: 0,
        })
    }

    pub fn set_vertex_source(&mut self, text: impl Into<String>, now: Instant) -> Generation {
        self.source.vertex = text.into();
        self.debouncer.schedule(now)
    }

    pub fn set_fragment_source(&mut self, text: impl Into<String>, now: Instant) -> Generation {
        self.source.fragment = text.into();
        self.debouncer.schedule(now)
    }

    /// Replaces both stages as a single edit.
    pub fn set_source(&mut self, source: ShaderSource, now: Instant) -> Generation {
        self.source = source;
        self.debouncer.schedule(now)
    }

    /// The new shape is built when the quiet period expires, together with validation.
    pub fn set_geometry(&mut self, kind: GeometryKind, now: Instant) -> Generation {
        self.pending_geometry = Some(kind);
        self.debouncer.schedule(now)
    }

    pub fn reset_to_default(&mut self, now: Instant) -> Generation {
        self.source = self.default_source.clone();
        self.debouncer.schedule(now)
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.render_loop.set_auto_rotate(enabled);
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        self.scene.wireframe = enabled;
    }

    pub fn record_pointer(&mut self, x: f32, y: f32) {
        self.render_loop.record_pointer(x, y);
    }

    pub fn has_error(&self) -> bool {
        self.swap.has_error()
    }

    pub fn error_log(&self) -> &[String] {
        self.log.entries()
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    pub fn default_source(&self) -> &ShaderSource {
        &self.default_source
    }

    pub fn geometry(&self) -> GeometryKind {
        self.pending_geometry.unwrap_or(self.geometry.kind())
    }

    pub fn active_geometry(&self) -> GeometryKind {
        self.geometry.kind()
    }

    pub fn auto_rotate(&self) -> bool {
        self.render_loop.auto_rotate()
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn uniforms(&self) -> &UniformSet {
        self.render_loop.uniforms()
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Number of validation attempts run since startup, excluding the default source.
    pub fn validations(&self) -> u64 {
        self.validations
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Runs the pending validation if its quiet period has elapsed by `now`.
    pub fn pump(&mut self, now: Instant) -> Option<ApplyOutcome> {
        if !self.render_loop.is_running() {
            return None;
        }
        let generation = self.debouncer.poll(now)?;

        if let Some(kind) = self.pending_geometry.take() {
            if kind != self.geometry.kind() {
                match self.geometry.replace(&mut self.engine, kind) {
                    Ok(()) => tracing::debug!(geometry = %kind, "geometry replaced"),
                    Err(err) => {
                        tracing::warn!(geometry = %kind, "geometry could not be built: {err}");
                        self.log.record(&err.to_string());
                    }
                }
            }
        }

        self.validations += 1;
        tracing::info!(generation = generation.0, "validating shader source");
        let time = self.render_loop.uniforms().time;
        let result = self.validator.validate(&mut self.engine, &self.source, time);
        let attempt = ValidationAttempt { generation, result };
        let outcome = self.swap.apply(
            &mut self.engine,
            attempt,
            self.debouncer.latest(),
            &mut self.scene,
            &mut self.log,
        );
        Some(outcome)
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.render_loop.tick(
            &mut self.engine,
            self.swap.active(),
            self.geometry.handle(),
            &mut self.scene,
        )
    }

    /// Stops ticking and drops any pending validation.
    pub fn stop(&mut self) {
        self.debouncer.cancel();
        self.render_loop.stop();
    }

    /// Releases the active program and geometry and hands the engine back.
    pub fn teardown(mut self) -> E {
        self.stop();
        let Session {
            mut engine,
            geometry,
            swap,
            ..
        } = self;
        engine.dispose_program(swap.into_active());
        engine.dispose_geometry(geometry.into_handle());
        tracing::debug!("session torn down");
        engine
    }
}
