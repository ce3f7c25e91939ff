use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::engine::RenderEngine;
use crate::geometry::GeometryKind;
use crate::source::ShaderSource;
use crate::uniforms::UniformSet;

/// Everything the backend reported while a candidate program was exercised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join("\n"))]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// All messages joined by newlines, as recorded in the error log.
    pub fn text(&self) -> String {
        self.messages.join("\n")
    }
}

/// Compiles candidate sources against throwaway resources, off the visible surface.
#[derive(Debug, Clone)]
pub struct ProgramValidator {
    budget: Option<Duration>,
    scratch_geometry: GeometryKind,
}

impl Default for ProgramValidator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProgramValidator {
    pub fn new(budget: Option<Duration>) -> Self {
        Self {
            budget,
            scratch_geometry: GeometryKind::Plane,
        }
    }

    /// Builds `source` into a program and forces one off-screen draw with it.
    ///
    /// Scratch target and geometry are released before returning on every path.
    /// On success the scratch program itself is handed back for adoption.
    pub fn validate<E: RenderEngine>(
        &self,
        engine: &mut E,
        source: &ShaderSource,
        time: f32,
    ) -> Result<E::Program, Diagnostics> {
        let started = Instant::now();
        let uniforms = UniformSet::seeded(time);

        let target = engine
            .create_scratch_target()
            .map_err(|err| Diagnostics::from_message(err.to_string()))?;
        let geometry = match engine.create_geometry(self.scratch_geometry) {
            Ok(geometry) => geometry,
            Err(err) => {
                engine.dispose_target(target);
                return Err(Diagnostics::from_message(err.to_string()));
            }
        };

        engine.begin_capture();
        let mut failures = Vec::new();
        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.create_program(source, &uniforms)
        }));
        let program = match built {
            Ok(Ok(program)) => Some(program),
            Ok(Err(err)) => {
                failures.push(err.to_string());
                None
            }
            Err(payload) => {
                failures.push(panic_message(&*payload));
                None
            }
        };
        if let Some(program) = &program {
            let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
                engine.draw_offscreen(&target, program, &geometry, &uniforms)
            }));
            match drawn {
                Ok(Ok(())) => {}
                Ok(Err(err)) => failures.push(err.to_string()),
                Err(payload) => failures.push(panic_message(&*payload)),
            }
        }
        let mut messages = engine.end_capture();

        engine.dispose_target(target);
        engine.dispose_geometry(geometry);

        messages.extend(failures);
        messages.retain(|message| !message.trim().is_empty());
        messages.dedup();

        let elapsed = started.elapsed();
        if let Some(budget) = self.budget {
            if elapsed > budget {
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "shader validation exceeded its budget"
                );
            }
        }

        match program {
            Some(program) if messages.is_empty() => Ok(program),
            Some(program) => {
                engine.dispose_program(program);
                Err(Diagnostics::new(messages))
            }
            None => Err(Diagnostics::new(messages)),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let reason = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    };
    format!("validation panicked: {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeEngine, DEFAULT_FRAGMENT, DEFAULT_VERTEX};

    fn valid_source() -> ShaderSource {
        ShaderSource::new(DEFAULT_VERTEX, DEFAULT_FRAGMENT)
    }

    #[test]
    fn success_promotes_scratch_program() {
        let mut engine = FakeEngine::default();
        let program = ProgramValidator::default()
            .validate(&mut engine, &valid_source(), 1.5)
            .unwrap();

        assert_eq!(engine.programs_created, 1);
        assert_eq!(engine.live_programs(), 1);
        assert_eq!(program.seeded_time, 1.5);
        assert_eq!(engine.offscreen_draws, 1);
    }

    #[test]
    fn scratch_resources_are_released_on_both_paths() {
        let mut engine = FakeEngine::default();
        let validator = ProgramValidator::default();
        let program = validator
            .validate(&mut engine, &valid_source(), 0.0)
            .unwrap();
        let broken = ShaderSource::new(DEFAULT_VERTEX, "gl_FragColor = vec4(missing_tint, 1.0);");
        let err = validator.validate(&mut engine, &broken, 0.0).unwrap_err();

        assert!(err.text().contains("missing_tint"));
        assert_eq!(engine.live_targets(), 0);
        assert_eq!(engine.live_geometries(), 0);
        assert_eq!(engine.live_programs(), 1);
        engine.dispose_program(program);
    }

    #[test]
    fn collects_every_captured_message() {
        let mut engine = FakeEngine::default();
        let broken = ShaderSource::new(
            "gl_Position = vec4(missing_offset);",
            "gl_FragColor = vec4(missing_tint);",
        );
        let err = ProgramValidator::default()
            .validate(&mut engine, &broken, 0.0)
            .unwrap_err();

        assert_eq!(err.messages().len(), 2);
        assert_eq!(engine.live_programs(), 0);
    }

    #[test]
    fn build_failure_becomes_diagnostic() {
        let mut engine = FakeEngine::default();
        let broken = ShaderSource::new(DEFAULT_VERTEX, "#error unfinished");
        let err = ProgramValidator::default()
            .validate(&mut engine, &broken, 0.0)
            .unwrap_err();

        assert!(err.text().contains("unfinished"));
        assert_eq!(engine.offscreen_draws, 0);
        assert_eq!(engine.live_targets(), 0);
    }

    #[test]
    fn panic_while_building_releases_scratch_resources() {
        let mut engine = FakeEngine::default();
        let broken = ShaderSource::new(DEFAULT_VERTEX, "#panic boom");
        let err = ProgramValidator::default()
            .validate(&mut engine, &broken, 0.0)
            .unwrap_err();

        assert!(err.text().contains("validation panicked"));
        assert!(err.text().contains("boom"));
        assert!(!engine.is_capturing());
        assert_eq!(engine.live_targets(), 0);
        assert_eq!(engine.live_geometries(), 0);
        assert_eq!(engine.live_programs(), 0);
    }

    #[test]
    fn panic_while_drawing_releases_the_built_program() {
        let mut engine = FakeEngine::default();
        let broken = ShaderSource::new(DEFAULT_VERTEX, "#draw-panic boom");
        let err = ProgramValidator::default()
            .validate(&mut engine, &broken, 0.0)
            .unwrap_err();

        assert!(err.text().contains("boom"));
        assert_eq!(engine.programs_created, 1);
        assert_eq!(engine.disposed_programs.len(), 1);
        assert_eq!(engine.live_programs(), 0);
        assert_eq!(engine.live_targets(), 0);
        assert_eq!(engine.live_geometries(), 0);
    }

    #[test]
    fn missing_scratch_target_is_reported() {
        let mut engine = FakeEngine::default();
        engine.fail_target = true;
        let err = ProgramValidator::default()
            .validate(&mut engine, &valid_source(), 0.0)
            .unwrap_err();

        assert!(!err.messages().is_empty());
        assert_eq!(engine.programs_created, 0);
    }
}
