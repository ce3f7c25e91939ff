use crate::debounce::Generation;
use crate::engine::{RenderEngine, SceneState};
use crate::error_log::ErrorLog;
use crate::validator::Diagnostics;

/// Result of one validation, tagged with the debounce generation that spawned it.
#[derive(Debug)]
pub struct ValidationAttempt<P> {
    pub generation: Generation,
    pub result: Result<P, Diagnostics>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Swapped,
    Failed { recorded: bool },
    /// A newer edit was scheduled after this attempt started.
    Discarded,
}

/// Owns the program bound to the visible mesh.
#[derive(Debug)]
pub struct ProgramSwapManager<P> {
    active: P,
    has_error: bool,
    keep_mesh_on_error: bool,
}

impl<P> ProgramSwapManager<P> {
    pub fn new(active: P, keep_mesh_on_error: bool) -> Self {
        Self {
            active,
            has_error: false,
            keep_mesh_on_error,
        }
    }

    pub fn active(&self) -> &P {
        &self.active
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn apply<E>(
        &mut self,
        engine: &mut E,
        attempt: ValidationAttempt<P>,
        latest: Generation,
        scene: &mut SceneState,
        log: &mut ErrorLog,
    ) -> ApplyOutcome
    where
        E: RenderEngine<Program = P>,
    {
        if attempt.generation != latest {
            tracing::debug!(
                generation = attempt.generation.0,
                latest = latest.0,
                "discarding stale validation result"
            );
            if let Ok(program) = attempt.result {
                engine.dispose_program(program);
            }
            return ApplyOutcome::Discarded;
        }

        match attempt.result {
            Ok(program) => {
                let previous = std::mem::replace(&mut self.active, program);
                engine.dispose_program(previous);
                scene.mesh_visible = true;
                scene.placeholder_visible = false;
                self.has_error = false;
                tracing::info!(generation = attempt.generation.0, "shader program swapped in");
                ApplyOutcome::Swapped
            }
            Err(diagnostics) => {
                if !self.keep_mesh_on_error {
                    scene.mesh_visible = false;
                }
                scene.placeholder_visible = true;
                self.has_error = true;
                let recorded = log.record(&diagnostics.text());
                tracing::warn!(
                    generation = attempt.generation.0,
                    diagnostics = %diagnostics,
                    "shader validation failed"
                );
                ApplyOutcome::Failed { recorded }
            }
        }
    }

    pub fn into_active(self) -> P {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeEngine, FakeProgram};
    use crate::source::ShaderSource;
    use crate::uniforms::UniformSet;

    fn program(engine: &mut FakeEngine) -> FakeProgram {
        engine
            .create_program(&ShaderSource::default(), &UniformSet::default())
            .unwrap()
    }

    fn failure(generation: u64, text: &str) -> ValidationAttempt<FakeProgram> {
        ValidationAttempt {
            generation: Generation(generation),
            result: Err(Diagnostics::from_message(text)),
        }
    }

    #[test]
    fn success_disposes_previous_and_clears_error() {
        let mut engine = FakeEngine::default();
        let first = program(&mut engine);
        let first_id = first.id;
        let mut manager = ProgramSwapManager::new(first, false);
        let mut scene = SceneState::default();
        let mut log = ErrorLog::new();

        manager.apply(&mut engine, failure(1, "boom"), Generation(1), &mut scene, &mut log);
        let replacement = program(&mut engine);
        let replacement_id = replacement.id;
        let outcome = manager.apply(
            &mut engine,
            ValidationAttempt {
                generation: Generation(2),
                result: Ok(replacement),
            },
            Generation(2),
            &mut scene,
            &mut log,
        );

        assert_eq!(outcome, ApplyOutcome::Swapped);
        assert_eq!(manager.active().id, replacement_id);
        assert_eq!(engine.disposed_programs, vec![first_id]);
        assert_eq!(engine.live_programs(), 1);
        assert!(!manager.has_error());
        assert!(scene.mesh_visible);
        assert!(!scene.placeholder_visible);
    }

    #[test]
    fn failure_keeps_active_program() {
        let mut engine = FakeEngine::default();
        let first = program(&mut engine);
        let first_id = first.id;
        let mut manager = ProgramSwapManager::new(first, false);
        let mut scene = SceneState::default();
        let mut log = ErrorLog::new();

        let outcome =
            manager.apply(&mut engine, failure(1, "boom"), Generation(1), &mut scene, &mut log);

        assert_eq!(outcome, ApplyOutcome::Failed { recorded: true });
        assert_eq!(manager.active().id, first_id);
        assert!(engine.disposed_programs.is_empty());
        assert!(manager.has_error());
        assert!(!scene.mesh_visible);
        assert!(scene.placeholder_visible);
    }

    #[test]
    fn repeated_failure_is_idempotent() {
        let mut engine = FakeEngine::default();
        let first = program(&mut engine);
        let mut manager = ProgramSwapManager::new(first, false);
        let mut scene = SceneState::default();
        let mut log = ErrorLog::new();

        manager.apply(&mut engine, failure(1, "boom"), Generation(1), &mut scene, &mut log);
        let after_first = scene;
        let outcome =
            manager.apply(&mut engine, failure(2, "boom"), Generation(2), &mut scene, &mut log);

        assert_eq!(outcome, ApplyOutcome::Failed { recorded: false });
        assert_eq!(scene, after_first);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn keep_mesh_on_error_leaves_mesh_visible() {
        let mut engine = FakeEngine::default();
        let first = program(&mut engine);
        let mut manager = ProgramSwapManager::new(first, true);
        let mut scene = SceneState::default();
        let mut log = ErrorLog::new();

        manager.apply(&mut engine, failure(1, "boom"), Generation(1), &mut scene, &mut log);

        assert!(scene.mesh_visible);
        assert!(scene.placeholder_visible);
    }

    #[test]
    fn stale_result_is_discarded_and_released() {
        let mut engine = FakeEngine::default();
        let first = program(&mut engine);
        let first_id = first.id;
        let mut manager = ProgramSwapManager::new(first, false);
        let mut scene = SceneState::default();
        let mut log = ErrorLog::new();

        let stale = program(&mut engine);
        let stale_id = stale.id;
        let outcome = manager.apply(
            &mut engine,
            ValidationAttempt {
                generation: Generation(3),
                result: Ok(stale),
            },
            Generation(4),
            &mut scene,
            &mut log,
        );
        let stale_failure =
            manager.apply(&mut engine, failure(3, "old"), Generation(4), &mut scene, &mut log);

        assert_eq!(outcome, ApplyOutcome::Discarded);
        assert_eq!(stale_failure, ApplyOutcome::Discarded);
        assert_eq!(manager.active().id, first_id);
        assert_eq!(engine.disposed_programs, vec![stale_id]);
        assert!(log.is_empty());
        assert_eq!(scene, SceneState::default());
    }
}
