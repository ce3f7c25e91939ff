use std::f32::consts::TAU;

use crate::engine::{FrameState, RenderEngine, SceneState};
use crate::uniforms::{UniformClock, UniformSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Drawn,
    DrawFailed,
    Stopped,
}

/// Per-frame driver. Rendering never waits on validation; it uses whatever is active.
#[derive(Debug, Clone)]
pub struct RenderLoop {
    clock: UniformClock,
    rotation_step: f32,
    auto_rotate: bool,
    running: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn new(clock: UniformClock, rotation_step: f32, auto_rotate: bool) -> Self {
        Self {
            clock,
            rotation_step,
            auto_rotate,
            running: true,
            frames: 0,
        }
    }

    pub fn clock(&self) -> &UniformClock {
        &self.clock
    }

    pub fn uniforms(&self) -> &UniformSet {
        self.clock.uniforms()
    }

    pub fn record_pointer(&mut self, x: f32, y: f32) {
        self.clock.record_pointer(x, y);
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(frames = self.frames, "render loop stopped");
        }
        self.running = false;
    }

    pub fn tick<E: RenderEngine>(
        &mut self,
        engine: &mut E,
        program: &E::Program,
        geometry: &E::Geometry,
        scene: &mut SceneState,
    ) -> TickOutcome {
        if !self.running {
            return TickOutcome::Stopped;
        }

        let uniforms = *self.clock.tick();
        if self.auto_rotate {
            scene.rotation = (scene.rotation + self.rotation_step).rem_euclid(TAU);
        }
        engine.advance_camera();
        self.frames += 1;

        let frame = FrameState {
            program,
            geometry,
            uniforms: &uniforms,
            scene: &*scene,
        };
        match engine.draw_frame(frame) {
            Ok(()) => TickOutcome::Drawn,
            Err(err) => {
                tracing::warn!(frame = self.frames, "frame draw failed: {err}");
                TickOutcome::DrawFailed
            }
        }
    }
}
