use liveconfig::ClockConfig;

/// Per-frame values fed to every user program.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformSet {
    pub time: f32,
    pub pointer_position: [f32; 2],
    pub pointer_speed: f32,
}

impl UniformSet {
    /// Minimal set used for scratch compiles; only `time` is carried over.
    pub fn seeded(time: f32) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }
}

/// Advances `time` by a fixed step and relaxes pointer speed every frame.
#[derive(Debug, Clone)]
pub struct UniformClock {
    uniforms: UniformSet,
    elapsed: f64,
    time_step: f32,
    speed: f32,
    decay: f32,
    latest_sample: Option<[f32; 2]>,
    applied_sample: Option<[f32; 2]>,
}

impl UniformClock {
    pub fn new(time_step: f32, speed: f32, decay: f32) -> Self {
        Self {
            uniforms: UniformSet::default(),
            elapsed: 0.0,
            time_step,
            speed,
            decay,
            latest_sample: None,
            applied_sample: None,
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        Self::new(config.time_step, config.speed, config.pointer_decay)
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn time(&self) -> f32 {
        self.uniforms.time
    }

    /// Records the most recent pointer position; it is applied on the next tick.
    pub fn record_pointer(&mut self, x: f32, y: f32) {
        self.latest_sample = Some([x, y]);
    }

    pub fn tick(&mut self) -> &UniformSet {
        self.elapsed += f64::from(self.time_step) * f64::from(self.speed);
        let next = self.elapsed as f32;
        // Once the step drops below one f32 ulp the cast stalls; step to the next float instead.
        self.uniforms.time = if next > self.uniforms.time {
            next
        } else {
            f32::from_bits(self.uniforms.time.to_bits() + 1)
        };

        if let Some(sample) = self.latest_sample {
            self.uniforms.pointer_position = sample;
            let delta = self
                .applied_sample
                .map(|previous| {
                    let dx = sample[0] - previous[0];
                    let dy = sample[1] - previous[1];
                    (dx * dx + dy * dy).sqrt()
                })
                .unwrap_or(0.0);
            if delta > 0.0 {
                self.uniforms.pointer_speed = delta;
            }
            self.applied_sample = Some(sample);
        }
        self.uniforms.pointer_speed *= self.decay;

        &self.uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> UniformClock {
        UniformClock::new(0.016, 1.0, 0.95)
    }

    #[test]
    fn time_strictly_increases() {
        let mut clock = clock();
        let mut last = clock.time();
        for _ in 0..1_000 {
            let now = clock.tick().time;
            assert!(now > last, "{now} should exceed {last}");
            last = now;
        }
    }

    #[test]
    fn time_keeps_increasing_when_step_is_below_precision() {
        let mut clock = UniformClock::new(0.016, 0.001, 0.95);
        clock.elapsed = 256.0;
        clock.uniforms.time = 256.0;

        let mut previous = clock.time();
        for _ in 0..1_000 {
            let current = clock.tick().time;
            assert!(current > previous, "time stalled at {current}");
            previous = current;
        }
    }

    #[test]
    fn speed_multiplier_scales_step() {
        let mut slow = UniformClock::new(0.01, 1.0, 0.95);
        let mut fast = UniformClock::new(0.01, 3.0, 0.95);
        for _ in 0..10 {
            slow.tick();
            fast.tick();
        }
        assert!((slow.time() - 0.1).abs() < 1e-5);
        assert!((fast.time() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn pointer_speed_tracks_movement() {
        let mut clock = clock();
        clock.record_pointer(0.0, 0.0);
        clock.tick();
        clock.record_pointer(3.0, 4.0);
        let uniforms = *clock.tick();
        assert_eq!(uniforms.pointer_position, [3.0, 4.0]);
        assert!((uniforms.pointer_speed - 5.0 * 0.95).abs() < 1e-5);
    }

    #[test]
    fn pointer_speed_decays_below_epsilon_when_idle() {
        let mut clock = clock();
        clock.record_pointer(0.0, 0.0);
        clock.tick();
        clock.record_pointer(10.0, 0.0);
        clock.tick();

        let epsilon = 1e-4_f32;
        // 10 * 0.95^n < 1e-4 once n > ln(1e-5) / ln(0.95) ~= 224.5
        let bound = 230;
        let mut ticks = 0;
        while clock.uniforms().pointer_speed >= epsilon {
            clock.tick();
            ticks += 1;
            assert!(ticks <= bound, "speed did not decay within {bound} ticks");
        }
    }

    #[test]
    fn stationary_pointer_does_not_reset_speed() {
        let mut clock = clock();
        clock.record_pointer(1.0, 1.0);
        clock.tick();
        clock.record_pointer(2.0, 1.0);
        let first = clock.tick().pointer_speed;
        let second = clock.tick().pointer_speed;
        assert!(second < first);
        assert!(second > 0.0);
    }
}
