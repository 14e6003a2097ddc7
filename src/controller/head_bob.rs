/// Cosmetic head-bob: a vertical camera offset driven by grounded walking.
/// Purely visual; the physics position never sees it, so collision probes
/// always read the true, bob-free height.
pub struct HeadBob {
    pub frequency: f32,
    pub amplitude: f32,
    /// Speed on either horizontal axis below which the walk is treated as
    /// standing still.
    pub speed_threshold: f32,
    timer: f32,
    offset: f32,
}

impl HeadBob {
    pub fn new() -> Self {
        Self {
            frequency: 8.0,
            amplitude: 0.05,
            speed_threshold: 0.1,
            timer: 0.0,
            offset: 0.0,
        }
    }

    /// Advance the bob phase. While grounded and moving the offset follows a
    /// sine; otherwise the phase resets and the offset eases back to zero
    /// rather than snapping.
    pub fn update(&mut self, dt: f32, grounded: bool, velocity_x: f32, velocity_z: f32) {
        let moving = velocity_x.abs() > self.speed_threshold || velocity_z.abs() > self.speed_threshold;
        if grounded && moving {
            self.timer += dt * self.frequency;
            self.offset = self.timer.sin() * self.amplitude;
        } else {
            self.timer = 0.0;
            self.offset += (0.0 - self.offset) * (dt * 10.0).min(1.0);
        }
    }

    /// Current vertical camera offset, applied to the camera eye only.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
        self.offset = 0.0;
    }
}

impl Default for HeadBob {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn oscillates_while_walking() {
        let mut bob = HeadBob::new();
        let mut seen_nonzero = false;
        for _ in 0..30 {
            bob.update(DT, true, 2.0, 0.0);
            if bob.offset().abs() > 1e-4 {
                seen_nonzero = true;
            }
            assert!(bob.offset().abs() <= bob.amplitude + 1e-6);
        }
        assert!(seen_nonzero);
    }

    #[test]
    fn zero_when_airborne_regardless_of_speed() {
        let mut bob = HeadBob::new();
        for _ in 0..60 {
            bob.update(DT, false, 10.0, 10.0);
        }
        assert!(bob.offset().abs() < 1e-3);
    }

    #[test]
    fn airborne_transition_decays_instead_of_snapping() {
        let mut bob = HeadBob::new();
        // walk until the offset is visibly non-zero
        for _ in 0..7 {
            bob.update(DT, true, 2.0, 0.0);
        }
        let walking_offset = bob.offset().abs();
        assert!(walking_offset > 1e-3);

        bob.update(DT, false, 2.0, 0.0);
        let after = bob.offset().abs();
        assert!(after < walking_offset, "offset must shrink");
        assert!(after > 0.0, "but not jump straight to zero");
    }

    #[test]
    fn standing_below_threshold_is_still() {
        let mut bob = HeadBob::new();
        for _ in 0..60 {
            bob.update(DT, true, 0.05, 0.05);
        }
        assert!(bob.offset().abs() < 1e-3);
    }
}
