//! Jump trajectory and the grounded/airborne state machine.

use crate::config::CatTuning;

/// Uniform random numbers in `[0, 1)`. Injected so jumps can be replayed.
pub trait RandomSource {
    fn unit(&mut self) -> f64;
}

impl RandomSource for fastrand::Rng {
    fn unit(&mut self) -> f64 {
        self.f64()
    }
}

/// Height and airtime of one jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpTrajectory {
    /// Apex height as a percentage of viewport height.
    pub height_vh: f64,
    pub duration_s: f64,
}

impl JumpTrajectory {
    /// Aim at the pointer: the higher it is, the higher the jump, with up to
    /// 20% randomly shaved off.
    pub fn toward(target_y: f64, tracking_height: f64, tuning: &CatTuning, rng: &mut impl RandomSource) -> Self {
        let variance = 1.0 - tuning.jump_variance + tuning.jump_variance * rng.unit();
        let height_vh = jump_height_vh(target_y, tracking_height, variance, tuning);
        Self {
            height_vh,
            duration_s: jump_duration_s(height_vh, tuning.jump_gravity),
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_s * 1000.0
    }
}

/// Pointer height above the bottom edge in percent, scaled and clamped.
///
/// A collapsed tracking area counts as zero height.
pub fn jump_height_vh(target_y: f64, tracking_height: f64, variance: f64, tuning: &CatTuning) -> f64 {
    let raw = if tracking_height > 0.0 {
        (tracking_height - target_y) / tracking_height * 100.0
    } else {
        0.0
    };
    let scaled = raw * variance;
    if scaled.is_nan() {
        return tuning.jump_min_vh;
    }
    scaled.clamp(tuning.jump_min_vh, tuning.jump_max_vh)
}

/// Rise-and-fall time: `2 * sqrt(2h / g)`.
pub fn jump_duration_s(height_vh: f64, gravity: f64) -> f64 {
    2.0 * (2.0 * height_vh.max(0.0) / gravity).sqrt()
}

/// A jump in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveJump {
    pub trajectory: JumpTrajectory,
    pub start_ms: f64,
    pub end_ms: f64,
}

impl ActiveJump {
    /// Fraction of the airtime elapsed, 0.0..=1.0.
    pub fn progress(&self, now_ms: f64) -> f32 {
        let span = self.end_ms - self.start_ms;
        if span <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / span).clamp(0.0, 1.0) as f32
    }

    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        (self.end_ms - now_ms).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpState {
    Grounded,
    Airborne(ActiveJump),
}

/// What a jump evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTransition {
    None,
    TookOff,
    Landed,
    Cancelled,
}

impl JumpState {
    pub fn active(&self) -> Option<&ActiveJump> {
        match self {
            JumpState::Grounded => None,
            JumpState::Airborne(jump) => Some(jump),
        }
    }

    /// Advance the state machine for one evaluation.
    ///
    /// `high_enough` is the take-off condition. While it holds a grounded cat
    /// takes off and an airborne one lands once `now >= end`. When it stops
    /// holding, an airborne cat lands immediately.
    pub fn step(
        &mut self,
        high_enough: bool,
        now_ms: f64,
        launch: impl FnOnce() -> JumpTrajectory,
    ) -> JumpTransition {
        match (*self, high_enough) {
            (JumpState::Grounded, true) => {
                let trajectory = launch();
                *self = JumpState::Airborne(ActiveJump {
                    trajectory,
                    start_ms: now_ms,
                    end_ms: now_ms + trajectory.duration_ms(),
                });
                JumpTransition::TookOff
            }
            (JumpState::Airborne(jump), true) if now_ms >= jump.end_ms => {
                *self = JumpState::Grounded;
                JumpTransition::Landed
            }
            (JumpState::Airborne(_), false) => {
                *self = JumpState::Grounded;
                JumpTransition::Cancelled
            }
            _ => JumpTransition::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn unit(&mut self) -> f64 {
            self.0
        }
    }

    fn trajectory(height_vh: f64) -> JumpTrajectory {
        JumpTrajectory {
            height_vh,
            duration_s: jump_duration_s(height_vh, 100.0),
        }
    }

    #[test]
    fn height_for_pointer_near_top() {
        let tuning = CatTuning::default();
        let low = JumpTrajectory::toward(100.0, 800.0, &tuning, &mut Fixed(0.0));
        let high = JumpTrajectory::toward(100.0, 800.0, &tuning, &mut Fixed(0.999_999));
        assert!((low.height_vh - 70.0).abs() < 1e-9);
        assert!((high.height_vh - 87.5).abs() < 1e-3);
        assert!((low.duration_s - 2.0 * (2.0 * 70.0 / 100.0f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn height_is_always_clamped() {
        let tuning = CatTuning::default();
        for &y in &[-5000.0, 0.0, 1.0, 599.0, 799.0, 800.0, 1e6] {
            for &r in &[0.0, 0.5, 0.999] {
                let t = JumpTrajectory::toward(y, 800.0, &tuning, &mut Fixed(r));
                assert!(t.height_vh >= 10.0 && t.height_vh <= 90.0, "y={y} r={r} h={}", t.height_vh);
            }
        }
        assert_eq!(jump_height_vh(0.0, 800.0, 1.0, &tuning), 90.0);
        assert_eq!(jump_height_vh(800.0, 800.0, 1.0, &tuning), 10.0);
    }

    #[test]
    fn collapsed_tracking_area_gives_minimum_height() {
        let tuning = CatTuning::default();
        assert_eq!(jump_height_vh(100.0, 0.0, 1.0, &tuning), 10.0);
        assert_eq!(jump_height_vh(100.0, -10.0, 0.8, &tuning), 10.0);
    }

    #[test]
    fn duration_increases_with_height() {
        let mut prev = 0.0;
        for h in 10..=90 {
            let d = jump_duration_s(h as f64, 100.0);
            assert!(d > prev);
            prev = d;
        }
        assert!((jump_duration_s(50.0, 100.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn seeded_rng_replays_the_same_jump() {
        let tuning = CatTuning::default();
        let a = JumpTrajectory::toward(200.0, 900.0, &tuning, &mut fastrand::Rng::with_seed(42));
        let b = JumpTrajectory::toward(200.0, 900.0, &tuning, &mut fastrand::Rng::with_seed(42));
        assert_eq!(a, b);
    }

    #[test]
    fn natural_expiry_lands_exactly_at_end() {
        let mut state = JumpState::Grounded;
        assert_eq!(state.step(true, 1000.0, || trajectory(50.0)), JumpTransition::TookOff);
        let end = state.active().map(|j| j.end_ms).unwrap_or_default();
        assert_eq!(end, 3000.0);

        assert_eq!(state.step(true, 2999.0, || trajectory(50.0)), JumpTransition::None);
        assert!(state.active().is_some());
        assert_eq!(state.step(true, 3000.0, || trajectory(50.0)), JumpTransition::Landed);
        assert_eq!(state, JumpState::Grounded);
    }

    #[test]
    fn low_pointer_cancels_mid_jump() {
        let mut state = JumpState::Grounded;
        state.step(true, 0.0, || trajectory(90.0));
        assert_eq!(state.step(false, 10.0, || trajectory(90.0)), JumpTransition::Cancelled);
        assert_eq!(state, JumpState::Grounded);
        assert_eq!(state.step(false, 20.0, || trajectory(90.0)), JumpTransition::None);
    }

    #[test]
    fn progress_runs_over_airtime() {
        let jump = ActiveJump { trajectory: trajectory(50.0), start_ms: 100.0, end_ms: 2100.0 };
        assert_eq!(jump.progress(100.0), 0.0);
        assert_eq!(jump.progress(1100.0), 0.5);
        assert_eq!(jump.progress(5000.0), 1.0);
        assert_eq!(jump.remaining_ms(1600.0), 500.0);
    }
}
