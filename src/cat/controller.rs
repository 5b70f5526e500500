use glam::Vec2;
use log::{debug, trace};

use super::input::InputTracker;
use super::jump::{JumpState, JumpTrajectory, JumpTransition, RandomSource};
use super::motion::Glide;
use super::pose::{Facing, HeadPose, Stance, VisualState};
use crate::config::CatTuning;

/// Result of offering one frame to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Loop is stopped (widget detached).
    Stopped,
    /// No pointer input yet.
    NoInput,
    /// Too soon after the previous evaluation.
    Throttled,
    Evaluated,
}

/// Counters for the debug overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickStats {
    pub evaluations: u64,
    pub throttled: u64,
    pub idle_frames: u64,
    pub jumps: u64,
    pub cancelled_jumps: u64,
}

/// Throttled state machine turning the pointer target into a [`VisualState`].
pub struct AnimationController<R: RandomSource = fastrand::Rng> {
    tuning: CatTuning,
    rng: R,
    running: bool,
    last_eval_ms: Option<f64>,
    glide: Glide,
    jump: JumpState,
    state: VisualState,
    stats: TickStats,
}

impl<R: RandomSource> AnimationController<R> {
    pub fn new(tuning: CatTuning, rng: R) -> Self {
        let glide = Glide::new(tuning.start_x, tuning.glide_ms);
        let state = VisualState::new(tuning.start_x);
        Self {
            tuning,
            rng,
            running: false,
            last_eval_ms: None,
            glide,
            jump: JumpState::Grounded,
            state,
            stats: TickStats::default(),
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Cancel the loop. Later frames are ignored until `start`.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> &VisualState {
        &self.state
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Offer a frame at `now_ms` on the frame clock.
    pub fn tick(&mut self, now_ms: f64, input: &InputTracker) -> Tick {
        if !self.running {
            return Tick::Stopped;
        }

        // Input handlers re-arm walking as soon as they fire, not at the next evaluation.
        if input.take_moved() {
            if self.state.stance == Stance::FirstPose {
                debug!("First input, leaving first pose");
            }
            self.state.stance = Stance::Walking;
            self.state.walking = true;
        }
        self.state.cat_x = self.glide.x_at(now_ms);

        let Some(target) = input.position() else {
            self.stats.idle_frames += 1;
            return Tick::NoInput;
        };

        if let Some(last) = self.last_eval_ms {
            if now_ms - last < self.tuning.throttle_ms {
                self.stats.throttled += 1;
                return Tick::Throttled;
            }
        }
        self.last_eval_ms = Some(now_ms);
        self.stats.evaluations += 1;

        let tracking_height = input.bounds().height();
        self.decide_turn(target, now_ms);
        self.decide_stop(now_ms);
        self.decide_head(target, tracking_height);
        self.decide_jump(target, tracking_height, now_ms);

        trace!(
            "eval t={:.0} target=({:.0},{:.0}) x={:.1} facing={:?} walking={} jumping={}",
            now_ms,
            target.x,
            target.y,
            self.state.cat_x,
            self.state.facing,
            self.state.walking,
            self.state.jumping(),
        );
        Tick::Evaluated
    }

    fn decide_turn(&mut self, target: Vec2, now_ms: f64) {
        let facing = if self.glide.x_at(now_ms) < target.x {
            Facing::Right
        } else {
            Facing::Left
        };
        if self.state.facing != Some(facing) {
            debug!("Turning {:?}", facing);
            self.state.facing = Some(facing);
            self.state.turned_at_ms = Some(now_ms);
        }
        self.glide.retarget(self.destination(facing, target.x), now_ms);
    }

    /// Legs stop once the cat stands on its destination.
    fn decide_stop(&mut self, now_ms: f64) {
        if self.glide.offset_left(now_ms) == self.glide.destination().round() as i32 {
            self.state.walking = false;
        }
    }

    fn decide_head(&mut self, target: Vec2, tracking_height: f32) {
        self.state.head = if target.y > tracking_height - self.tuning.head_low_band {
            HeadPose::Low
        } else {
            HeadPose::High
        };
    }

    fn decide_jump(&mut self, target: Vec2, tracking_height: f32, now_ms: f64) {
        let high_enough = target.y < tracking_height - self.tuning.jump_threshold;
        let tuning = &self.tuning;
        let rng = &mut self.rng;
        let transition = self.jump.step(high_enough, now_ms, || {
            JumpTrajectory::toward(target.y as f64, tracking_height as f64, tuning, rng)
        });

        match transition {
            JumpTransition::TookOff => {
                self.stats.jumps += 1;
                if let Some(jump) = self.jump.active() {
                    debug!(
                        "Jump: {:.1}vh over {:.2}s",
                        jump.trajectory.height_vh, jump.trajectory.duration_s
                    );
                }
            }
            JumpTransition::Landed => debug!("Landed"),
            JumpTransition::Cancelled => {
                self.stats.cancelled_jumps += 1;
                debug!("Jump cancelled, pointer dropped below threshold");
            }
            JumpTransition::None => {}
        }
        self.state.jump = self.jump.active().copied();
    }

    fn destination(&self, facing: Facing, target_x: f32) -> f32 {
        match facing {
            Facing::Right => target_x + self.tuning.face_right_offset,
            Facing::Left => target_x + self.tuning.face_left_offset,
        }
    }
}
