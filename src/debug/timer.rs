use instant::Instant;

/// Which phase of a frame is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FramePhase {
    Input = 0,
    Evaluate = 1,
    Rig = 2,
    Upload = 3,
    Render = 4,
}

pub const PHASE_COUNT: usize = 5;

impl FramePhase {
    pub const ALL: [FramePhase; PHASE_COUNT] = [
        Self::Input,
        Self::Evaluate,
        Self::Rig,
        Self::Upload,
        Self::Render,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Evaluate => "Evaluate",
            Self::Rig => "Rig",
            Self::Upload => "GPU Upload",
            Self::Render => "Render",
        }
    }
}

/// Per-phase timing with exponential moving average smoothing.
pub struct PhaseTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; PHASE_COUNT],
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl PhaseTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; PHASE_COUNT],
            start: Instant::now(),
        }
    }

    /// Call before a phase runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a phase finishes. Records elapsed time for `phase`.
    pub fn end(&mut self, phase: FramePhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        self.record(phase, elapsed_us);
    }

    fn record(&mut self, phase: FramePhase, elapsed_us: f64) {
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_converges_toward_samples() {
        let mut timers = PhaseTimers::new();
        for _ in 0..200 {
            timers.record(FramePhase::Rig, 50.0);
        }
        assert!((timers.durations_us[FramePhase::Rig as usize] - 50.0).abs() < 0.01);
        assert_eq!(timers.durations_us[FramePhase::Input as usize], 0.0);
        assert!((timers.total_us() - 50.0).abs() < 0.01);
    }

    #[test]
    fn labels_cover_every_phase() {
        for (i, phase) in FramePhase::ALL.iter().enumerate() {
            assert_eq!(*phase as usize, i);
            assert!(!phase.label().is_empty());
        }
    }
}
