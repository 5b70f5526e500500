use super::jump::ActiveJump;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// +1 for right, -1 for left.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// One-way latch: the cat sits in its first pose until it sees input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    FirstPose,
    Walking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadPose {
    High,
    Low,
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    /// `None` until the first evaluation with input.
    pub facing: Option<Facing>,
    pub stance: Stance,
    /// Legs animating.
    pub walking: bool,
    pub head: HeadPose,
    pub jump: Option<ActiveJump>,
    /// Animated left edge of the cat, widget pixels.
    pub cat_x: f32,
    /// Frame time of the last change of facing.
    pub turned_at_ms: Option<f64>,
}

impl VisualState {
    pub fn new(cat_x: f32) -> Self {
        Self {
            facing: None,
            stance: Stance::FirstPose,
            walking: false,
            head: HeadPose::High,
            jump: None,
            cat_x,
            turned_at_ms: None,
        }
    }

    pub fn jumping(&self) -> bool {
        self.jump.is_some()
    }

    pub fn jump_height_vh(&self) -> Option<f64> {
        self.jump.map(|j| j.trajectory.height_vh)
    }

    pub fn jump_duration_s(&self) -> Option<f64> {
        self.jump.map(|j| j.trajectory.duration_s)
    }

    /// Which way the parts are laid out. The first pose mirrors facing left;
    /// a cat that has left it but not yet turned uses the default layout.
    pub fn layout_facing(&self) -> Facing {
        match (self.stance, self.facing) {
            (_, Some(facing)) => facing,
            (Stance::FirstPose, None) => Facing::Left,
            (Stance::Walking, None) => Facing::Right,
        }
    }
}
