/// Timing curve for a transition or keyframe segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// CSS `ease`.
    Ease,
    /// CSS `ease-in-out`.
    EaseInOut,
}

impl Easing {
    /// Apply to normalized time (clamped to 0.0..=1.0).
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let curve = match self {
            Easing::Ease => UnitBezier::new(0.25, 0.1, 0.25, 1.0),
            Easing::EaseInOut => UnitBezier::new(0.42, 0.0, 0.58, 1.0),
        };
        curve.y(curve.solve_x(t))
    }
}

const SOLVE_EPSILON: f32 = 1e-5;

/// Cubic bezier from (0,0) to (1,1), kept as polynomial coefficients so
/// each axis is `((a*s + b)*s + c)*s`.
struct UnitBezier {
    ax: f32,
    bx: f32,
    cx: f32,
    ay: f32,
    by: f32,
    cy: f32,
}

impl UnitBezier {
    fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        Self {
            ax: 1.0 - cx - bx,
            bx,
            cx,
            ay: 1.0 - cy - by,
            by,
            cy,
        }
    }

    fn x(&self, s: f32) -> f32 {
        ((self.ax * s + self.bx) * s + self.cx) * s
    }

    fn y(&self, s: f32) -> f32 {
        ((self.ay * s + self.by) * s + self.cy) * s
    }

    fn dx(&self, s: f32) -> f32 {
        (3.0 * self.ax * s + 2.0 * self.bx) * s + self.cx
    }

    /// Parameter `s` with `x(s) == x`. Newton steps, bisection if they stall.
    fn solve_x(&self, x: f32) -> f32 {
        let mut s = x;
        for _ in 0..8 {
            let err = self.x(s) - x;
            if err.abs() < SOLVE_EPSILON {
                return s;
            }
            let slope = self.dx(s);
            if slope.abs() < 1e-6 {
                break;
            }
            s -= err / slope;
        }

        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        s = x;
        while hi - lo > SOLVE_EPSILON {
            let value = self.x(s);
            if (value - x).abs() < SOLVE_EPSILON {
                break;
            }
            if value < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        s
    }
}

/// Animated horizontal offset of the cat (its `left` edge in widget pixels).
///
/// Behaves like a CSS transition: a new destination starts a fresh transition
/// from wherever the cat currently is; the same destination leaves it running.
#[derive(Debug, Clone, Copy)]
pub struct Glide {
    from: f32,
    to: f32,
    start_ms: f64,
    duration_ms: f64,
    easing: Easing,
}

impl Glide {
    pub fn new(x: f32, duration_ms: f64) -> Self {
        Self {
            from: x,
            to: x,
            start_ms: 0.0,
            duration_ms,
            easing: Easing::Ease,
        }
    }

    /// Current animated x.
    pub fn x_at(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return self.to;
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms) as f32;
        self.from + (self.to - self.from) * self.easing.apply(t)
    }

    /// Current x in whole layout pixels.
    pub fn offset_left(&self, now_ms: f64) -> i32 {
        self.x_at(now_ms).round() as i32
    }

    pub fn destination(&self) -> f32 {
        self.to
    }

    /// Move the destination. Returns true if a new transition started.
    pub fn retarget(&mut self, to: f32, now_ms: f64) -> bool {
        if to == self.to {
            return false;
        }
        self.from = self.x_at(now_ms);
        self.to = to;
        self.start_ms = now_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for easing in [Easing::Ease, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(7.0), 1.0);
        }
    }

    #[test]
    fn ease_matches_css_reference_values() {
        // Browser-computed samples of cubic-bezier(0.25, 0.1, 0.25, 1.0).
        assert!((Easing::Ease.apply(0.5) - 0.8024).abs() < 0.001);
        assert!((Easing::Ease.apply(0.25) - 0.4094).abs() < 0.002);
    }

    #[test]
    fn ease_in_out_is_symmetric_at_midpoint() {
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 0.01);
    }

    #[test]
    fn ease_is_monotonic() {
        let mut prev = 0.0;
        for i in 1..=20 {
            let v = Easing::Ease.apply(i as f32 / 20.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn glide_reaches_destination_after_duration() {
        let mut glide = Glide::new(100.0, 1500.0);
        assert!(glide.retarget(400.0, 1000.0));
        assert_eq!(glide.x_at(1000.0), 100.0);
        let mid = glide.x_at(1750.0);
        assert!(mid > 100.0 && mid < 400.0);
        assert_eq!(glide.x_at(2500.0), 400.0);
        assert_eq!(glide.offset_left(2600.0), 400);
    }

    #[test]
    fn retarget_starts_from_current_position() {
        let mut glide = Glide::new(0.0, 1000.0);
        glide.retarget(1000.0, 0.0);
        let here = glide.x_at(500.0);
        glide.retarget(0.0, 500.0);
        assert_eq!(glide.x_at(500.0), here);
        assert_eq!(glide.x_at(1500.0), 0.0);
    }

    #[test]
    fn same_destination_does_not_restart() {
        let mut glide = Glide::new(0.0, 1000.0);
        glide.retarget(200.0, 0.0);
        assert!(!glide.retarget(200.0, 900.0));
        assert_eq!(glide.x_at(1000.0), 200.0);
    }
}
