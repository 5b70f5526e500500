//! Sprite rig: turns a [`VisualState`] into placed, rotated parts for one frame.
//!
//! Layout mirrors the pixel cat's box model: a 60x45 box anchored to the bottom
//! of the tracking area, with the head, tail and two leg pairs hung off it.

use glam::{Affine2, Vec2};

use super::input::Rect;
use super::motion::Easing;
use super::pose::{Facing, HeadPose, VisualState};

const CAT_SIZE: Vec2 = Vec2::new(60.0, 45.0);
const BODY_SIZE: Vec2 = Vec2::new(60.0, 30.0);
const HEAD_SIZE: Vec2 = Vec2::new(48.0, 40.0);
const TAIL_SIZE: Vec2 = Vec2::new(15.0, 36.0);
const LEG_SIZE: Vec2 = Vec2::new(10.0, 20.0);
const FRONT_LEGS_SIZE: Vec2 = Vec2::new(30.0, 30.0);
const BACK_LEGS_SIZE: Vec2 = Vec2::new(25.0, 30.0);

/// Legs hang 15px below their container.
const LEG_TOP: f32 = 25.0;

const WALK_PERIOD_MS: f64 = 300.0;
const WALK_SWING_DEG: f32 = 10.0;
const TAIL_SWING_MS: f64 = 2000.0;
const TAIL_SWING_DEG: f32 = 50.0;
const TURN_SQUASH_MS: f64 = 500.0;
const STAND_MS: f64 = 300.0;
const STAND_DEG: f32 = 45.0;
const LEG_TUCK_MS: f64 = 700.0;
const BACK_TUCK_DEG: f32 = 50.0;
const FRONT_TUCK_DEG: f32 = 60.0;

/// Shape drawn for a part. Values match the shader's `kind` switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PartKind {
    Body = 0,
    Head = 1,
    Tail = 2,
    Leg = 3,
}

/// One sprite part placed in tracking-area pixels.
#[derive(Debug, Clone, Copy)]
pub struct Part {
    pub kind: PartKind,
    pub size: Vec2,
    /// Maps part-local pixels (0..size) to tracking-area pixels.
    pub transform: Affine2,
    pub mirrored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegSwing {
    Walk,
    WalkAlt,
    Still,
}

/// Build the parts for `state` at `now_ms`, in draw order, into `out`.
pub fn build_rig(state: &VisualState, now_ms: f64, area: Rect, out: &mut Vec<Part>) {
    out.clear();

    let layout = state.layout_facing();
    let right = layout == Facing::Right;

    // Cat box, lifted by the jump and leaning into it.
    let lift = state.jump.map_or(0.0, |jump| {
        let apex = (jump.trajectory.height_vh as f32 / 100.0) * area.height();
        apex * there_and_back(0.0, 1.0, jump.progress(now_ms), Easing::EaseInOut)
    });
    let origin = area.min + Vec2::new(state.cat_x, area.height() - CAT_SIZE.y - lift);
    let mut cat = Affine2::from_translation(origin);
    if let (Some(jump), Some(facing)) = (state.jump, state.facing) {
        let t = progress(now_ms - jump.start_ms, STAND_MS);
        let angle = -facing.sign() * STAND_DEG * Easing::Ease.apply(t);
        let pivot = match facing {
            Facing::Right => Vec2::new(0.0, CAT_SIZE.y),
            Facing::Left => CAT_SIZE,
        };
        cat = cat * rotate_about(pivot, angle);
    }

    // Body squashes sideways halfway through a turn.
    let mut body = cat;
    if let Some(turned) = state.turned_at_ms {
        let t = progress(now_ms - turned, TURN_SQUASH_MS);
        if t < 1.0 {
            let sx = there_and_back(1.0, 0.5, t, Easing::Ease);
            body = body * scale_about(BODY_SIZE * 0.5, Vec2::new(sx, 1.0));
        }
    }
    out.push(Part {
        kind: PartKind::Body,
        size: BODY_SIZE,
        transform: body,
        mirrored: false,
    });

    // Tail swings once after every turn, and once at startup.
    let tail_t = progress(now_ms - state.turned_at_ms.unwrap_or(0.0), TAIL_SWING_MS);
    let (rest_x, swung_x) = if right { (-5.0, -10.0) } else { (45.0, 40.0) };
    let tail_x = there_and_back(rest_x, swung_x, tail_t, Easing::Ease);
    let tail_deg = there_and_back(0.0, -facing_sign(right) * TAIL_SWING_DEG, tail_t, Easing::Ease);
    let tail_sx = there_and_back(1.0, -1.0, tail_t, Easing::Ease);
    let tail = body
        * Affine2::from_translation(Vec2::new(tail_x, -25.0))
        * Affine2::from_translation(TAIL_SIZE)
        * Affine2::from_angle(tail_deg.to_radians())
        * Affine2::from_scale(Vec2::new(tail_sx, 1.0))
        * Affine2::from_translation(-TAIL_SIZE);
    out.push(Part {
        kind: PartKind::Tail,
        size: TAIL_SIZE,
        transform: tail,
        mirrored: false,
    });

    // Leg pairs. Airborne, the containers tuck and only the front pair paddles.
    let tuck = state
        .jump
        .map_or(0.0, |jump| Easing::Ease.apply(progress(now_ms - jump.start_ms, LEG_TUCK_MS)));
    let sign = facing_sign(right);
    let mirrored = state.facing == Some(Facing::Left);

    let front_x = if right { CAT_SIZE.x - FRONT_LEGS_SIZE.x } else { 0.0 };
    let front = cat
        * Affine2::from_translation(Vec2::new(front_x, 0.0))
        * rotate_about(FRONT_LEGS_SIZE * 0.5, -sign * FRONT_TUCK_DEG * tuck);
    let back_x = if right { 0.0 } else { 35.0 };
    let back = cat
        * Affine2::from_translation(Vec2::new(back_x, 0.0))
        * rotate_about(BACK_LEGS_SIZE * 0.5, sign * BACK_TUCK_DEG * tuck);

    let (one, two, three, four) = if state.jumping() {
        (LegSwing::Walk, LegSwing::WalkAlt, LegSwing::Still, LegSwing::Still)
    } else if state.walking {
        (LegSwing::Walk, LegSwing::WalkAlt, LegSwing::Walk, LegSwing::WalkAlt)
    } else {
        (LegSwing::Still, LegSwing::Still, LegSwing::Still, LegSwing::Still)
    };

    let legs = [
        (front, FRONT_LEGS_SIZE.x - LEG_SIZE.x, one),
        (front, 0.0, two),
        (back, BACK_LEGS_SIZE.x - LEG_SIZE.x, three),
        (back, 0.0, four),
    ];
    for (container, x, swing) in legs {
        let angle = leg_angle(swing, now_ms);
        let leg = container
            * Affine2::from_translation(Vec2::new(x, LEG_TOP))
            * rotate_about(Vec2::new(LEG_SIZE.x * 0.5, 0.0), angle);
        out.push(Part {
            kind: PartKind::Leg,
            size: LEG_SIZE,
            transform: leg,
            mirrored,
        });
    }

    // Head last, it sits above everything.
    let head_x = if right { 22.0 } else { -10.0 };
    let head_y = match state.head {
        HeadPose::High => -30.0,
        HeadPose::Low => -15.0,
    };
    out.push(Part {
        kind: PartKind::Head,
        size: HEAD_SIZE,
        transform: cat * Affine2::from_translation(Vec2::new(head_x, head_y)),
        mirrored: false,
    });
}

fn facing_sign(right: bool) -> f32 {
    if right {
        1.0
    } else {
        -1.0
    }
}

fn leg_angle(swing: LegSwing, now_ms: f64) -> f32 {
    let phase = (now_ms.rem_euclid(WALK_PERIOD_MS) / WALK_PERIOD_MS) as f32;
    match swing {
        LegSwing::Walk => there_and_back(-WALK_SWING_DEG, WALK_SWING_DEG, phase, Easing::Ease),
        LegSwing::WalkAlt => there_and_back(WALK_SWING_DEG, -WALK_SWING_DEG, phase, Easing::Ease),
        LegSwing::Still => 0.0,
    }
}

/// Elapsed fraction of a one-shot animation.
fn progress(elapsed_ms: f64, duration_ms: f64) -> f32 {
    (elapsed_ms / duration_ms).clamp(0.0, 1.0) as f32
}

/// Three keyframes `a -> b -> a`, eased per segment.
fn there_and_back(a: f32, b: f32, t: f32, easing: Easing) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        a + (b - a) * easing.apply(t * 2.0)
    } else {
        b + (a - b) * easing.apply((t - 0.5) * 2.0)
    }
}

/// Rotation by `deg` (clockwise on screen) around `pivot`.
fn rotate_about(pivot: Vec2, deg: f32) -> Affine2 {
    Affine2::from_translation(pivot)
        * Affine2::from_angle(deg.to_radians())
        * Affine2::from_translation(-pivot)
}

fn scale_about(pivot: Vec2, scale: Vec2) -> Affine2 {
    Affine2::from_translation(pivot) * Affine2::from_scale(scale) * Affine2::from_translation(-pivot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat::jump::{ActiveJump, JumpTrajectory};
    use crate::cat::pose::Stance;

    const AREA_H: f32 = 800.0;

    fn area() -> Rect {
        Rect::from_size(1200.0, AREA_H)
    }

    fn rig(state: &VisualState, now_ms: f64) -> Vec<Part> {
        let mut parts = Vec::new();
        build_rig(state, now_ms, area(), &mut parts);
        parts
    }

    fn head(parts: &[Part]) -> Vec2 {
        let head = parts.iter().find(|p| p.kind == PartKind::Head).expect("head part");
        head.transform.transform_point2(Vec2::ZERO)
    }

    fn walking_right(cat_x: f32) -> VisualState {
        VisualState {
            facing: Some(Facing::Right),
            stance: Stance::Walking,
            walking: true,
            turned_at_ms: Some(0.0),
            ..VisualState::new(cat_x)
        }
    }

    #[test]
    fn rig_has_every_part_in_draw_order() {
        let parts = rig(&VisualState::new(100.0), 0.0);
        let kinds: Vec<_> = parts.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PartKind::Body,
                PartKind::Tail,
                PartKind::Leg,
                PartKind::Leg,
                PartKind::Leg,
                PartKind::Leg,
                PartKind::Head
            ]
        );
    }

    #[test]
    fn cat_sits_on_bottom_edge() {
        let parts = rig(&VisualState::new(100.0), 5000.0);
        let body = parts[0].transform.transform_point2(Vec2::ZERO);
        assert_eq!(body, Vec2::new(100.0, AREA_H - 45.0));
    }

    #[test]
    fn first_pose_head_sits_left() {
        let parts = rig(&VisualState::new(100.0), 5000.0);
        assert_eq!(head(&parts), Vec2::new(90.0, AREA_H - 45.0 - 30.0));
    }

    #[test]
    fn facing_right_moves_head_forward_and_low() {
        let mut state = walking_right(100.0);
        let parts = rig(&state, 5000.0);
        assert_eq!(head(&parts), Vec2::new(122.0, AREA_H - 75.0));

        state.head = HeadPose::Low;
        let parts = rig(&state, 5000.0);
        assert_eq!(head(&parts).y, AREA_H - 60.0);
    }

    #[test]
    fn idle_legs_hang_straight() {
        let mut state = walking_right(100.0);
        state.walking = false;
        for part in rig(&state, 1234.0).iter().filter(|p| p.kind == PartKind::Leg) {
            let down = part.transform.transform_vector2(Vec2::Y);
            assert!(down.x.abs() < 1e-5);
        }
    }

    #[test]
    fn walking_legs_swing_in_opposite_phase() {
        let parts = rig(&walking_right(100.0), 5000.0 + 75.0);
        let legs: Vec<_> = parts.iter().filter(|p| p.kind == PartKind::Leg).collect();
        let a = legs[0].transform.transform_vector2(Vec2::Y).x;
        let b = legs[1].transform.transform_vector2(Vec2::Y).x;
        assert!(a.abs() > 0.01);
        assert!((a + b).abs() < 1e-5);
    }

    #[test]
    fn jump_lifts_cat_to_apex_at_midpoint() {
        let trajectory = JumpTrajectory { height_vh: 50.0, duration_s: 2.0 };
        let state = VisualState {
            jump: Some(ActiveJump { trajectory, start_ms: 1000.0, end_ms: 3000.0 }),
            ..walking_right(100.0)
        };
        let start = rig(&state, 1000.0);
        let apex = rig(&state, 2000.0);
        let start_y = head(&start).y;
        let apex_y = head(&apex).y;
        // Apex is half the viewport higher; the lean shifts the head a little too.
        assert!(start_y - apex_y > AREA_H * 0.5 - 60.0);
    }

    #[test]
    fn body_squashes_mid_turn() {
        let state = walking_right(100.0);
        let parts = rig(&state, 250.0);
        let width = parts[0].transform.transform_vector2(Vec2::X).length();
        assert!((width - 0.5).abs() < 1e-4);
        let settled = rig(&state, 600.0);
        assert_eq!(settled[0].transform.transform_vector2(Vec2::X).length(), 1.0);
    }

    #[test]
    fn keyframes_return_to_start() {
        assert_eq!(there_and_back(1.0, 3.0, 0.0, Easing::Ease), 1.0);
        assert_eq!(there_and_back(1.0, 3.0, 0.5, Easing::Ease), 3.0);
        assert_eq!(there_and_back(1.0, 3.0, 1.0, Easing::Ease), 1.0);
    }
}
