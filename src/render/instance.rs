use bytemuck::{Pod, Zeroable};

use crate::cat::animation::Part;

/// Per-instance data uploaded to GPU each frame.
/// Stride = 40 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PartInstance {
    /// Affine transform columns (part pixels -> screen pixels).
    pub x_axis: [f32; 2],
    pub y_axis: [f32; 2],
    pub translation: [f32; 2],
    /// Part size in pixels.
    pub size: [f32; 2],
    /// Shape index (see `PartKind`).
    pub kind: u32,
    /// Bit 0: mirror horizontally.
    pub flags: u32,
}

pub const FLAG_MIRRORED: u32 = 1;

impl PartInstance {
    pub fn from_part(part: &Part) -> Self {
        let m = part.transform.matrix2;
        Self {
            x_axis: m.x_axis.into(),
            y_axis: m.y_axis.into(),
            translation: part.transform.translation.into(),
            size: part.size.into(),
            kind: part.kind as u32,
            flags: if part.mirrored { FLAG_MIRRORED } else { 0 },
        }
    }
}

/// Uniforms shared by every part.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Globals {
    pub screen_size: [f32; 2],
    /// Seconds since start, drives the rainbow cycle.
    pub time: f32,
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat::animation::PartKind;
    use glam::{Affine2, Vec2};

    #[test]
    fn instance_layout_matches_pipeline() {
        assert_eq!(std::mem::size_of::<PartInstance>(), 40);
        assert_eq!(std::mem::size_of::<Globals>(), 16);
    }

    #[test]
    fn from_part_copies_transform() {
        let part = Part {
            kind: PartKind::Leg,
            size: Vec2::new(10.0, 20.0),
            transform: Affine2::from_translation(Vec2::new(3.0, 4.0)),
            mirrored: true,
        };
        let inst = PartInstance::from_part(&part);
        assert_eq!(inst.x_axis, [1.0, 0.0]);
        assert_eq!(inst.y_axis, [0.0, 1.0]);
        assert_eq!(inst.translation, [3.0, 4.0]);
        assert_eq!(inst.kind, 3);
        assert_eq!(inst.flags, FLAG_MIRRORED);
    }
}
