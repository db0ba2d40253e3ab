// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Direction helpers shared by shapes with a major axis.

use glam::{Quat, Vec3};

/// Default major axis for arrows, cones, cylinders, capsules and plane normals.
pub const DEFAULT_DIRECTION: Vec3 = Vec3::Z;

/// Default facing for world-space text.
pub const DEFAULT_FACING: Vec3 = Vec3::NEG_Y;

/// Directions with `dot(dir, default)` at or below this are treated as
/// opposite to the default axis.
pub const OPPOSITE_THRESHOLD: f32 = -0.9998;

const DEGENERATE_LENGTH_SQ: f32 = 1e-12;

/// Rotation taking `default` onto `dir`.
///
/// Near-opposite directions get a half turn about X. A near-zero `dir`
/// yields the identity.
pub fn rotation_to(default: Vec3, dir: Vec3) -> Quat {
    if dir.length_squared() < DEGENERATE_LENGTH_SQ {
        return Quat::IDENTITY;
    }
    let dir = dir.normalize();
    if dir.dot(default) > OPPOSITE_THRESHOLD {
        Quat::from_rotation_arc(default, dir)
    } else {
        Quat::from_rotation_x(core::f32::consts::PI)
    }
}

/// Direction `default` points along after `rotation`.
#[inline]
pub fn direction_of(rotation: Quat, default: Vec3) -> Vec3 {
    rotation * default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_default_with_target() {
        for dir in [Vec3::X, Vec3::Y, Vec3::new(1.0, 2.0, -0.5), Vec3::Z] {
            let q = rotation_to(DEFAULT_DIRECTION, dir);
            assert!(direction_of(q, DEFAULT_DIRECTION).abs_diff_eq(dir.normalize(), 1e-5));
        }
    }

    #[test]
    fn opposite_uses_half_turn_about_x() {
        let q = rotation_to(DEFAULT_DIRECTION, Vec3::NEG_Z);
        assert!(q.abs_diff_eq(Quat::from_rotation_x(core::f32::consts::PI), 1e-6));
        assert!(direction_of(q, DEFAULT_DIRECTION).abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn zero_direction_is_identity() {
        assert_eq!(rotation_to(DEFAULT_DIRECTION, Vec3::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn facing_default() {
        let q = rotation_to(DEFAULT_FACING, Vec3::X);
        assert!(direction_of(q, DEFAULT_FACING).abs_diff_eq(Vec3::X, 1e-5));
    }
}
