// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shapes fully described by the core attribute block.
//!
//! Each kind reinterprets scale and rotation:
//!
//! | kind | scale | rotation |
//! |---|---|---|
//! | sphere, star | radius on all axes | unused |
//! | box, pose | extents | orientation |
//! | arrow, cylinder, capsule | radius on x/y, length on z | +Z onto direction |
//! | cone | angle (radians) on x/y, length on z | +Z onto direction |
//! | plane | size on x/z, normal length on y | +Z onto normal |

use glam::{Quat, Vec3};
use vantage_proto::ShapeKind;

use crate::object::ShapeCore;
use crate::orient::{direction_of, rotation_to, DEFAULT_DIRECTION};
use crate::renderable::Renderable;

macro_rules! simple_shape {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            core: ShapeCore,
        }

        impl $name {
            /// Rebuild from a received core.
            pub const fn from_core(core: ShapeCore) -> Self {
                Self { core }
            }

            fn with_core(object_id: u32) -> Self {
                Self {
                    core: ShapeCore::new(ShapeKind::$kind.routing_id(), object_id),
                }
            }
        }

        impl Renderable for $name {
            fn core(&self) -> &ShapeCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut ShapeCore {
                &mut self.core
            }
        }
    };
}

macro_rules! directed {
    ($name:ident) => {
        impl $name {
            /// Direction of the major axis.
            pub fn direction(&self) -> Vec3 {
                direction_of(self.core.rotation(), DEFAULT_DIRECTION)
            }

            /// Point the major axis along `dir`.
            pub fn set_direction(&mut self, dir: Vec3) {
                self.core.attributes.rotation = rotation_to(DEFAULT_DIRECTION, dir);
            }

            /// Builder form of [`Self::set_direction`].
            pub fn with_direction(mut self, dir: Vec3) -> Self {
                self.set_direction(dir);
                self
            }

            /// Length along the major axis.
            pub const fn length(&self) -> f32 {
                self.core.attributes.scale.z
            }

            /// Set the length along the major axis.
            pub fn set_length(&mut self, length: f32) {
                self.core.attributes.scale.z = length;
            }

            /// Builder form of [`Self::set_length`].
            pub fn with_length(mut self, length: f32) -> Self {
                self.set_length(length);
                self
            }
        }
    };
}

macro_rules! radial {
    ($name:ident) => {
        impl $name {
            /// Radius around the major axis.
            pub const fn radius(&self) -> f32 {
                self.core.attributes.scale.x
            }

            /// Set the radius around the major axis.
            pub fn set_radius(&mut self, radius: f32) {
                self.core.attributes.scale.x = radius;
                self.core.attributes.scale.y = radius;
            }

            /// Builder form of [`Self::set_radius`].
            pub fn with_radius(mut self, radius: f32) -> Self {
                self.set_radius(radius);
                self
            }
        }
    };
}

simple_shape!(
    /// Sphere.
    Sphere => Sphere
);
simple_shape!(
    /// Box; scale holds the full extents.
    BoxShape => Box
);
simple_shape!(
    /// Cone from its apex.
    Cone => Cone
);
simple_shape!(
    /// Cylinder about its centre.
    Cylinder => Cylinder
);
simple_shape!(
    /// Capsule about its centre.
    Capsule => Capsule
);
simple_shape!(
    /// Plane patch with a normal indicator.
    Plane => Plane
);
simple_shape!(
    /// Star marker.
    Star => Star
);
simple_shape!(
    /// Arrow from its base.
    Arrow => Arrow
);
simple_shape!(
    /// Coordinate axes.
    Pose => Pose
);

directed!(Cone);
directed!(Cylinder);
directed!(Capsule);
directed!(Arrow);
radial!(Cylinder);
radial!(Capsule);
radial!(Arrow);

/// Default cone angle, 45 degrees.
pub const DEFAULT_CONE_ANGLE: f32 = core::f32::consts::FRAC_PI_4;

/// Default arrow shaft radius.
pub const DEFAULT_ARROW_RADIUS: f32 = 0.025;

impl Sphere {
    /// Unit sphere at the origin.
    pub fn new(object_id: u32) -> Self {
        Self::with_core(object_id)
    }

    /// Radius.
    pub const fn radius(&self) -> f32 {
        self.core.attributes.scale.x
    }

    /// Set the radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.core.attributes.scale = Vec3::splat(radius);
        self
    }
}

impl Star {
    /// Unit star at the origin.
    pub fn new(object_id: u32) -> Self {
        Self::with_core(object_id)
    }

    /// Radius.
    pub const fn radius(&self) -> f32 {
        self.core.attributes.scale.x
    }

    /// Set the radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.core.attributes.scale = Vec3::splat(radius);
        self
    }
}

impl BoxShape {
    /// Unit box at the origin.
    pub fn new(object_id: u32) -> Self {
        Self::with_core(object_id)
    }

    /// Full extents.
    pub const fn extents(&self) -> Vec3 {
        self.core.attributes.scale
    }

    /// Set the full extents.
    pub fn with_extents(mut self, extents: Vec3) -> Self {
        self.core.attributes.scale = extents;
        self
    }
}

impl Pose {
    /// Unit axes at the origin.
    pub fn new(object_id: u32) -> Self {
        Self::with_core(object_id)
    }

    /// Axes with the given placement.
    pub fn from_parts(object_id: u32, position: Vec3, scale: Vec3, rotation: Quat) -> Self {
        let mut pose = Self::with_core(object_id);
        pose.core.attributes.position = position;
        pose.core.attributes.scale = scale;
        pose.core.attributes.rotation = rotation;
        pose
    }
}

impl Cone {
    /// 45 degree unit cone along +Z.
    pub fn new(object_id: u32) -> Self {
        let mut cone = Self::with_core(object_id);
        cone.set_angle(DEFAULT_CONE_ANGLE);
        cone
    }

    /// Half angle at the apex in radians.
    pub const fn angle(&self) -> f32 {
        self.core.attributes.scale.x
    }

    /// Set the apex angle in radians.
    pub fn set_angle(&mut self, angle: f32) {
        self.core.attributes.scale.x = angle;
        self.core.attributes.scale.y = angle;
    }

    /// Builder form of [`Self::set_angle`].
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.set_angle(angle);
        self
    }
}

impl Arrow {
    /// Unit arrow along +Z.
    pub fn new(object_id: u32) -> Self {
        let mut arrow = Self::with_core(object_id);
        arrow.set_radius(DEFAULT_ARROW_RADIUS);
        arrow
    }

    /// Arrow from `start` to `end`.
    pub fn from_points(object_id: u32, start: Vec3, end: Vec3) -> Self {
        let mut arrow = Self::new(object_id);
        arrow.core.attributes.position = start;
        arrow.set_direction(end - start);
        arrow.set_length(start.distance(end));
        arrow
    }
}

impl Cylinder {
    /// Unit cylinder along +Z.
    pub fn new(object_id: u32) -> Self {
        Self::with_core(object_id)
    }

    /// Cylinder spanning `start` to `end`.
    pub fn from_points(object_id: u32, start: Vec3, end: Vec3, radius: f32) -> Self {
        let mut shape = Self::new(object_id);
        shape.core.attributes.position = (start + end) * 0.5;
        shape.set_direction(end - start);
        shape.set_length(start.distance(end));
        shape.set_radius(radius);
        shape
    }
}

impl Capsule {
    /// Unit capsule along +Z.
    pub fn new(object_id: u32) -> Self {
        Self::with_core(object_id)
    }

    /// Capsule whose cylindrical body spans `start` to `end`.
    pub fn from_points(object_id: u32, start: Vec3, end: Vec3, radius: f32) -> Self {
        let mut shape = Self::new(object_id);
        shape.core.attributes.position = (start + end) * 0.5;
        shape.set_direction(end - start);
        shape.set_length(start.distance(end));
        shape.set_radius(radius);
        shape
    }
}

impl Plane {
    /// Unit plane facing +Z.
    pub fn new(object_id: u32) -> Self {
        Self::with_core(object_id)
    }

    /// Plane normal.
    pub fn normal(&self) -> Vec3 {
        direction_of(self.core.rotation(), DEFAULT_DIRECTION)
    }

    /// Set the plane normal.
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.core.attributes.rotation = rotation_to(DEFAULT_DIRECTION, normal);
        self
    }

    /// Patch size.
    pub const fn size(&self) -> f32 {
        self.core.attributes.scale.x
    }

    /// Set the patch size.
    pub fn with_size(mut self, size: f32) -> Self {
        self.core.attributes.scale.x = size;
        self.core.attributes.scale.z = size;
        self
    }

    /// Rendered normal length.
    pub const fn normal_length(&self) -> f32 {
        self.core.attributes.scale.y
    }

    /// Set the rendered normal length.
    pub fn with_normal_length(mut self, length: f32) -> Self {
        self.core.attributes.scale.y = length;
        self
    }
}
