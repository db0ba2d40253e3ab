// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closed set of shape kinds.

use std::sync::Arc;

use vantage_proto::{
    CreateMessage, MeshDrawType, PacketReader, PacketWriter, ProtocolError, ShapeKind,
    UpdateMessage, WireMessage,
};

use crate::mesh::PlaceholderMesh;
use crate::mesh_set::MeshSet;
use crate::mesh_shape::MeshShape;
use crate::multi::MultiShape;
use crate::object::ShapeCore;
use crate::point_cloud_shape::PointCloudShape;
use crate::renderable::{DataStatus, Renderable};
use crate::resource::MeshHandle;
use crate::simple::{Arrow, BoxShape, Capsule, Cone, Cylinder, Plane, Pose, Sphere, Star};
use crate::text::{Text2D, Text3D};

/// Any built-in shape.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Sphere.
    Sphere(Sphere),
    /// Box.
    Box(BoxShape),
    /// Cone.
    Cone(Cone),
    /// Cylinder.
    Cylinder(Cylinder),
    /// Capsule.
    Capsule(Capsule),
    /// Plane.
    Plane(Plane),
    /// Star.
    Star(Star),
    /// Arrow.
    Arrow(Arrow),
    /// Pose axes.
    Pose(Pose),
    /// Inline mesh.
    Mesh(MeshShape),
    /// Mesh set.
    MeshSet(MeshSet),
    /// Point cloud view.
    PointCloud(PointCloudShape),
    /// World text.
    Text3D(Text3D),
    /// Screen text.
    Text2D(Text2D),
    /// Batch of one of the above.
    Multi(MultiShape),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Sphere($s) => $body,
            Shape::Box($s) => $body,
            Shape::Cone($s) => $body,
            Shape::Cylinder($s) => $body,
            Shape::Capsule($s) => $body,
            Shape::Plane($s) => $body,
            Shape::Star($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Pose($s) => $body,
            Shape::Mesh($s) => $body,
            Shape::MeshSet($s) => $body,
            Shape::PointCloud($s) => $body,
            Shape::Text3D($s) => $body,
            Shape::Text2D($s) => $body,
            Shape::Multi($s) => $body,
        }
    };
}

impl Shape {
    /// Reconstruct a shape from a create packet payload on `routing_id`.
    ///
    /// Reads the create message and any trailing data. Unknown routing ids
    /// report [`ProtocolError::UnknownMessageHandler`].
    pub fn read_create(routing_id: u16, r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let kind = ShapeKind::from_routing_id(routing_id)
            .ok_or(ProtocolError::UnknownMessageHandler(routing_id))?;
        let msg = CreateMessage::read(r)?;
        let core = ShapeCore::from_create(routing_id, &msg);
        let mut shape = if msg.flags.multi_shape() {
            Self::Multi(MultiShape::from_core(core))
        } else {
            Self::empty(kind, core)
        };
        shape.read_create_extension(r)?;
        Ok(shape)
    }

    fn empty(kind: ShapeKind, core: ShapeCore) -> Self {
        let placeholder = || Arc::new(PlaceholderMesh::new(0)) as MeshHandle;
        match kind {
            ShapeKind::Sphere => Self::Sphere(Sphere::from_core(core)),
            ShapeKind::Box => Self::Box(BoxShape::from_core(core)),
            ShapeKind::Cone => Self::Cone(Cone::from_core(core)),
            ShapeKind::Cylinder => Self::Cylinder(Cylinder::from_core(core)),
            ShapeKind::Capsule => Self::Capsule(Capsule::from_core(core)),
            ShapeKind::Plane => Self::Plane(Plane::from_core(core)),
            ShapeKind::Star => Self::Star(Star::from_core(core)),
            ShapeKind::Arrow => Self::Arrow(Arrow::from_core(core)),
            ShapeKind::Pose => Self::Pose(Pose::from_core(core)),
            ShapeKind::MeshShape => Self::Mesh(MeshShape::from_core(core, MeshDrawType::Points)),
            ShapeKind::MeshSet => Self::MeshSet(MeshSet::from_core(core)),
            ShapeKind::PointCloud => {
                Self::PointCloud(PointCloudShape::from_core(core, placeholder()))
            }
            ShapeKind::Text3D => Self::Text3D(Text3D::from_core(core)),
            ShapeKind::Text2D => Self::Text2D(Text2D::from_core(core)),
        }
    }

    /// Kind of shape, or of the batch members.
    pub fn kind(&self) -> Option<ShapeKind> {
        ShapeKind::from_routing_id(self.core().routing_id())
    }

    /// Object id.
    pub fn object_id(&self) -> u32 {
        self.core().object_id
    }

    /// Routing id.
    pub fn routing_id(&self) -> u16 {
        self.core().routing_id()
    }

    /// Borrow as the capability trait.
    pub fn as_renderable(&self) -> &dyn Renderable {
        dispatch!(self, s => s)
    }
}

impl Renderable for Shape {
    fn core(&self) -> &ShapeCore {
        dispatch!(self, s => s.core())
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        dispatch!(self, s => s.core_mut())
    }

    fn write_create_extension(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        dispatch!(self, s => s.write_create_extension(w))
    }

    fn read_create_extension(&mut self, r: &mut PacketReader<'_>) -> Result<(), ProtocolError> {
        dispatch!(self, s => s.read_create_extension(r))
    }

    fn write_create(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        dispatch!(self, s => s.write_create(w))
    }

    fn write_update(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        dispatch!(self, s => s.write_update(w))
    }

    fn write_destroy(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        dispatch!(self, s => s.write_destroy(w))
    }

    fn is_complex(&self) -> bool {
        dispatch!(self, s => s.is_complex())
    }

    fn write_data(&self, w: &mut PacketWriter, progress: &mut u32) -> Result<DataStatus, ProtocolError> {
        dispatch!(self, s => s.write_data(w, progress))
    }

    fn read_data(&mut self, r: &mut PacketReader<'_>) -> Result<DataStatus, ProtocolError> {
        dispatch!(self, s => s.read_data(r))
    }

    fn resources(&self) -> Vec<MeshHandle> {
        dispatch!(self, s => s.resources())
    }

    fn apply_update(&mut self, msg: &UpdateMessage) {
        dispatch!(self, s => s.apply_update(msg));
    }
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Shape {
                fn from(shape: $ty) -> Self {
                    Self::$variant(shape)
                }
            }
        )*
    };
}

impl_from!(
    Sphere(Sphere),
    Box(BoxShape),
    Cone(Cone),
    Cylinder(Cylinder),
    Capsule(Capsule),
    Plane(Plane),
    Star(Star),
    Arrow(Arrow),
    Pose(Pose),
    Mesh(MeshShape),
    MeshSet(MeshSet),
    PointCloud(PointCloudShape),
    Text3D(Text3D),
    Text2D(Text2D),
    Multi(MultiShape),
);
