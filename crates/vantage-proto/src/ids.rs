// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Routing ids and per-handler message ids.

/// Well-known routing ids.
///
/// Ids below [`routing::SHAPE_IDS_START`] address protocol handlers, the
/// range up to [`routing::USER_ID_START`] is reserved for built-in shapes and
/// anything above is free for user handlers.
pub mod routing {
    /// Unassigned.
    pub const NULL: u16 = 0;
    /// Server information.
    pub const SERVER_INFO: u16 = 1;
    /// Frame and stream control.
    pub const CONTROL: u16 = 2;
    /// Several frames carried in one packet.
    pub const COLLATED_PACKET: u16 = 3;
    /// Mesh resources.
    pub const MESH: u16 = 4;
    /// Camera views.
    pub const CAMERA: u16 = 5;
    /// Category names and activation.
    pub const CATEGORY: u16 = 6;
    /// Materials (reserved).
    pub const MATERIAL: u16 = 7;
    /// First shape routing id.
    pub const SHAPE_IDS_START: u16 = 64;
    /// First user-defined routing id.
    pub const USER_ID_START: u16 = 2048;
}

/// Built-in shape kinds, each owning one routing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum ShapeKind {
    /// Sphere.
    Sphere = routing::SHAPE_IDS_START,
    /// Axis-aligned box before rotation.
    Box,
    /// Cone.
    Cone,
    /// Cylinder.
    Cylinder,
    /// Capsule.
    Capsule,
    /// Plane with a normal indicator.
    Plane,
    /// Star marker.
    Star,
    /// Arrow.
    Arrow,
    /// Mesh carrying its geometry inline.
    MeshShape,
    /// Collection of mesh resources.
    MeshSet,
    /// Indexed view onto a point cloud resource.
    PointCloud,
    /// Text placed in the world.
    Text3D,
    /// Text placed on screen.
    Text2D,
    /// Coordinate axes marker.
    Pose,
}

impl ShapeKind {
    /// Every built-in kind in routing id order.
    pub const ALL: [Self; 14] = [
        Self::Sphere,
        Self::Box,
        Self::Cone,
        Self::Cylinder,
        Self::Capsule,
        Self::Plane,
        Self::Star,
        Self::Arrow,
        Self::MeshShape,
        Self::MeshSet,
        Self::PointCloud,
        Self::Text3D,
        Self::Text2D,
        Self::Pose,
    ];

    /// Routing id for this kind.
    #[inline]
    pub const fn routing_id(self) -> u16 {
        self as u16
    }

    /// Look up a kind by routing id.
    pub fn from_routing_id(id: u16) -> Option<Self> {
        let index = usize::from(id.checked_sub(routing::SHAPE_IDS_START)?);
        Self::ALL.get(index).copied()
    }

    /// Lower-case name used in logs and reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Box => "box",
            Self::Cone => "cone",
            Self::Cylinder => "cylinder",
            Self::Capsule => "capsule",
            Self::Plane => "plane",
            Self::Star => "star",
            Self::Arrow => "arrow",
            Self::MeshShape => "mesh",
            Self::MeshSet => "mesh-set",
            Self::PointCloud => "point-cloud",
            Self::Text3D => "text3d",
            Self::Text2D => "text2d",
            Self::Pose => "pose",
        }
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Decode a raw wire value.
            pub const fn from_raw(raw: $repr) -> Option<Self> {
                match raw {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Raw wire value.
            #[inline]
            pub const fn raw(self) -> $repr {
                self as $repr
            }
        }
    };
}

wire_enum! {
    /// Message ids understood by every shape handler.
    ObjectMessageId: u16 {
        /// Create a shape.
        Create = 1,
        /// Update a persistent shape.
        Update = 2,
        /// Destroy a persistent shape.
        Destroy = 3,
        /// Additional shape data.
        Data = 4,
    }
}

wire_enum! {
    /// Message ids on the control routing id.
    ControlId: u16 {
        /// End of frame. `value32` carries the frame time; flag bit 0 persists transients.
        EndFrame = 1,
        /// Coordinate frame change. `value32` carries the [`CoordinateFrame`].
        CoordinateFrame = 2,
        /// Total frame count of a recording. `value32` carries the count.
        FrameCount = 3,
        /// Flush the current frame without advancing the frame number.
        ForceFrameFlush = 4,
        /// Drop all scene state.
        Reset = 5,
        /// Keyframe marker. `value32` carries the frame number.
        Keyframe = 6,
        /// End of stream.
        End = 7,
    }
}

wire_enum! {
    /// Message ids on the category routing id.
    CategoryMessageId: u16 {
        /// Category name and hierarchy.
        Name = 0,
        /// Category activation change.
        Active = 1,
    }
}

wire_enum! {
    /// Message ids on the mesh routing id.
    MeshMessageId: u16 {
        /// Destroy a mesh resource.
        Destroy = 1,
        /// Create a mesh resource.
        Create = 2,
        /// Vertex block.
        Vertex = 3,
        /// Index block.
        Index = 4,
        /// Per-vertex colour block.
        VertexColour = 5,
        /// Normal block.
        Normal = 6,
        /// UV block.
        Uv = 7,
        /// Re-create a mesh with new counts, keeping existing data.
        Redefine = 9,
        /// Mesh complete.
        Finalise = 10,
    }
}

wire_enum! {
    /// Topology used to draw a mesh.
    MeshDrawType: u8 {
        /// One point per vertex or index.
        Points = 0,
        /// Pairs of vertices form lines.
        Lines = 1,
        /// Triples of vertices form triangles.
        Triangles = 2,
        /// One voxel per vertex.
        Voxels = 3,
    }
}

wire_enum! {
    /// Axis convention of the sending application, named right, forward, up.
    CoordinateFrame: u8 {
        /// Right X, forward Y, up Z.
        Xyz = 0,
        /// Right X, forward Z, up -Y.
        XzNegY = 1,
        /// Right Y, forward X, up -Z.
        YxNegZ = 2,
        /// Right Y, forward Z, up X.
        Yzx = 3,
        /// Right Z, forward X, up Y.
        Zxy = 4,
        /// Right Z, forward Y, up -X.
        ZyNegX = 5,
        /// Right X, forward Y, up -Z.
        XyNegZ = 6,
        /// Right X, forward Z, up Y.
        Xzy = 7,
        /// Right Y, forward X, up Z.
        Yxz = 8,
        /// Right Y, forward Z, up -X.
        YzNegX = 9,
        /// Right Z, forward X, up -Y.
        ZxNegY = 10,
        /// Right Z, forward Y, up X.
        Zyx = 11,
    }
}

impl CoordinateFrame {
    /// True for left-handed frames.
    pub const fn is_left_handed(self) -> bool {
        self.raw() >= Self::XyNegZ.raw()
    }
}

/// Identifies a shared resource: the owning handler plus its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    /// Routing id of the owning handler.
    pub type_id: u16,
    /// Resource id within the handler.
    pub resource_id: u32,
}

impl ResourceKey {
    /// Key for a mesh resource.
    pub const fn mesh(resource_id: u32) -> Self {
        Self {
            type_id: routing::MESH,
            resource_id,
        }
    }
}
