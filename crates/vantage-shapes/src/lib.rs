// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vantage shapes and mesh resources.
//!
//! Shapes implement [`Renderable`] and serialise into a
//! [`vantage_proto::PacketWriter`]. Large shared geometry is described by
//! [`MeshResource`] and streamed one bounded message at a time with
//! [`transfer_mesh`], threading a [`TransferProgress`] between calls.

pub mod block;
pub mod mesh;
pub mod mesh_set;
pub mod mesh_shape;
pub mod multi;
pub mod object;
pub mod orient;
pub mod point_cloud_shape;
pub mod renderable;
pub mod resource;
pub mod shape;
pub mod simple;
pub mod text;
pub mod transfer;

pub use block::place_block;
pub use mesh::{MeshIndices, MeshResource, PlaceholderMesh, PointCloud, SimpleMesh};
pub use mesh_set::{MeshPart, MeshSet};
pub use mesh_shape::MeshShape;
pub use multi::MultiShape;
pub use object::ShapeCore;
pub use point_cloud_shape::PointCloudShape;
pub use renderable::{DataStatus, Renderable, ShapeBuilder};
pub use resource::{unique_keys, MeshHandle, Resource};
pub use shape::Shape;
pub use simple::{Arrow, BoxShape, Capsule, Cone, Cylinder, Plane, Pose, Sphere, Star};
pub use text::{Text2D, Text3D};
pub use transfer::{
    estimate_transfer_count, estimate_transfer_count_with_overhead, next_phase, transfer_mesh,
    TransferPhase, TransferProgress,
};
