// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Events emitted by a stream decoder.

use vantage_proto::{CameraMessage, CoordinateFrame, ResourceKey, ServerInfoMessage, ShapeKind};
use vantage_shapes::{MeshResource, Shape};

/// One change to the visible scene.
///
/// Shapes and meshes are borrowed from the decoder's registry; adapters copy
/// what they keep.
#[derive(Debug, Clone, Copy)]
pub enum SceneEvent<'a> {
    /// Stream-wide timing and axis conventions.
    ServerInfo(ServerInfoMessage),
    /// A shape was created, or replaced when it was persistent.
    ShapeCreated(&'a Shape),
    /// A persistent shape changed attributes or received data.
    ShapeUpdated(&'a Shape),
    /// A persistent shape was destroyed.
    ShapeDestroyed {
        /// Routing id of the shape.
        routing_id: u16,
        /// Object id of the shape.
        object_id: u32,
    },
    /// All components of a mesh resource have arrived.
    ResourceFinalised(&'a dyn MeshResource),
    /// A mesh resource was released.
    ResourceDestroyed(ResourceKey),
    /// A category changed activation state.
    CategoryChanged {
        /// Category id.
        category_id: u16,
        /// New state.
        active: bool,
    },
    /// The sender changed its axis convention.
    CoordinateFrameChanged(CoordinateFrame),
    /// A camera moved or changed projection.
    Camera(CameraMessage),
    /// A frame is complete.
    FrameEnded {
        /// Frame number, counted from zero after the last reset.
        frame: u64,
        /// Transient shapes survive into the next frame.
        persist: bool,
    },
    /// All scene state was dropped.
    Reset,
}

impl SceneEvent<'_> {
    /// Shape kind for shape events.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            Self::ShapeCreated(shape) | Self::ShapeUpdated(shape) => shape.kind(),
            Self::ShapeDestroyed { routing_id, .. } => ShapeKind::from_routing_id(*routing_id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use vantage_shapes::{MultiShape, Sphere, Star};

    #[test]
    fn shape_kind_follows_the_routing_id() {
        let shape = Shape::from(Sphere::new(3));
        assert_eq!(
            SceneEvent::ShapeCreated(&shape).shape_kind(),
            Some(ShapeKind::Sphere)
        );
        let destroyed = SceneEvent::ShapeDestroyed {
            routing_id: ShapeKind::Arrow.routing_id(),
            object_id: 9,
        };
        assert_eq!(destroyed.shape_kind(), Some(ShapeKind::Arrow));
        assert_eq!(SceneEvent::Reset.shape_kind(), None);
    }

    #[test]
    fn batches_report_their_member_kind() {
        let multi = MultiShape::from_shapes(&[Star::new(1), Star::new(1)]).unwrap();
        let shape = Shape::from(multi);
        assert_eq!(
            SceneEvent::ShapeUpdated(&shape).shape_kind(),
            Some(ShapeKind::Star)
        );
    }
}
