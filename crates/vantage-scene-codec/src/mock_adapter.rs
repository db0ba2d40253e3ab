// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock adapter for headless testing of ScenePort implementations.
//!
//! MockAdapter mirrors scene state in maps without any GPU rendering.
//! Use it to verify event sequences and frame semantics.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use vantage_proto::{CameraMessage, CoordinateFrame, ServerInfoMessage, ShapeKind};
use vantage_scene_port::{ApplyError, CategoryState, SceneEvent, ScenePort};
use vantage_shapes::{Renderable, Shape};

/// What the mock keeps of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockShape {
    /// Shape kind, or the batch member kind.
    pub kind: Option<ShapeKind>,
    /// Category.
    pub category: u16,
    /// Position.
    pub position: Vec3,
    /// Resolved mesh references.
    pub resources: usize,
}

impl From<&Shape> for MockShape {
    fn from(shape: &Shape) -> Self {
        Self {
            kind: shape.kind(),
            category: shape.core().category,
            position: shape.core().position(),
            resources: shape.resources().len(),
        }
    }
}

/// Mock scene adapter for testing.
///
/// Implements `ScenePort` by tracking state in maps.
#[derive(Debug, Default)]
pub struct MockAdapter {
    /// Persistent shapes by (routing id, object id).
    pub shapes: HashMap<(u16, u32), MockShape>,
    /// Transient shapes of the current frame.
    pub transients: Vec<MockShape>,
    /// Finalised meshes: resource id to vertex count.
    pub meshes: HashMap<u32, usize>,
    /// Last announced state per category.
    pub categories: BTreeMap<u16, bool>,
    /// Latest server info.
    pub server_info: Option<ServerInfoMessage>,
    /// Latest coordinate frame change.
    pub coordinate_frame: Option<CoordinateFrame>,
    /// Latest view per camera id.
    pub cameras: BTreeMap<u8, CameraMessage>,
    /// Frames ended.
    pub frames: u64,
    /// Number of render calls.
    pub render_count: u32,
    /// Shapes with an active category at the last render.
    pub last_visible: usize,
    /// Number of resets.
    pub resets: u32,
    /// Whether dispose has been called.
    pub disposed: bool,
}

impl MockAdapter {
    /// Create a new mock adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Persistent shape by identity.
    pub fn get_shape(&self, routing_id: u16, object_id: u32) -> Option<&MockShape> {
        self.shapes.get(&(routing_id, object_id))
    }

    /// Persistent plus transient shape count.
    pub fn shape_count(&self) -> usize {
        self.shapes.len() + self.transients.len()
    }

    fn clear(&mut self) {
        self.shapes.clear();
        self.transients.clear();
        self.meshes.clear();
        self.categories.clear();
        self.cameras.clear();
    }
}

impl ScenePort for MockAdapter {
    fn apply_event(&mut self, event: &SceneEvent<'_>) -> Result<(), ApplyError> {
        match *event {
            SceneEvent::ServerInfo(info) => self.server_info = Some(info),
            SceneEvent::ShapeCreated(shape) => {
                if shape.object_id() == 0 {
                    self.transients.push(shape.into());
                } else {
                    self.shapes
                        .insert((shape.routing_id(), shape.object_id()), shape.into());
                }
            }
            SceneEvent::ShapeUpdated(shape) => {
                if shape.object_id() != 0 {
                    let slot = self
                        .shapes
                        .get_mut(&(shape.routing_id(), shape.object_id()))
                        .ok_or_else(|| {
                            ApplyError::Invariant(format!("update for unknown shape {}", shape.object_id()))
                        })?;
                    *slot = shape.into();
                }
            }
            SceneEvent::ShapeDestroyed {
                routing_id,
                object_id,
            } => {
                self.shapes.remove(&(routing_id, object_id)).ok_or_else(|| {
                    ApplyError::Invariant(format!("destroy for unknown shape {object_id}"))
                })?;
            }
            SceneEvent::ResourceFinalised(mesh) => {
                self.meshes.insert(mesh.id(), mesh.vertices().len());
            }
            SceneEvent::ResourceDestroyed(key) => {
                self.meshes.remove(&key.resource_id);
            }
            SceneEvent::CategoryChanged {
                category_id,
                active,
            } => {
                self.categories.insert(category_id, active);
            }
            SceneEvent::CoordinateFrameChanged(frame) => self.coordinate_frame = Some(frame),
            SceneEvent::Camera(camera) => {
                self.cameras.insert(camera.camera_id, camera);
            }
            SceneEvent::FrameEnded { persist, .. } => {
                self.frames += 1;
                if !persist {
                    self.transients.clear();
                }
            }
            SceneEvent::Reset => {
                self.clear();
                self.resets += 1;
            }
        }
        Ok(())
    }

    fn render(&mut self, categories: &CategoryState) {
        self.render_count += 1;
        self.last_visible = self
            .shapes
            .values()
            .chain(self.transients.iter())
            .filter(|s| categories.is_active(s.category))
            .count();
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vantage_proto::{MeshDrawType, ResourceKey};
    use vantage_shapes::{ShapeBuilder, SimpleMesh, Sphere};

    #[test]
    fn tracks_shape_lifecycle() {
        let mut mock = MockAdapter::new();
        let shape = Shape::from(Sphere::new(4).with_category(2));
        mock.apply_event(&SceneEvent::ShapeCreated(&shape)).unwrap();
        let moved = Shape::from(Sphere::new(4).with_category(2).with_position(Vec3::Y));
        mock.apply_event(&SceneEvent::ShapeUpdated(&moved)).unwrap();
        assert_eq!(mock.get_shape(64, 4).unwrap().position, Vec3::Y);

        mock.apply_event(&SceneEvent::ShapeDestroyed {
            routing_id: 64,
            object_id: 4,
        })
        .unwrap();
        assert_eq!(mock.shape_count(), 0);
    }

    #[test]
    fn unknown_targets_are_invariant_violations() {
        let mut mock = MockAdapter::new();
        let shape = Shape::from(Sphere::new(9));
        assert!(matches!(
            mock.apply_event(&SceneEvent::ShapeUpdated(&shape)),
            Err(ApplyError::Invariant(_))
        ));
        assert!(mock
            .apply_event(&SceneEvent::ShapeDestroyed {
                routing_id: 64,
                object_id: 9
            })
            .is_err());
    }

    #[test]
    fn render_respects_categories() {
        let mut mock = MockAdapter::new();
        for (id, category) in [(1, 0), (2, 5), (0, 5)] {
            let shape = Shape::from(Sphere::new(id).with_category(category));
            mock.apply_event(&SceneEvent::ShapeCreated(&shape)).unwrap();
        }
        let mut state = CategoryState::new();
        mock.render(&state);
        assert_eq!(mock.last_visible, 3);
        state.set_active(5, false);
        mock.render(&state);
        assert_eq!(mock.last_visible, 1);
        assert_eq!(mock.render_count, 2);
    }

    #[test]
    fn meshes_and_dispose() {
        let mut mock = MockAdapter::new();
        let mesh = Arc::new(SimpleMesh::new(3, MeshDrawType::Points).with_vertices(vec![Vec3::ZERO; 4]));
        mock.apply_event(&SceneEvent::ResourceFinalised(&*mesh)).unwrap();
        assert_eq!(mock.meshes[&3], 4);
        mock.apply_event(&SceneEvent::ResourceDestroyed(ResourceKey::mesh(3)))
            .unwrap();
        assert!(mock.meshes.is_empty());
        mock.dispose();
        assert!(mock.disposed);
    }
}
