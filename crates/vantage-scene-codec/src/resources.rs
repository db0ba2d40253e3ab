// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Receive-side mesh resources.
//!
//! A mesh is declared by a create message, filled by component blocks and
//! closed by a finalise message. Blocks must stay within the declared counts
//! and may not leave gaps, so memory grows only with bytes actually received.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use tracing::debug;
use vantage_proto::{
    routing, Colour, MeshComponentFlags, MeshComponentHeader, MeshCreateMessage, MeshDrawType,
    MeshFinaliseFlags, MeshFinaliseMessage, MeshMessageId, PacketReader, ProtocolError,
    ResourceKey, WireMessage,
};
use vantage_shapes::{place_block, MeshHandle, MeshIndices, MeshResource, Shape};

/// A mesh rebuilt from mesh messages.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMesh {
    id: u32,
    draw_type: MeshDrawType,
    transform: Mat4,
    tint: Colour,
    index_u16: bool,
    vertex_count: u32,
    index_count: u32,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    normals: Vec<Vec3>,
    colours: Vec<Colour>,
    uvs: Vec<Vec2>,
    components: MeshComponentFlags,
    calculate_normals: bool,
}

impl RemoteMesh {
    /// Empty mesh with the declared counts.
    pub fn from_create(msg: &MeshCreateMessage) -> Self {
        Self {
            id: msg.mesh_id,
            draw_type: msg.draw_type,
            transform: msg.attributes.transform(),
            tint: msg.attributes.colour,
            index_u16: msg.flags.index_u16(),
            vertex_count: msg.vertex_count,
            index_count: msg.index_count,
            vertices: Vec::new(),
            indices: Vec::new(),
            normals: Vec::new(),
            colours: Vec::new(),
            uvs: Vec::new(),
            components: MeshComponentFlags::NONE,
            calculate_normals: false,
        }
    }

    /// Apply new counts and pose, keeping data that still fits.
    fn redefine(&mut self, msg: &MeshCreateMessage) {
        let vertices = msg.vertex_count as usize;
        self.draw_type = msg.draw_type;
        self.transform = msg.attributes.transform();
        self.tint = msg.attributes.colour;
        self.index_u16 = msg.flags.index_u16();
        self.vertex_count = msg.vertex_count;
        self.index_count = msg.index_count;
        self.vertices.truncate(vertices);
        self.normals.truncate(vertices);
        self.colours.truncate(vertices);
        self.uvs.truncate(vertices);
        self.indices.truncate(msg.index_count as usize);
        self.calculate_normals = false;
    }

    /// Declared vertex count.
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Declared index count.
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// True when indices travel as u16.
    pub const fn index_u16(&self) -> bool {
        self.index_u16
    }

    /// True when every declared vertex and index has arrived.
    pub fn is_complete(&self) -> bool {
        self.vertices.len() == self.vertex_count as usize
            && self.indices.len() == self.index_count as usize
    }

    fn read_component(
        &mut self,
        kind: MeshMessageId,
        header: &MeshComponentHeader,
        r: &mut PacketReader<'_>,
    ) -> Result<(), ProtocolError> {
        let (offset, count, limit) = (header.offset, u32::from(header.count), self.vertex_count);
        match kind {
            MeshMessageId::Vertex => {
                place_block(&mut self.vertices, limit, offset, count, || r.read_vec3())?;
                self.flag(MeshComponentFlags::VERTEX);
            }
            MeshMessageId::Normal => {
                place_block(&mut self.normals, limit, offset, count, || r.read_vec3())?;
                self.flag(MeshComponentFlags::NORMAL);
            }
            MeshMessageId::VertexColour => {
                place_block(&mut self.colours, limit, offset, count, || r.read_u32().map(Colour))?;
                self.flag(MeshComponentFlags::COLOUR);
            }
            MeshMessageId::Uv => {
                place_block(&mut self.uvs, limit, offset, count, || r.read_vec2())?;
                self.flag(MeshComponentFlags::UV);
            }
            MeshMessageId::Index => {
                let wide = !self.index_u16;
                place_block(&mut self.indices, self.index_count, offset, count, || {
                    if wide {
                        r.read_u32()
                    } else {
                        r.read_u16().map(u32::from)
                    }
                })?;
                self.flag(MeshComponentFlags::INDEX);
            }
            _ => {
                return Err(ProtocolError::InvalidMessageId {
                    routing_id: routing::MESH,
                    message_id: kind.raw(),
                })
            }
        }
        Ok(())
    }

    fn flag(&mut self, mask: u32) {
        self.components = self.components.with(mask, true);
    }
}

impl MeshResource for RemoteMesh {
    fn id(&self) -> u32 {
        self.id
    }

    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn tint(&self) -> Colour {
        self.tint
    }

    fn draw_type(&self) -> MeshDrawType {
        self.draw_type
    }

    fn components(&self) -> MeshComponentFlags {
        self.components
    }

    fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    fn indices(&self) -> MeshIndices<'_> {
        if self.indices.is_empty() {
            MeshIndices::None
        } else {
            MeshIndices::U32(&self.indices)
        }
    }

    fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    fn colours(&self) -> &[Colour] {
        &self.colours
    }

    fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    fn calculate_normals(&self) -> bool {
        self.calculate_normals
    }
}

/// Mesh resources of one connection, keyed by resource id.
///
/// Meshes under construction are owned exclusively; finalised meshes are
/// shared with the shapes that reference them.
#[derive(Debug, Default)]
pub struct ResourceTable {
    pending: HashMap<u32, RemoteMesh>,
    ready: HashMap<u32, Arc<RemoteMesh>>,
}

const fn unknown(mesh_id: u32) -> ProtocolError {
    ProtocolError::InvalidObjectId {
        routing_id: routing::MESH,
        object_id: mesh_id,
    }
}

impl ResourceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a mesh. An existing mesh with the same id is discarded.
    pub fn create(&mut self, msg: &MeshCreateMessage) {
        if self.ready.remove(&msg.mesh_id).is_some() || self.pending.contains_key(&msg.mesh_id) {
            debug!(mesh_id = msg.mesh_id, "mesh re-created; previous data discarded");
        }
        self.pending.insert(msg.mesh_id, RemoteMesh::from_create(msg));
    }

    /// Change counts of a known mesh, reopening it if it was finalised.
    pub fn redefine(&mut self, msg: &MeshCreateMessage) -> Result<(), ProtocolError> {
        let mut mesh = match self.ready.remove(&msg.mesh_id) {
            Some(shared) => Arc::unwrap_or_clone(shared),
            None => self.pending.remove(&msg.mesh_id).ok_or(unknown(msg.mesh_id))?,
        };
        mesh.redefine(msg);
        self.pending.insert(msg.mesh_id, mesh);
        Ok(())
    }

    /// Apply one component block. The reader starts at the block header.
    pub fn component(
        &mut self,
        kind: MeshMessageId,
        r: &mut PacketReader<'_>,
    ) -> Result<u32, ProtocolError> {
        let header = MeshComponentHeader::read(r)?;
        if self.ready.contains_key(&header.mesh_id) {
            return Err(ProtocolError::MeshAlreadyFinalised(header.mesh_id));
        }
        let mesh = self
            .pending
            .get_mut(&header.mesh_id)
            .ok_or(unknown(header.mesh_id))?;
        mesh.read_component(kind, &header, r)?;
        Ok(header.mesh_id)
    }

    /// Close a mesh and share it.
    pub fn finalise(&mut self, msg: &MeshFinaliseMessage) -> Result<&Arc<RemoteMesh>, ProtocolError> {
        if self.ready.contains_key(&msg.mesh_id) {
            return Err(ProtocolError::MeshAlreadyFinalised(msg.mesh_id));
        }
        let mut mesh = self.pending.remove(&msg.mesh_id).ok_or(unknown(msg.mesh_id))?;
        if !mesh.is_complete() {
            debug!(
                mesh_id = msg.mesh_id,
                vertices = mesh.vertices.len(),
                declared = mesh.vertex_count,
                "finalising incomplete mesh"
            );
        }
        mesh.calculate_normals = msg.flags.contains(MeshFinaliseFlags::CALCULATE_NORMALS);
        self.ready.insert(msg.mesh_id, Arc::new(mesh));
        self.ready.get(&msg.mesh_id).ok_or(unknown(msg.mesh_id))
    }

    /// Release a mesh.
    pub fn destroy(&mut self, mesh_id: u32) -> Result<(), ProtocolError> {
        let removed = self.ready.remove(&mesh_id).is_some() || self.pending.remove(&mesh_id).is_some();
        if removed {
            Ok(())
        } else {
            Err(unknown(mesh_id))
        }
    }

    /// Finalised mesh by key.
    pub fn get(&self, key: ResourceKey) -> Option<&Arc<RemoteMesh>> {
        if key.type_id == routing::MESH {
            self.ready.get(&key.resource_id)
        } else {
            None
        }
    }

    /// Mesh still receiving components.
    pub fn pending(&self, mesh_id: u32) -> Option<&RemoteMesh> {
        self.pending.get(&mesh_id)
    }

    /// Finalised mesh as a shareable handle.
    pub fn resolve(&self, key: ResourceKey) -> Option<MeshHandle> {
        self.get(key).map(|mesh| Arc::clone(mesh) as MeshHandle)
    }

    /// Replace placeholder meshes referenced by `shape` with finalised ones.
    ///
    /// Returns the number of references resolved.
    pub fn resolve_shape(&self, shape: &mut Shape) -> usize {
        let lookup = |handle: &MeshHandle| {
            if handle.is_placeholder() {
                self.resolve(ResourceKey::mesh(handle.id()))
            } else {
                None
            }
        };
        let mut resolved = 0;
        match shape {
            Shape::MeshSet(set) => {
                for part in set.parts_mut() {
                    if let Some(mesh) = part.mesh.as_ref().and_then(lookup) {
                        part.mesh = Some(mesh);
                        resolved += 1;
                    }
                }
            }
            Shape::PointCloud(cloud) => {
                if let Some(mesh) = lookup(cloud.cloud()) {
                    cloud.set_cloud(mesh);
                    resolved += 1;
                }
            }
            _ => {}
        }
        resolved
    }

    /// Number of finalised meshes.
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Number of meshes still receiving components.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every mesh.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.ready.clear();
    }
}
