// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mesh resources: shared geometry referenced by mesh sets and point clouds.

use core::fmt;

use glam::{Mat4, Vec2, Vec3};
use vantage_proto::{Colour, MeshComponentFlags, MeshDrawType};

/// Index channel of a mesh. Widths are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshIndices<'a> {
    /// No indices.
    #[default]
    None,
    /// 16-bit indices.
    U16(&'a [u16]),
    /// 32-bit indices.
    U32(&'a [u32]),
}

impl MeshIndices<'_> {
    /// Number of indices.
    pub const fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// True when there are no indices.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes per index on the wire.
    pub const fn element_size(&self) -> usize {
        match self {
            Self::U16(_) => 2,
            Self::None | Self::U32(_) => 4,
        }
    }

    /// Index at `i` widened to u32.
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::None => None,
            Self::U16(v) => v.get(i).map(|&x| u32::from(x)),
            Self::U32(v) => v.get(i).copied(),
        }
    }
}

/// Geometry that can be streamed as a mesh resource.
///
/// A channel is sent only when its [`MeshComponentFlags`] bit is set and it
/// is non-empty.
pub trait MeshResource: fmt::Debug + Send + Sync {
    /// Resource id, unique among meshes.
    fn id(&self) -> u32;

    /// Mesh transform relative to the referencing shape.
    fn transform(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    /// Tint applied to the whole mesh.
    fn tint(&self) -> Colour {
        Colour::WHITE
    }

    /// Topology.
    fn draw_type(&self) -> MeshDrawType;

    /// Channels flagged present.
    fn components(&self) -> MeshComponentFlags;

    /// Vertex positions.
    fn vertices(&self) -> &[Vec3];

    /// Indices.
    fn indices(&self) -> MeshIndices<'_> {
        MeshIndices::None
    }

    /// Per-vertex normals.
    fn normals(&self) -> &[Vec3] {
        &[]
    }

    /// Per-vertex colours.
    fn colours(&self) -> &[Colour] {
        &[]
    }

    /// Per-vertex texture coordinates.
    fn uvs(&self) -> &[Vec2] {
        &[]
    }

    /// Ask the receiver to compute normals when none are sent.
    fn calculate_normals(&self) -> bool {
        false
    }

    /// True for id-only stand-ins that carry no data.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// General purpose mesh owning all of its channels.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleMesh {
    id: u32,
    draw_type: MeshDrawType,
    transform: Mat4,
    tint: Colour,
    components: MeshComponentFlags,
    vertices: Vec<Vec3>,
    indices: SimpleIndices,
    normals: Vec<Vec3>,
    colours: Vec<Colour>,
    uvs: Vec<Vec2>,
    calculate_normals: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimpleIndices {
    None,
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl SimpleMesh {
    /// Empty mesh.
    pub fn new(id: u32, draw_type: MeshDrawType) -> Self {
        Self {
            id,
            draw_type,
            transform: Mat4::IDENTITY,
            tint: Colour::WHITE,
            components: MeshComponentFlags::NONE,
            vertices: Vec::new(),
            indices: SimpleIndices::None,
            normals: Vec::new(),
            colours: Vec::new(),
            uvs: Vec::new(),
            calculate_normals: false,
        }
    }

    fn flag(&mut self, mask: u32) {
        self.components = self.components.with(mask, true);
    }

    /// Set vertex positions.
    pub fn with_vertices(mut self, vertices: Vec<Vec3>) -> Self {
        self.vertices = vertices;
        self.flag(MeshComponentFlags::VERTEX);
        self
    }

    /// Set 32-bit indices, replacing any 16-bit ones.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = SimpleIndices::U32(indices);
        self.flag(MeshComponentFlags::INDEX);
        self
    }

    /// Set 16-bit indices, replacing any 32-bit ones.
    pub fn with_indices_u16(mut self, indices: Vec<u16>) -> Self {
        self.indices = SimpleIndices::U16(indices);
        self.flag(MeshComponentFlags::INDEX);
        self
    }

    /// Set normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self.flag(MeshComponentFlags::NORMAL);
        self
    }

    /// Set per-vertex colours.
    pub fn with_colours(mut self, colours: Vec<Colour>) -> Self {
        self.colours = colours;
        self.flag(MeshComponentFlags::COLOUR);
        self
    }

    /// Set texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self.flag(MeshComponentFlags::UV);
        self
    }

    /// Set the mesh transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Set the tint.
    pub fn with_tint(mut self, tint: Colour) -> Self {
        self.tint = tint;
        self
    }

    /// Request receiver-side normals.
    pub fn with_calculate_normals(mut self, on: bool) -> Self {
        self.calculate_normals = on;
        self
    }

    /// Restrict the channels that will be sent.
    pub fn with_components(mut self, components: MeshComponentFlags) -> Self {
        self.components = components;
        self
    }
}

impl MeshResource for SimpleMesh {
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
        match &self.indices {
            SimpleIndices::None => MeshIndices::None,
            SimpleIndices::U16(v) => MeshIndices::U16(v),
            SimpleIndices::U32(v) => MeshIndices::U32(v),
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

/// Point set with optional normals and colours, drawn as points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    id: u32,
    points: Vec<Vec3>,
    normals: Vec<Vec3>,
    colours: Vec<Colour>,
}

impl PointCloud {
    /// Cloud over `points`.
    pub const fn new(id: u32, points: Vec<Vec3>) -> Self {
        Self {
            id,
            points,
            normals: Vec::new(),
            colours: Vec::new(),
        }
    }

    /// Attach per-point normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    /// Attach per-point colours.
    pub fn with_colours(mut self, colours: Vec<Colour>) -> Self {
        self.colours = colours;
        self
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the cloud is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl MeshResource for PointCloud {
    fn id(&self) -> u32 {
        self.id
    }

    fn draw_type(&self) -> MeshDrawType {
        MeshDrawType::Points
    }

    fn components(&self) -> MeshComponentFlags {
        MeshComponentFlags::NONE
            .with(MeshComponentFlags::VERTEX, true)
            .with(MeshComponentFlags::NORMAL, !self.normals.is_empty())
            .with(MeshComponentFlags::COLOUR, !self.colours.is_empty())
    }

    fn vertices(&self) -> &[Vec3] {
        &self.points
    }

    fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    fn colours(&self) -> &[Colour] {
        &self.colours
    }
}

/// Stand-in for a mesh known only by id, as reconstructed on the receive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderMesh {
    id: u32,
}

impl PlaceholderMesh {
    /// Placeholder for mesh `id`.
    pub const fn new(id: u32) -> Self {
        Self { id }
    }
}

impl MeshResource for PlaceholderMesh {
    fn id(&self) -> u32 {
        self.id
    }

    fn draw_type(&self) -> MeshDrawType {
        MeshDrawType::Points
    }

    fn components(&self) -> MeshComponentFlags {
        MeshComponentFlags::NONE
    }

    fn vertices(&self) -> &[Vec3] {
        &[]
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}
