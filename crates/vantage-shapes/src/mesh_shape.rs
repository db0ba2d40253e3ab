// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mesh shape carrying its geometry inline.
//!
//! Create trailer: vertex count u32, index count u32, draw scale f32, draw
//! type u8. Geometry then follows in data messages, each holding one block:
//!
//! ```text
//! object id u32 | send type u16 | offset u32 | count u16 | elements
//! ```
//!
//! Send types run vertices, indices, normals, colours, and a final block with
//! send type `0xFFFF` and no body ends the stream. The caller's progress
//! marker counts elements across all channels.

use glam::Vec3;
use vantage_proto::{
    Colour, MeshDrawType, ObjectFlags, PacketReader, PacketWriter, ProtocolError, ShapeKind,
};

use crate::block::place_block;
use crate::object::ShapeCore;
use crate::renderable::{DataStatus, Renderable};
use crate::transfer::estimate_transfer_count_with_overhead;

/// Data message bytes ahead of the elements: object id, send type, offset, count.
pub const DATA_BLOCK_OVERHEAD: usize = 4 + 2 + 4 + 2;

/// Channel carried by a mesh shape data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SendType {
    /// Vertex positions.
    Vertices = 0,
    /// u32 indices.
    Indices = 1,
    /// Normals; a single element is a uniform normal.
    Normals = 2,
    /// Per-vertex colours.
    Colours = 3,
    /// Terminator.
    End = 0xFFFF,
}

impl SendType {
    const CHANNELS: [Self; 4] = [Self::Vertices, Self::Indices, Self::Normals, Self::Colours];

    /// Decode a raw send type.
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::Vertices),
            1 => Some(Self::Indices),
            2 => Some(Self::Normals),
            3 => Some(Self::Colours),
            0xFFFF => Some(Self::End),
            _ => None,
        }
    }

    const fn element_size(self) -> usize {
        match self {
            Self::Vertices | Self::Normals => 12,
            Self::Indices | Self::Colours | Self::End => 4,
        }
    }
}

/// Mesh geometry sent with the shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshShape {
    core: ShapeCore,
    draw_type: MeshDrawType,
    draw_scale: f32,
    vertex_count: u32,
    index_count: u32,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    normals: Vec<Vec3>,
    colours: Vec<Colour>,
}

impl MeshShape {
    /// Empty mesh of the given topology.
    pub fn new(object_id: u32, draw_type: MeshDrawType) -> Self {
        Self::from_core(
            ShapeCore::new(ShapeKind::MeshShape.routing_id(), object_id),
            draw_type,
        )
    }

    /// Rebuild from a received core; geometry arrives later.
    pub const fn from_core(core: ShapeCore, draw_type: MeshDrawType) -> Self {
        Self {
            core,
            draw_type,
            draw_scale: 0.0,
            vertex_count: 0,
            index_count: 0,
            vertices: Vec::new(),
            indices: Vec::new(),
            normals: Vec::new(),
            colours: Vec::new(),
        }
    }

    /// Set vertex positions.
    pub fn with_vertices(mut self, vertices: Vec<Vec3>) -> Self {
        self.vertex_count = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
        self.vertices = vertices;
        self
    }

    /// Set indices.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.index_count = u32::try_from(indices.len()).unwrap_or(u32::MAX);
        self.indices = indices;
        self
    }

    /// Set per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    /// Use one normal for every vertex.
    pub fn with_uniform_normal(mut self, normal: Vec3) -> Self {
        self.normals = vec![normal];
        self
    }

    /// Set per-vertex colours. Turns off colour by height.
    pub fn with_colours(mut self, colours: Vec<Colour>) -> Self {
        self.colours = colours;
        if self.colour_by_height() {
            self.core.attributes.colour = Colour::WHITE;
        }
        self
    }

    /// Point or line size hint; zero uses the viewer default.
    pub fn with_draw_scale(mut self, scale: f32) -> Self {
        self.draw_scale = scale;
        self
    }

    /// Ask the viewer to compute normals.
    pub fn with_calculate_normals(mut self, on: bool) -> Self {
        self.core.flags = self.core.flags.with(ObjectFlags::USER, on);
        self
    }

    /// Colour point meshes by height; only meaningful for points.
    pub fn with_colour_by_height(mut self, on: bool) -> Self {
        if self.draw_type == MeshDrawType::Points {
            if on {
                self.core.attributes.colour = Colour(0);
            } else if self.core.attributes.colour == Colour(0) {
                self.core.attributes.colour = Colour::WHITE;
            }
        }
        self
    }

    /// Topology.
    pub const fn draw_type(&self) -> MeshDrawType {
        self.draw_type
    }

    /// Point or line size hint.
    pub const fn draw_scale(&self) -> f32 {
        self.draw_scale
    }

    /// Whether the viewer should compute normals.
    pub const fn calculate_normals(&self) -> bool {
        self.core.flags.user()
    }

    /// Point meshes with a zero colour are coloured by height.
    pub fn colour_by_height(&self) -> bool {
        self.draw_type == MeshDrawType::Points && self.core.attributes.colour == Colour(0)
    }

    /// Declared vertex count.
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Declared index count.
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Vertices received or assigned so far.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Normals; one element means a uniform normal.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Per-vertex colours.
    pub fn colours(&self) -> &[Colour] {
        &self.colours
    }

    fn channel_len(&self, send: SendType) -> usize {
        match send {
            SendType::Vertices => self.vertices.len(),
            SendType::Indices => self.indices.len(),
            SendType::Normals => self.normals.len(),
            SendType::Colours => self.colours.len(),
            SendType::End => 0,
        }
    }

    fn channel_limit(&self, send: SendType) -> u32 {
        match send {
            SendType::Indices => self.index_count,
            _ => self.vertex_count,
        }
    }

    fn write_block(
        &self,
        w: &mut PacketWriter,
        send: SendType,
        offset: usize,
    ) -> Result<u32, ProtocolError> {
        let remaining = self.channel_len(send) - offset;
        let budget =
            estimate_transfer_count_with_overhead(send.element_size(), 0, DATA_BLOCK_OVERHEAD);
        let count = u16::try_from(budget.min(remaining))
            .map_err(|_| ProtocolError::InvalidContent("mesh block exceeds u16 count"))?;
        let range = offset..offset + usize::from(count);
        w.write_u16(send as u16)?;
        w.write_u32(
            u32::try_from(offset)
                .map_err(|_| ProtocolError::InvalidContent("mesh offset exceeds u32"))?,
        )?;
        w.write_u16(count)?;
        match send {
            SendType::Vertices => self.vertices[range].iter().try_for_each(|v| w.write_vec3(*v)),
            SendType::Normals => self.normals[range].iter().try_for_each(|n| w.write_vec3(*n)),
            SendType::Indices => self.indices[range].iter().try_for_each(|i| w.write_u32(*i)),
            SendType::Colours => self.colours[range].iter().try_for_each(|c| w.write_u32(c.0)),
            SendType::End => Ok(()),
        }?;
        Ok(u32::from(count))
    }
}

impl Renderable for MeshShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn write_create_extension(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.vertex_count)?;
        w.write_u32(self.index_count)?;
        w.write_f32(self.draw_scale)?;
        w.write_u8(self.draw_type.raw())
    }

    fn read_create_extension(&mut self, r: &mut PacketReader<'_>) -> Result<(), ProtocolError> {
        self.vertex_count = r.read_u32()?;
        self.index_count = r.read_u32()?;
        self.draw_scale = r.read_f32()?;
        let raw = r.read_u8()?;
        self.draw_type = MeshDrawType::from_raw(raw).ok_or(ProtocolError::MeshUnknownDrawType(raw))?;
        Ok(())
    }

    fn is_complex(&self) -> bool {
        true
    }

    fn write_data(&self, w: &mut PacketWriter, progress: &mut u32) -> Result<DataStatus, ProtocolError> {
        self.core.write_data_prefix(w)?;
        let mut base = 0usize;
        let marker = *progress as usize;
        for send in SendType::CHANNELS {
            let len = self.channel_len(send);
            if marker < base + len {
                *progress += self.write_block(w, send, marker - base)?;
                return Ok(DataStatus::More);
            }
            base += len;
        }
        w.write_u16(SendType::End as u16)?;
        Ok(DataStatus::Done)
    }

    fn read_data(&mut self, r: &mut PacketReader<'_>) -> Result<DataStatus, ProtocolError> {
        let raw = r.read_u16()?;
        let send = SendType::from_raw(raw).ok_or(ProtocolError::InvalidContent("unknown mesh send type"))?;
        if send == SendType::End {
            return Ok(DataStatus::Done);
        }
        let offset = r.read_u32()?;
        let count = u32::from(r.read_u16()?);
        let limit = self.channel_limit(send);
        match send {
            SendType::Vertices => {
                place_block(&mut self.vertices, limit, offset, count, || r.read_vec3())
            }
            SendType::Normals => {
                place_block(&mut self.normals, limit, offset, count, || r.read_vec3())
            }
            SendType::Indices => {
                place_block(&mut self.indices, limit, offset, count, || r.read_u32())
            }
            SendType::Colours => {
                place_block(&mut self.colours, limit, offset, count, || r.read_u32().map(Colour))
            }
            SendType::End => Ok(()),
        }?;
        Ok(DataStatus::More)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use vantage_proto::{decode_packet, CreateMessage, DataMessage, WireMessage};

    fn quad() -> MeshShape {
        MeshShape::new(7, MeshDrawType::Triangles)
            .with_vertices(vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE])
            .with_indices(vec![0, 1, 2, 2, 1, 3])
            .with_uniform_normal(Vec3::Z)
    }

    fn relay(sent: &MeshShape) -> MeshShape {
        let mut w = PacketWriter::default();
        sent.write_create(&mut w).unwrap();
        let frame = w.finish();
        let (packet, _) = decode_packet(&frame).unwrap();
        let mut r = packet.reader();
        let create = CreateMessage::read(&mut r).unwrap();
        let mut got = MeshShape::from_core(
            ShapeCore::from_create(packet.routing_id(), &create),
            MeshDrawType::Points,
        );
        got.read_create_extension(&mut r).unwrap();

        let mut progress = 0;
        loop {
            let status = sent.write_data(&mut w, &mut progress).unwrap();
            let frame = w.finish();
            let (packet, _) = decode_packet(&frame).unwrap();
            let mut r = packet.reader();
            assert_eq!(DataMessage::read(&mut r).unwrap().object_id, 7);
            assert_eq!(got.read_data(&mut r).unwrap(), status);
            assert!(r.is_empty());
            if status == DataStatus::Done {
                break;
            }
        }
        got
    }

    #[test]
    fn inline_geometry_round_trips() {
        let sent = quad();
        assert_eq!(relay(&sent), sent);
    }

    #[test]
    fn large_vertex_channel_spans_blocks() {
        let n = 12_000;
        let sent = MeshShape::new(7, MeshDrawType::Points)
            .with_vertices(vec![Vec3::splat(0.5); n])
            .with_colours(vec![Colour::GREEN; n]);
        assert_eq!(relay(&sent), sent);
    }

    #[test]
    fn out_of_range_block_is_rejected() {
        let mut got = MeshShape::new(1, MeshDrawType::Points).with_vertices(vec![Vec3::ZERO]);
        let mut w = PacketWriter::default();
        w.write_u16(SendType::Vertices as u16).unwrap();
        w.write_u32(1).unwrap();
        w.write_u16(1).unwrap();
        w.write_vec3(Vec3::ONE).unwrap();
        let mut r = PacketReader::new(w.payload());
        assert_eq!(
            got.read_data(&mut r),
            Err(ProtocolError::IndexingOutOfRange { offset: 1, count: 1, len: 1 })
        );
    }

    fn vertex_block(offset: u32, count: u16, vertices: &[Vec3]) -> Vec<u8> {
        let mut w = PacketWriter::default();
        w.write_u16(SendType::Vertices as u16).unwrap();
        w.write_u32(offset).unwrap();
        w.write_u16(count).unwrap();
        for v in vertices {
            w.write_vec3(*v).unwrap();
        }
        w.payload().to_vec()
    }

    #[test]
    fn short_block_adds_nothing() {
        let mut got = MeshShape::new(1, MeshDrawType::Points);
        got.vertex_count = 4;

        let short = vertex_block(0, 3, &[Vec3::ONE]);
        assert!(matches!(
            got.read_data(&mut PacketReader::new(&short)),
            Err(ProtocolError::MalformedMessage(_))
        ));
        assert!(got.vertices().is_empty());

        // Nothing was reserved, so the next block still cannot skip ahead.
        let ahead = vertex_block(1, 1, &[Vec3::X]);
        assert!(matches!(
            got.read_data(&mut PacketReader::new(&ahead)),
            Err(ProtocolError::IndexingOutOfRange { offset: 1, .. })
        ));
        let first = vertex_block(0, 1, &[Vec3::X]);
        assert_eq!(
            got.read_data(&mut PacketReader::new(&first)),
            Ok(DataStatus::More)
        );
        assert_eq!(got.vertices(), &[Vec3::X]);
    }

    #[test]
    fn colour_by_height_only_for_points() {
        let points = MeshShape::new(0, MeshDrawType::Points).with_colour_by_height(true);
        assert!(points.colour_by_height());
        let coloured = points.with_colours(vec![Colour::RED]);
        assert!(!coloured.colour_by_height());
        let tris = MeshShape::new(0, MeshDrawType::Triangles).with_colour_by_height(true);
        assert!(!tris.colour_by_height());
    }

    #[test]
    fn empty_mesh_sends_only_the_terminator() {
        let mesh = MeshShape::new(3, MeshDrawType::Lines);
        let mut w = PacketWriter::default();
        let mut progress = 0;
        assert_eq!(mesh.write_data(&mut w, &mut progress).unwrap(), DataStatus::Done);
        assert_eq!(w.payload(), &[3, 0, 0, 0, 0xFF, 0xFF]);
    }
}
