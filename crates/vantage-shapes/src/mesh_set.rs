// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A shape built from shared mesh resources, each placed by its own transform.

use std::sync::Arc;

use glam::Mat4;
use vantage_proto::{
    Colour, ObjectAttributes, PacketReader, PacketWriter, ProtocolError, ShapeKind,
};

use crate::mesh::PlaceholderMesh;
use crate::object::ShapeCore;
use crate::renderable::Renderable;
use crate::resource::MeshHandle;

/// One mesh placed within a [`MeshSet`].
#[derive(Debug, Clone)]
pub struct MeshPart {
    /// The mesh, or `None` when not yet resolved.
    pub mesh: Option<MeshHandle>,
    /// Placement relative to the set.
    pub transform: Mat4,
    /// Tint.
    pub colour: Colour,
}

impl MeshPart {
    /// Part placing `mesh` at the identity.
    pub fn new(mesh: MeshHandle) -> Self {
        Self {
            mesh: Some(mesh),
            transform: Mat4::IDENTITY,
            colour: Colour::WHITE,
        }
    }

    /// Resource id written on the wire; zero when unresolved.
    pub fn resource_id(&self) -> u32 {
        self.mesh.as_ref().map_or(0, |m| m.id())
    }
}

/// Collection of mesh parts sharing one pose.
#[derive(Debug, Clone)]
pub struct MeshSet {
    core: ShapeCore,
    parts: Vec<MeshPart>,
}

impl MeshSet {
    /// Empty set at the origin.
    pub fn new(object_id: u32) -> Self {
        Self::from_core(ShapeCore::new(ShapeKind::MeshSet.routing_id(), object_id))
    }

    /// Rebuild from a received core; parts arrive with the create trailer.
    pub const fn from_core(core: ShapeCore) -> Self {
        Self {
            core,
            parts: Vec::new(),
        }
    }

    /// Append a part.
    pub fn with_part(mut self, mesh: MeshHandle, transform: Mat4, colour: Colour) -> Self {
        self.parts.push(MeshPart {
            mesh: Some(mesh),
            transform,
            colour,
        });
        self
    }

    /// Parts in order.
    pub fn parts(&self) -> &[MeshPart] {
        &self.parts
    }

    /// Mutable parts, for resolving placeholders.
    pub fn parts_mut(&mut self) -> &mut [MeshPart] {
        &mut self.parts
    }
}

impl Renderable for MeshSet {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn write_create_extension(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        let count = u16::try_from(self.parts.len())
            .map_err(|_| ProtocolError::InvalidContent("mesh set has more than 65535 parts"))?;
        w.write_u16(count)?;
        for part in &self.parts {
            w.write_u32(part.resource_id())?;
            ObjectAttributes::from_transform(part.transform, part.colour).write(w)?;
        }
        Ok(())
    }

    fn read_create_extension(&mut self, r: &mut PacketReader<'_>) -> Result<(), ProtocolError> {
        let count = r.read_u16()?;
        self.parts.clear();
        for _ in 0..count {
            let id = r.read_u32()?;
            let attributes = ObjectAttributes::read(r)?;
            let mesh = (id != 0).then(|| Arc::new(PlaceholderMesh::new(id)) as MeshHandle);
            self.parts.push(MeshPart {
                mesh,
                transform: attributes.transform(),
                colour: attributes.colour,
            });
        }
        Ok(())
    }

    fn resources(&self) -> Vec<MeshHandle> {
        self.parts
            .iter()
            .filter_map(|p| p.mesh.clone())
            .filter(|m| !m.is_placeholder())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mesh::SimpleMesh;
    use glam::{Quat, Vec3};
    use vantage_proto::{decode_packet, CreateMessage, MeshDrawType, WireMessage};

    #[test]
    fn parts_become_placeholders_on_receipt() {
        let mesh: MeshHandle = Arc::new(SimpleMesh::new(42, MeshDrawType::Triangles));
        let placed = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(0.5),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let set = MeshSet::new(5)
            .with_part(mesh.clone(), placed, Colour::BLUE)
            .with_part(mesh, Mat4::IDENTITY, Colour::WHITE);
        assert_eq!(set.resources().len(), 2);

        let mut w = PacketWriter::default();
        set.write_create(&mut w).unwrap();
        let frame = w.finish();
        let (packet, _) = decode_packet(&frame).unwrap();
        assert_eq!(packet.routing_id(), ShapeKind::MeshSet.routing_id());
        let mut r = packet.reader();
        let create = CreateMessage::read(&mut r).unwrap();
        let mut got = MeshSet::from_core(ShapeCore::from_create(packet.routing_id(), &create));
        got.read_create_extension(&mut r).unwrap();
        assert!(r.is_empty());

        assert_eq!(got.parts().len(), 2);
        let first = &got.parts()[0];
        let mesh = first.mesh.as_ref().unwrap();
        assert!(mesh.is_placeholder());
        assert_eq!(mesh.id(), 42);
        assert_eq!(first.colour, Colour::BLUE);
        assert!(first.transform.abs_diff_eq(placed, 1e-5));
        assert!(got.resources().is_empty());
    }

    #[test]
    fn unresolved_part_writes_zero_id() {
        let mut set = MeshSet::new(1).with_part(
            Arc::new(PlaceholderMesh::new(3)),
            Mat4::IDENTITY,
            Colour::WHITE,
        );
        set.parts_mut()[0].mesh = None;
        let mut w = PacketWriter::default();
        set.write_create_extension(&mut w).unwrap();
        assert_eq!(&w.payload()[..6], &[1, 0, 0, 0, 0, 0]);
    }
}
