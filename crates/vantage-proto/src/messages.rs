// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Message bodies carried in packet payloads.
//!
//! Attribute block (44 bytes, shared by create, update and mesh create):
//! ```text
//! offset size  field
//! 0      12    position = 3 × f32
//! 12     16    rotation = 4 × f32 (x, y, z, w)
//! 28     12    scale = 3 × f32
//! 40     4     colour = u32 (0xRRGGBBAA)
//! ```
//!
//! Create: object_id u32, category u16, flags u16, attribute block.
//! Update: object_id u32, flags u16, attribute block.
//! Destroy: object_id u32. Data: object_id u32 then shape specific bytes.
//!
//! Camera (48 bytes): camera_id u8, 3 reserved zero bytes, position, forward
//! and up as 3 × f32 each, then near, far and horizontal fov (degrees) as f32.
//!
//! Collated packet (8 bytes, then the nested frames): flags u16, reserved u16,
//! byte length of the nested frames u32.

use glam::{Mat4, Quat, Vec3};

use crate::error::ProtocolError;
use crate::flags::{CollatedPacketFlags, MeshCreateFlags, MeshFinaliseFlags, ObjectFlags};
use crate::ids::{CoordinateFrame, MeshDrawType};
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// Encoded size of [`ObjectAttributes`].
pub const ATTRIBUTES_SIZE: usize = 44;

/// Encoded size of [`CreateMessage`].
pub const CREATE_MESSAGE_SIZE: usize = 8 + ATTRIBUTES_SIZE;

/// Encoded size of [`MeshComponentHeader`].
pub const MESH_COMPONENT_HEADER_SIZE: usize = 10;

/// Reserved tail of the server info message.
pub const SERVER_INFO_RESERVED: usize = 31;

/// Encoded size of [`CameraMessage`].
pub const CAMERA_MESSAGE_SIZE: usize = 48;

/// Encoded size of [`CollatedPacketMessage`].
pub const COLLATED_MESSAGE_SIZE: usize = 8;

/// A message body with a fixed wire layout.
pub trait WireMessage: Sized {
    /// Append the body to the open packet.
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError>;
    /// Parse the body from a payload cursor.
    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError>;
}

/// Packed colour, `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour(pub u32);

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Colour {
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque black.
    pub const BLACK: Self = Self(0x0000_00FF);
    /// Opaque red.
    pub const RED: Self = Self(0xFF00_00FF);
    /// Opaque green.
    pub const GREEN: Self = Self(0x00FF_00FF);
    /// Opaque blue.
    pub const BLUE: Self = Self(0x0000_FFFF);
    /// Opaque yellow.
    pub const YELLOW: Self = Self(0xFFFF_00FF);

    /// Pack channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    /// Red channel.
    pub const fn r(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Green channel.
    pub const fn g(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// Blue channel.
    pub const fn b(self) -> u8 {
        self.0.to_be_bytes()[2]
    }

    /// Alpha channel.
    pub const fn a(self) -> u8 {
        self.0.to_be_bytes()[3]
    }
}

/// Pose and colour shared by every shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectAttributes {
    /// World position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Per-axis scale. Shapes reinterpret this as radius, length and so on.
    pub scale: Vec3,
    /// Colour.
    pub colour: Colour,
}

impl Default for ObjectAttributes {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            colour: Colour::WHITE,
        }
    }
}

impl ObjectAttributes {
    /// Decompose an affine transform into position, rotation and scale.
    pub fn from_transform(transform: Mat4, colour: Colour) -> Self {
        let (scale, rotation, position) = transform.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
            colour,
        }
    }

    /// Recompose into a transform.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Append the 44-byte block.
    pub fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        if w.remaining() < ATTRIBUTES_SIZE {
            return Err(ProtocolError::PacketOverflow {
                needed: ATTRIBUTES_SIZE,
                available: w.remaining(),
            });
        }
        w.write_vec3(self.position)?;
        w.write_quat(self.rotation)?;
        w.write_vec3(self.scale)?;
        w.write_u32(self.colour.0)
    }

    /// Parse the 44-byte block.
    pub fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        if r.remaining() < ATTRIBUTES_SIZE {
            return Err(ProtocolError::MalformedMessage("attribute block ends early"));
        }
        Ok(Self {
            position: r.read_vec3()?,
            rotation: r.read_quat()?,
            scale: r.read_vec3()?,
            colour: Colour(r.read_u32()?),
        })
    }

    /// Copy only the attribute groups selected in an update's flags.
    ///
    /// Without [`ObjectFlags::UPDATE_MODE`] the whole block is replaced.
    pub fn apply_update(&mut self, flags: ObjectFlags, update: &Self) {
        if !flags.partial_update() {
            *self = *update;
            return;
        }
        if flags.contains(ObjectFlags::POSITION) {
            self.position = update.position;
        }
        if flags.contains(ObjectFlags::ROTATION) {
            self.rotation = update.rotation;
        }
        if flags.contains(ObjectFlags::SCALE) {
            self.scale = update.scale;
        }
        if flags.contains(ObjectFlags::COLOUR) {
            self.colour = update.colour;
        }
    }
}

fn reject_double_precision(flags: ObjectFlags) -> Result<(), ProtocolError> {
    if flags.contains(ObjectFlags::DOUBLE_PRECISION) {
        return Err(ProtocolError::InvalidContent(
            "double precision attributes are not supported",
        ));
    }
    Ok(())
}

/// Shape creation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CreateMessage {
    /// Object id; zero makes the shape transient.
    pub object_id: u32,
    /// Category the shape belongs to.
    pub category: u16,
    /// Object flags.
    pub flags: ObjectFlags,
    /// Initial pose and colour.
    pub attributes: ObjectAttributes,
}

impl WireMessage for CreateMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        if w.remaining() < CREATE_MESSAGE_SIZE {
            return Err(ProtocolError::PacketOverflow {
                needed: CREATE_MESSAGE_SIZE,
                available: w.remaining(),
            });
        }
        w.write_u32(self.object_id)?;
        w.write_u16(self.category)?;
        w.write_u16(self.flags.bits())?;
        self.attributes.write(w)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let object_id = r.read_u32()?;
        let category = r.read_u16()?;
        let flags = ObjectFlags::from_bits(r.read_u16()?);
        reject_double_precision(flags)?;
        let attributes = ObjectAttributes::read(r)?;
        Ok(Self {
            object_id,
            category,
            flags,
            attributes,
        })
    }
}

/// Attribute change for a persistent shape.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UpdateMessage {
    /// Target object id.
    pub object_id: u32,
    /// Object flags, including the partial update selectors.
    pub flags: ObjectFlags,
    /// New attributes.
    pub attributes: ObjectAttributes,
}

impl WireMessage for UpdateMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.object_id)?;
        w.write_u16(self.flags.bits())?;
        self.attributes.write(w)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let object_id = r.read_u32()?;
        let flags = ObjectFlags::from_bits(r.read_u16()?);
        reject_double_precision(flags)?;
        Ok(Self {
            object_id,
            flags,
            attributes: ObjectAttributes::read(r)?,
        })
    }
}

/// Shape destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestroyMessage {
    /// Target object id.
    pub object_id: u32,
}

impl WireMessage for DestroyMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.object_id)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            object_id: r.read_u32()?,
        })
    }
}

/// Prefix of a shape data message; the rest is shape specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataMessage {
    /// Target object id.
    pub object_id: u32,
}

impl WireMessage for DataMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.object_id)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            object_id: r.read_u32()?,
        })
    }
}

/// Control message body. Meaning of the values depends on the control id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlMessage {
    /// Control specific flags.
    pub control_flags: u32,
    /// 32-bit argument.
    pub value32: u32,
    /// 64-bit argument.
    pub value64: u64,
}

impl WireMessage for ControlMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.control_flags)?;
        w.write_u32(self.value32)?;
        w.write_u64(self.value64)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            control_flags: r.read_u32()?,
            value32: r.read_u32()?,
            value64: r.read_u64()?,
        })
    }
}

/// Names a category and places it in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryNameMessage {
    /// Category id.
    pub category_id: u16,
    /// Parent category id; zero is the root.
    pub parent_id: u16,
    /// Initial activation state.
    pub default_active: bool,
    /// Display name.
    pub name: String,
}

impl WireMessage for CategoryNameMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u16(self.category_id)?;
        w.write_u16(self.parent_id)?;
        w.write_u16(u16::from(self.default_active))?;
        w.write_str(&self.name)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            category_id: r.read_u16()?,
            parent_id: r.read_u16()?,
            default_active: r.read_u16()? != 0,
            name: r.read_str()?.to_owned(),
        })
    }
}

/// Activates or deactivates a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryActiveMessage {
    /// Category id.
    pub category_id: u16,
    /// New state.
    pub active: bool,
}

impl WireMessage for CategoryActiveMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u16(self.category_id)?;
        w.write_u8(u8::from(self.active))
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            category_id: r.read_u16()?,
            active: r.read_u8()? != 0,
        })
    }
}

/// Stream-wide timing and axis conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfoMessage {
    /// Microseconds per time unit.
    pub time_unit: u64,
    /// Frame time in time units used when a frame carries none.
    pub default_frame_time: u32,
    /// Axis convention.
    pub coordinate_frame: CoordinateFrame,
}

impl Default for ServerInfoMessage {
    fn default() -> Self {
        Self {
            time_unit: 1000,
            default_frame_time: 33,
            coordinate_frame: CoordinateFrame::Xyz,
        }
    }
}

impl WireMessage for ServerInfoMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u64(self.time_unit)?;
        w.write_u32(self.default_frame_time)?;
        w.write_u8(self.coordinate_frame.raw())?;
        w.write_bytes(&[0u8; SERVER_INFO_RESERVED])
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let time_unit = r.read_u64()?;
        let default_frame_time = r.read_u32()?;
        let coordinate_frame = CoordinateFrame::from_raw(r.read_u8()?)
            .ok_or(ProtocolError::InvalidContent("unknown coordinate frame"))?;
        r.read_bytes(SERVER_INFO_RESERVED)?;
        Ok(Self {
            time_unit,
            default_frame_time,
            coordinate_frame,
        })
    }
}

/// Declares a mesh resource and its channel sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshCreateMessage {
    /// Resource id.
    pub mesh_id: u32,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Number of indices.
    pub index_count: u32,
    /// Mesh flags.
    pub flags: MeshCreateFlags,
    /// Topology.
    pub draw_type: MeshDrawType,
    /// Mesh transform and tint.
    pub attributes: ObjectAttributes,
}

impl WireMessage for MeshCreateMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.mesh_id)?;
        w.write_u32(self.vertex_count)?;
        w.write_u32(self.index_count)?;
        w.write_u16(self.flags.bits())?;
        w.write_u8(self.draw_type.raw())?;
        self.attributes.write(w)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let mesh_id = r.read_u32()?;
        let vertex_count = r.read_u32()?;
        let index_count = r.read_u32()?;
        let flags = MeshCreateFlags::from_bits(r.read_u16()?);
        if flags.contains(MeshCreateFlags::DOUBLE_PRECISION) {
            return Err(ProtocolError::InvalidContent(
                "double precision meshes are not supported",
            ));
        }
        let raw_draw = r.read_u8()?;
        let draw_type =
            MeshDrawType::from_raw(raw_draw).ok_or(ProtocolError::MeshUnknownDrawType(raw_draw))?;
        Ok(Self {
            mesh_id,
            vertex_count,
            index_count,
            flags,
            draw_type,
            attributes: ObjectAttributes::read(r)?,
        })
    }
}

/// Prefix of a mesh vertex, index, normal, colour or UV block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshComponentHeader {
    /// Resource id.
    pub mesh_id: u32,
    /// First element in this block.
    pub offset: u32,
    /// Elements in this block.
    pub count: u16,
}

impl WireMessage for MeshComponentHeader {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.mesh_id)?;
        w.write_u32(self.offset)?;
        w.write_u16(self.count)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            mesh_id: r.read_u32()?,
            offset: r.read_u32()?,
            count: r.read_u16()?,
        })
    }
}

/// Closes a mesh resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshFinaliseMessage {
    /// Resource id.
    pub mesh_id: u32,
    /// Finalise flags.
    pub flags: MeshFinaliseFlags,
}

impl WireMessage for MeshFinaliseMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.mesh_id)?;
        w.write_u32(self.flags.bits())
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            mesh_id: r.read_u32()?,
            flags: MeshFinaliseFlags::from_bits(r.read_u32()?),
        })
    }
}

/// Releases a mesh resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshDestroyMessage {
    /// Resource id.
    pub mesh_id: u32,
}

impl WireMessage for MeshDestroyMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.mesh_id)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            mesh_id: r.read_u32()?,
        })
    }
}

/// View and projection of one camera.
///
/// Near, far and fov of zero or less leave the receiver's value unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraMessage {
    /// Camera id. [`CameraMessage::RECORDED`] is the view used while recording.
    pub camera_id: u8,
    /// Eye position.
    pub position: Vec3,
    /// Forward vector.
    pub direction: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Horizontal field of view in degrees.
    pub fov: f32,
}

impl CameraMessage {
    /// Camera id reserved for the recording view.
    pub const RECORDED: u8 = 255;
}

impl WireMessage for CameraMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u8(self.camera_id)?;
        w.write_u8(0)?;
        w.write_u16(0)?;
        w.write_vec3(self.position)?;
        w.write_vec3(self.direction)?;
        w.write_vec3(self.up)?;
        w.write_f32(self.near)?;
        w.write_f32(self.far)?;
        w.write_f32(self.fov)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let camera_id = r.read_u8()?;
        r.read_bytes(3)?;
        Ok(Self {
            camera_id,
            position: r.read_vec3()?,
            direction: r.read_vec3()?,
            up: r.read_vec3()?,
            near: r.read_f32()?,
            far: r.read_f32()?,
            fov: r.read_f32()?,
        })
    }
}

/// Prefix of a collated packet; complete frames follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollatedPacketMessage {
    /// Collation flags.
    pub flags: CollatedPacketFlags,
    /// Bytes of nested frames before any compression.
    pub uncompressed_bytes: u32,
}

impl WireMessage for CollatedPacketMessage {
    fn write(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u16(self.flags.bits())?;
        w.write_u16(0)?;
        w.write_u32(self.uncompressed_bytes)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let flags = CollatedPacketFlags::from_bits(r.read_u16()?);
        r.read_u16()?;
        Ok(Self {
            flags,
            uncompressed_bytes: r.read_u32()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::packet::decode_packet;

    fn roundtrip<M: WireMessage>(msg: &M) -> M {
        let mut w = PacketWriter::new(64, 1);
        msg.write(&mut w).unwrap();
        let frame = w.finish();
        let (packet, _) = decode_packet(&frame).unwrap();
        let mut r = packet.reader();
        let out = M::read(&mut r).unwrap();
        assert!(r.is_empty(), "trailing bytes after message");
        out
    }

    #[test]
    fn create_layout() {
        let msg = CreateMessage {
            object_id: 0x0102_0304,
            category: 7,
            flags: ObjectFlags::from_bits(ObjectFlags::WIREFRAME),
            attributes: ObjectAttributes {
                position: Vec3::new(1.0, 2.0, 3.0),
                colour: Colour::RED,
                ..ObjectAttributes::default()
            },
        };
        let mut w = PacketWriter::new(64, 1);
        msg.write(&mut w).unwrap();
        let p = w.payload();
        assert_eq!(p.len(), CREATE_MESSAGE_SIZE);
        assert_eq!(&p[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&p[4..6], &[7, 0]);
        assert_eq!(&p[6..8], &[1, 0]);
        assert_eq!(&p[8..12], &1.0f32.to_le_bytes());
        // identity rotation w lands last in the quaternion
        assert_eq!(&p[32..36], &1.0f32.to_le_bytes());
        assert_eq!(&p[48..52], &0xFF00_00FFu32.to_le_bytes());
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn double_precision_rejected() {
        let msg = CreateMessage {
            flags: ObjectFlags::from_bits(ObjectFlags::DOUBLE_PRECISION),
            ..CreateMessage::default()
        };
        let mut w = PacketWriter::new(64, 1);
        msg.write(&mut w).unwrap();
        let frame = w.finish();
        let (packet, _) = decode_packet(&frame).unwrap();
        assert!(matches!(
            CreateMessage::read(&mut packet.reader()),
            Err(ProtocolError::InvalidContent(_))
        ));
    }

    #[test]
    fn partial_update_copies_selected_groups() {
        let mut current = ObjectAttributes::default();
        let update = ObjectAttributes {
            position: Vec3::splat(5.0),
            rotation: Quat::from_rotation_z(1.0),
            scale: Vec3::splat(2.0),
            colour: Colour::BLUE,
        };
        let flags = ObjectFlags::from_bits(
            ObjectFlags::UPDATE_MODE | ObjectFlags::POSITION | ObjectFlags::COLOUR,
        );
        current.apply_update(flags, &update);
        assert_eq!(current.position, Vec3::splat(5.0));
        assert_eq!(current.colour, Colour::BLUE);
        assert_eq!(current.rotation, Quat::IDENTITY);
        assert_eq!(current.scale, Vec3::ONE);

        current.apply_update(ObjectFlags::NONE, &update);
        assert_eq!(current, update);
    }

    #[test]
    fn colour_channels() {
        let c = Colour::rgba(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.0, 0x1122_3344);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn server_info_is_fixed_size() {
        let msg = ServerInfoMessage {
            coordinate_frame: CoordinateFrame::Zyx,
            ..ServerInfoMessage::default()
        };
        let mut w = PacketWriter::new(1, 0);
        msg.write(&mut w).unwrap();
        assert_eq!(w.payload_len(), 8 + 4 + 1 + SERVER_INFO_RESERVED);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn category_messages() {
        let name = CategoryNameMessage {
            category_id: 3,
            parent_id: 1,
            default_active: true,
            name: "physics".into(),
        };
        assert_eq!(roundtrip(&name), name);
        let active = CategoryActiveMessage {
            category_id: 3,
            active: false,
        };
        assert_eq!(roundtrip(&active), active);
    }

    #[test]
    fn mesh_create_unknown_draw_type() {
        let msg = MeshCreateMessage {
            mesh_id: 1,
            vertex_count: 3,
            index_count: 0,
            flags: MeshCreateFlags::NONE,
            draw_type: MeshDrawType::Triangles,
            attributes: ObjectAttributes::default(),
        };
        assert_eq!(roundtrip(&msg), msg);

        let mut w = PacketWriter::new(4, 2);
        msg.write(&mut w).unwrap();
        let mut bytes = w.payload().to_vec();
        bytes[14] = 9;
        assert_eq!(
            MeshCreateMessage::read(&mut PacketReader::new(&bytes)),
            Err(ProtocolError::MeshUnknownDrawType(9))
        );
    }

    #[test]
    fn camera_layout() {
        let msg = CameraMessage {
            camera_id: CameraMessage::RECORDED,
            position: Vec3::new(1.0, 2.0, 3.0),
            direction: Vec3::Y,
            up: Vec3::Z,
            near: 0.1,
            far: 500.0,
            fov: 60.0,
        };
        let mut w = PacketWriter::new(5, 0);
        msg.write(&mut w).unwrap();
        let p = w.payload();
        assert_eq!(p.len(), CAMERA_MESSAGE_SIZE);
        assert_eq!(&p[0..4], &[0xFF, 0, 0, 0]);
        assert_eq!(&p[4..8], &1.0f32.to_le_bytes());
        assert_eq!(&p[44..48], &60.0f32.to_le_bytes());
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn collated_prefix_layout() {
        let msg = CollatedPacketMessage {
            flags: CollatedPacketFlags::from_bits(CollatedPacketFlags::COMPRESS),
            uncompressed_bytes: 0x0102_0304,
        };
        let mut w = PacketWriter::new(3, 0);
        msg.write(&mut w).unwrap();
        assert_eq!(hex::encode(w.payload()), "0100000004030201");
        assert_eq!(w.payload_len(), COLLATED_MESSAGE_SIZE);
        let back = roundtrip(&msg);
        assert!(back.flags.compressed());
        assert_eq!(back, msg);
    }

    #[test]
    fn transform_decomposition() {
        let attrs = ObjectAttributes {
            position: Vec3::new(1.0, -2.0, 3.0),
            rotation: Quat::from_rotation_y(0.5),
            scale: Vec3::new(2.0, 3.0, 4.0),
            colour: Colour::GREEN,
        };
        let back = ObjectAttributes::from_transform(attrs.transform(), Colour::GREEN);
        assert!(back.position.abs_diff_eq(attrs.position, 1e-5));
        assert!(back.scale.abs_diff_eq(attrs.scale, 1e-5));
        assert!(back.rotation.abs_diff_eq(attrs.rotation, 1e-5));
    }
}
