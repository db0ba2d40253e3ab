// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity and attribute state common to every shape.

use glam::{Quat, Vec3};
use vantage_proto::{
    Colour, CreateMessage, DataMessage, DestroyMessage, ObjectAttributes, ObjectFlags,
    ObjectMessageId, PacketWriter, ProtocolError, UpdateMessage, WireMessage,
};

/// Display flags an update may change.
const DISPLAY_FLAGS: u16 = ObjectFlags::WIREFRAME | ObjectFlags::TRANSPARENT | ObjectFlags::TWO_SIDED;

/// Routing id, object id, category, flags and attributes of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeCore {
    routing_id: u16,
    /// Object id; zero marks a transient shape.
    pub object_id: u32,
    /// Category the shape is filtered by.
    pub category: u16,
    /// Object flags.
    pub flags: ObjectFlags,
    /// Pose and colour.
    pub attributes: ObjectAttributes,
}

impl ShapeCore {
    /// Default-attributed core.
    pub fn new(routing_id: u16, object_id: u32) -> Self {
        Self {
            routing_id,
            object_id,
            category: 0,
            flags: ObjectFlags::NONE,
            attributes: ObjectAttributes::default(),
        }
    }

    /// Core rebuilt from a received create message.
    pub const fn from_create(routing_id: u16, msg: &CreateMessage) -> Self {
        Self {
            routing_id,
            object_id: msg.object_id,
            category: msg.category,
            flags: msg.flags,
            attributes: msg.attributes,
        }
    }

    /// Routing id of the owning handler.
    #[inline]
    pub const fn routing_id(&self) -> u16 {
        self.routing_id
    }

    /// True for object id zero.
    #[inline]
    pub const fn is_transient(&self) -> bool {
        self.object_id == 0
    }

    /// Position.
    #[inline]
    pub const fn position(&self) -> Vec3 {
        self.attributes.position
    }

    /// Rotation.
    #[inline]
    pub const fn rotation(&self) -> Quat {
        self.attributes.rotation
    }

    /// Scale.
    #[inline]
    pub const fn scale(&self) -> Vec3 {
        self.attributes.scale
    }

    /// Colour.
    #[inline]
    pub const fn colour(&self) -> Colour {
        self.attributes.colour
    }

    /// The create message for this core.
    pub const fn create_message(&self) -> CreateMessage {
        CreateMessage {
            object_id: self.object_id,
            category: self.category,
            flags: self.flags,
            attributes: self.attributes,
        }
    }

    /// Open a create packet and write the core message.
    pub fn write_create(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.reset(self.routing_id, ObjectMessageId::Create.raw());
        self.create_message().write(w)
    }

    /// Open an update packet and write the full attribute block.
    pub fn write_update(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.reset(self.routing_id, ObjectMessageId::Update.raw());
        UpdateMessage {
            object_id: self.object_id,
            flags: self.flags,
            attributes: self.attributes,
        }
        .write(w)
    }

    /// Open a destroy packet.
    pub fn write_destroy(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.reset(self.routing_id, ObjectMessageId::Destroy.raw());
        DestroyMessage {
            object_id: self.object_id,
        }
        .write(w)
    }

    /// Open a data packet and write the object id prefix.
    pub fn write_data_prefix(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.reset(self.routing_id, ObjectMessageId::Data.raw());
        DataMessage {
            object_id: self.object_id,
        }
        .write(w)
    }

    /// Apply a received update: selected attributes plus display flags.
    pub fn apply_update(&mut self, msg: &UpdateMessage) {
        self.attributes.apply_update(msg.flags, &msg.attributes);
        let display = msg.flags.bits() & DISPLAY_FLAGS;
        self.flags = ObjectFlags::from_bits((self.flags.bits() & !DISPLAY_FLAGS) | display);
    }

    /// Error for a data message sent to a shape that takes none.
    pub const fn no_data(&self) -> ProtocolError {
        ProtocolError::InvalidMessageId {
            routing_id: self.routing_id,
            message_id: ObjectMessageId::Data.raw(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use vantage_proto::decode_packet;

    #[test]
    fn destroy_carries_only_the_id() {
        let core = ShapeCore::new(64, 17);
        let mut w = PacketWriter::default();
        core.write_destroy(&mut w).unwrap();
        let frame = w.finish();
        let (packet, _) = decode_packet(&frame).unwrap();
        assert_eq!(packet.message_id(), ObjectMessageId::Destroy.raw());
        assert_eq!(packet.payload, &17u32.to_le_bytes());
    }

    #[test]
    fn update_keeps_identity_flags() {
        let mut core = ShapeCore::new(64, 3);
        core.flags = ObjectFlags::from_bits(ObjectFlags::SKIP_RESOURCES | ObjectFlags::WIREFRAME);
        core.apply_update(&UpdateMessage {
            object_id: 3,
            flags: ObjectFlags::from_bits(ObjectFlags::TRANSPARENT),
            attributes: ObjectAttributes {
                colour: Colour::RED,
                ..ObjectAttributes::default()
            },
        });
        assert!(core.flags.contains(ObjectFlags::SKIP_RESOURCES));
        assert!(core.flags.contains(ObjectFlags::TRANSPARENT));
        assert!(!core.flags.contains(ObjectFlags::WIREFRAME));
        assert_eq!(core.colour(), Colour::RED);
    }
}
