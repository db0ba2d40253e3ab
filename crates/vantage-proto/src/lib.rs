// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vantage wire protocol.
//!
//! A Vantage stream is a sequence of self-delimiting packets. Each packet is
//! addressed to a handler by routing id and carries one message, identified by
//! message id, in a little-endian payload guarded by a CRC-16 trailer.
//!
//! - [`packet`]: header layout, validation, [`decode_packet`] for complete
//!   buffers and [`decode_packet_prefix`] for buffers still filling.
//! - [`PacketWriter`] / [`PacketReader`]: checked payload encoding.
//! - [`messages`]: message bodies shared by shapes, meshes and control.
//! - [`collated`]: several frames carried inside one packet.
//! - [`stream`]: framing packets over `std::io` byte streams.

pub mod collated;
pub mod crc;
pub mod error;
pub mod flags;
pub mod ids;
pub mod messages;
pub mod packet;
pub mod reader;
pub mod stream;
pub mod writer;

pub use collated::{collated_frames, CollatedFrames, CollatedPacket, MAX_COLLATED_BYTES};
pub use error::{ErrorCode, ProtocolError};
pub use flags::{
    CollatedPacketFlags, EndFrameFlags, MeshComponentFlags, MeshCreateFlags, MeshFinaliseFlags,
    ObjectFlags,
};
pub use ids::{
    routing, CategoryMessageId, ControlId, CoordinateFrame, MeshDrawType, MeshMessageId,
    ObjectMessageId, ResourceKey, ShapeKind,
};
pub use messages::{
    CameraMessage, CategoryActiveMessage, CategoryNameMessage, CollatedPacketMessage, Colour,
    ControlMessage, CreateMessage, DataMessage, DestroyMessage, MeshComponentHeader,
    MeshCreateMessage, MeshDestroyMessage, MeshFinaliseMessage, ObjectAttributes,
    ServerInfoMessage, UpdateMessage, WireMessage,
};
pub use packet::{
    decode_packet, decode_packet_prefix, OwnedPacket, Packet, PacketHeader, CRC_SIZE,
    HEADER_SIZE, MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE,
};
pub use reader::PacketReader;
pub use stream::{PacketSink, PacketStreamReader, StreamStats, TransportError};
pub use writer::PacketWriter;
