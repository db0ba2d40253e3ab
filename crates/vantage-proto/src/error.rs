// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Protocol error taxonomy.
//!
//! Every decode or encode failure maps onto a stable numeric [`ErrorCode`] so
//! that peers and logs can report it without carrying the Rust enum around.
//! Structural failures (CRC, truncation, bad marker) cause the packet to be
//! dropped; semantic failures are reported per message and the stream carries
//! on.

/// Stable numeric error codes reported alongside [`ProtocolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// Packet checksum did not match its contents.
    CrcFailure = 1,
    /// No handler is registered for the packet's routing id.
    UnknownMessageHandler = 2,
    /// The message id is not valid for the routing id.
    InvalidMessageId = 3,
    /// The packet or message could not be parsed.
    MalformedMessage = 4,
    /// The object id does not refer to a live shape.
    InvalidObjectId = 5,
    /// A data block addressed elements outside the declared range.
    IndexingOutOfRange = 6,
    /// A message parsed but its content is not acceptable.
    InvalidContent = 7,
    /// A persistent shape with the same id already exists.
    DuplicateShape = 8,
    /// Data arrived for a mesh that was already finalised.
    MeshAlreadyFinalised = 9,
    /// A mesh declared a draw type outside the known set.
    MeshUnknownDrawType = 10,
}

impl ErrorCode {
    /// Raw numeric value.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Short label used in logs and reports.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CrcFailure => "crc-failure",
            Self::UnknownMessageHandler => "unknown-message-handler",
            Self::InvalidMessageId => "invalid-message-id",
            Self::MalformedMessage => "malformed-message",
            Self::InvalidObjectId => "invalid-object-id",
            Self::IndexingOutOfRange => "indexing-out-of-range",
            Self::InvalidContent => "invalid-content",
            Self::DuplicateShape => "duplicate-shape",
            Self::MeshAlreadyFinalised => "mesh-already-finalised",
            Self::MeshUnknownDrawType => "mesh-unknown-draw-type",
        }
    }
}

/// Errors raised while framing, encoding or interpreting packets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Packet CRC mismatch.
    #[error("crc mismatch: header carries {expected:#06x}, computed {actual:#06x}")]
    CrcFailure {
        /// CRC carried by the packet.
        expected: u16,
        /// CRC computed over the received bytes.
        actual: u16,
    },

    /// Routing id has no handler.
    #[error("no handler for routing id {0}")]
    UnknownMessageHandler(u16),

    /// Message id not valid for the routing id.
    #[error("invalid message id {message_id} for routing id {routing_id}")]
    InvalidMessageId {
        /// Routing id of the packet.
        routing_id: u16,
        /// Offending message id.
        message_id: u16,
    },

    /// Payload too short or otherwise unparseable.
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),

    /// No live shape with this id.
    #[error("unknown object {object_id} for routing id {routing_id}")]
    InvalidObjectId {
        /// Routing id of the shape.
        routing_id: u16,
        /// Object id that was not found.
        object_id: u32,
    },

    /// Element range outside the declared bounds.
    #[error("range {offset}+{count} exceeds declared length {len}")]
    IndexingOutOfRange {
        /// First element addressed.
        offset: u32,
        /// Number of elements addressed.
        count: u32,
        /// Declared element count.
        len: u32,
    },

    /// Content parsed but is not acceptable.
    #[error("invalid content: {0}")]
    InvalidContent(&'static str),

    /// Persistent id already in use.
    #[error("shape {object_id} already exists for routing id {routing_id}")]
    DuplicateShape {
        /// Routing id of the shape.
        routing_id: u16,
        /// Colliding object id.
        object_id: u32,
    },

    /// Mesh data after finalisation.
    #[error("mesh {0} is already finalised")]
    MeshAlreadyFinalised(u32),

    /// Mesh draw type outside the known set.
    #[error("unknown mesh draw type {0}")]
    MeshUnknownDrawType(u8),

    /// Packet does not start with the protocol marker.
    #[error("bad packet marker {0:#010x}")]
    BadMarker(u32),

    /// Packet major version not supported.
    #[error("unsupported protocol version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version found.
        major: u16,
        /// Minor version found.
        minor: u16,
    },

    /// Input ends before the packet does.
    #[error("truncated packet: need {needed} bytes, got {got}")]
    Truncated {
        /// Bytes needed for the whole packet.
        needed: usize,
        /// Bytes available.
        got: usize,
    },

    /// A write would exceed the packet payload capacity.
    #[error("packet overflow: need {needed} bytes, {available} available")]
    PacketOverflow {
        /// Bytes the write needs.
        needed: usize,
        /// Bytes left in the payload.
        available: usize,
    },
}

impl ProtocolError {
    /// Numeric code for this error. Framing failures report as malformed.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CrcFailure { .. } => ErrorCode::CrcFailure,
            Self::UnknownMessageHandler(_) => ErrorCode::UnknownMessageHandler,
            Self::InvalidMessageId { .. } => ErrorCode::InvalidMessageId,
            Self::MalformedMessage(_)
            | Self::BadMarker(_)
            | Self::UnsupportedVersion { .. }
            | Self::Truncated { .. }
            | Self::PacketOverflow { .. } => ErrorCode::MalformedMessage,
            Self::InvalidObjectId { .. } => ErrorCode::InvalidObjectId,
            Self::IndexingOutOfRange { .. } => ErrorCode::IndexingOutOfRange,
            Self::InvalidContent(_) => ErrorCode::InvalidContent,
            Self::DuplicateShape { .. } => ErrorCode::DuplicateShape,
            Self::MeshAlreadyFinalised(_) => ErrorCode::MeshAlreadyFinalised,
            Self::MeshUnknownDrawType(_) => ErrorCode::MeshUnknownDrawType,
        }
    }

    /// True when the whole packet must be discarded rather than one message.
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CrcFailure { .. }
                | Self::BadMarker(_)
                | Self::UnsupportedVersion { .. }
                | Self::Truncated { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_errors_report_as_malformed() {
        assert_eq!(
            ProtocolError::BadMarker(0).code(),
            ErrorCode::MalformedMessage
        );
        assert_eq!(
            ProtocolError::Truncated { needed: 18, got: 3 }.code(),
            ErrorCode::MalformedMessage
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorCode::CrcFailure.as_u16(), 1);
        assert_eq!(ErrorCode::MeshUnknownDrawType.as_u16(), 10);
        assert_eq!(
            ProtocolError::MeshAlreadyFinalised(3).code().label(),
            "mesh-already-finalised"
        );
    }

    #[test]
    fn structural_split() {
        assert!(ProtocolError::CrcFailure {
            expected: 1,
            actual: 2
        }
        .is_structural());
        assert!(!ProtocolError::DuplicateShape {
            routing_id: 64,
            object_id: 1
        }
        .is_structural());
    }
}
