// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packet framing.
//!
//! Wire format (Little-Endian):
//! ```text
//! offset size  field
//! 0      4     marker = u32 LE (0x03E55E30)
//! 4      2     version_major = u16 LE (0)
//! 6      2     version_minor = u16 LE (2)
//! 8      2     routing_id = u16 LE
//! 10     2     message_id = u16 LE
//! 12     2     payload_size = u16 LE
//! 14     1     payload_offset = u8 (0)
//! 15     1     flags = u8 (reserved, 0)
//!
//! 16     N     payload
//! 16+N   2     crc16 = u16 LE over bytes [0, 16+N)
//! ```
//!
//! The whole frame, CRC included, never exceeds [`MAX_PACKET_SIZE`]. Version
//! and flags are validated after the CRC so a corrupted header reports as a
//! CRC failure. [`decode_packet`] extends that to the marker and size fields;
//! [`decode_packet_prefix`] trusts them so a stream can wait for more bytes.

use bytes::Bytes;

use crate::crc::crc16;
use crate::error::ProtocolError;
use crate::reader::PacketReader;

/// Marker opening every packet.
pub const PACKET_MARKER: u32 = 0x03E5_5E30;

/// Major version; packets with a different major are rejected.
pub const VERSION_MAJOR: u16 = 0;

/// Minor version written by this crate. Any minor is accepted on read.
pub const VERSION_MINOR: u16 = 2;

/// Fixed header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Trailing CRC size in bytes.
pub const CRC_SIZE: usize = 2;

/// Hard ceiling for an encoded packet.
pub const MAX_PACKET_SIZE: usize = 0xFFFF;

/// Largest payload that still fits a packet with its CRC.
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE - CRC_SIZE;

/// Decoded 16-byte packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Major protocol version.
    pub version_major: u16,
    /// Minor protocol version.
    pub version_minor: u16,
    /// Handler the packet is addressed to.
    pub routing_id: u16,
    /// Message kind within the handler.
    pub message_id: u16,
    /// Payload length in bytes.
    pub payload_size: u16,
    /// Extra bytes between header and payload. Always written as zero.
    pub payload_offset: u8,
    /// Reserved flags, zero.
    pub flags: u8,
}

impl PacketHeader {
    /// Header for a new packet with an empty payload.
    pub const fn new(routing_id: u16, message_id: u16) -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            routing_id,
            message_id,
            payload_size: 0,
            payload_offset: 0,
            flags: 0,
        }
    }

    /// Encode to the fixed 16-byte prefix.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&PACKET_MARKER.to_le_bytes());
        buf[4..6].copy_from_slice(&self.version_major.to_le_bytes());
        buf[6..8].copy_from_slice(&self.version_minor.to_le_bytes());
        buf[8..10].copy_from_slice(&self.routing_id.to_le_bytes());
        buf[10..12].copy_from_slice(&self.message_id.to_le_bytes());
        buf[12..14].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[14] = self.payload_offset;
        buf[15] = self.flags;
        buf
    }

    /// Parse a header prefix, checking only the marker.
    ///
    /// Call [`PacketHeader::validate`] once the CRC has been verified.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let Some(head) = bytes.get(..HEADER_SIZE) else {
            return Err(ProtocolError::Truncated {
                needed: HEADER_SIZE,
                got: bytes.len(),
            });
        };
        let marker = u32::from_le_bytes([head[0], head[1], head[2], head[3]]);
        if marker != PACKET_MARKER {
            return Err(ProtocolError::BadMarker(marker));
        }
        Ok(Self::fields(head))
    }

    fn fields(head: &[u8]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([head[at], head[at + 1]]);
        Self {
            version_major: u16_at(4),
            version_minor: u16_at(6),
            routing_id: u16_at(8),
            message_id: u16_at(10),
            payload_size: u16_at(12),
            payload_offset: head[14],
            flags: head[15],
        }
    }

    /// Check version and reserved fields.
    pub const fn validate(&self) -> Result<(), ProtocolError> {
        if self.version_major != VERSION_MAJOR {
            return Err(ProtocolError::UnsupportedVersion {
                major: self.version_major,
                minor: self.version_minor,
            });
        }
        if self.flags != 0 {
            return Err(ProtocolError::MalformedMessage("reserved header flags set"));
        }
        Ok(())
    }

    /// Size of the full frame this header describes, CRC included.
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE
            + usize::from(self.payload_offset)
            + usize::from(self.payload_size)
            + CRC_SIZE
    }

    fn payload_range(&self) -> core::ops::Range<usize> {
        let start = HEADER_SIZE + usize::from(self.payload_offset);
        start..start + usize::from(self.payload_size)
    }
}

/// A validated packet borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    /// Decoded header.
    pub header: PacketHeader,
    /// Payload bytes.
    pub payload: &'a [u8],
}

impl<'a> Packet<'a> {
    /// Routing id shortcut.
    #[inline]
    pub const fn routing_id(&self) -> u16 {
        self.header.routing_id
    }

    /// Message id shortcut.
    #[inline]
    pub const fn message_id(&self) -> u16 {
        self.header.message_id
    }

    /// Cursor over the payload.
    pub fn reader(&self) -> PacketReader<'a> {
        PacketReader::new(self.payload)
    }

    /// Copy into an owned packet.
    pub fn to_owned_packet(&self) -> OwnedPacket {
        OwnedPacket {
            header: self.header,
            payload: Bytes::copy_from_slice(self.payload),
        }
    }
}

/// A validated packet that owns its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPacket {
    /// Decoded header.
    pub header: PacketHeader,
    /// Payload bytes.
    pub payload: Bytes,
}

impl OwnedPacket {
    /// Borrowed view.
    pub fn as_packet(&self) -> Packet<'_> {
        Packet {
            header: self.header,
            payload: &self.payload,
        }
    }
}

/// Decode one packet from the front of a complete buffer.
///
/// Returns the packet and the number of bytes it occupied. Trailing bytes are
/// left for the caller. No more bytes will arrive, so a marker or declared
/// size that disagrees with the buffer is checked against the CRC the buffer
/// actually ends with: a corrupted header reports as
/// [`ProtocolError::CrcFailure`]. Only a buffer too short to hold a header
/// and CRC yields [`ProtocolError::Truncated`].
pub fn decode_packet(bytes: &[u8]) -> Result<(Packet<'_>, usize), ProtocolError> {
    match frame_bounds(bytes) {
        Ok((header, frame_len)) => verify_frame(bytes, header, frame_len),
        Err(err) if bytes.len() < HEADER_SIZE + CRC_SIZE => Err(err),
        Err(err) => Err(trailing_crc_failure(bytes).unwrap_or(err)),
    }
}

/// Decode the packet at the front of a buffer that may still be filling.
///
/// A short buffer yields [`ProtocolError::Truncated`], which a stream reader
/// treats as "read more". Marker and size are trusted before the CRC here, so
/// corruption in them reports as [`ProtocolError::BadMarker`] or a truncation.
pub fn decode_packet_prefix(bytes: &[u8]) -> Result<(Packet<'_>, usize), ProtocolError> {
    let (header, frame_len) = frame_bounds(bytes)?;
    verify_frame(bytes, header, frame_len)
}

fn frame_bounds(bytes: &[u8]) -> Result<(PacketHeader, usize), ProtocolError> {
    let header = PacketHeader::from_bytes(bytes)?;
    let frame_len = header.frame_len();
    if frame_len > MAX_PACKET_SIZE {
        return Err(ProtocolError::MalformedMessage("declared packet exceeds 65535 bytes"));
    }
    if bytes.len() < frame_len {
        return Err(ProtocolError::Truncated {
            needed: frame_len,
            got: bytes.len(),
        });
    }
    Ok((header, frame_len))
}

fn verify_frame(
    bytes: &[u8],
    header: PacketHeader,
    frame_len: usize,
) -> Result<(Packet<'_>, usize), ProtocolError> {
    crc_check(&bytes[..frame_len])?;
    header.validate()?;
    let payload = &bytes[header.payload_range()];
    Ok((Packet { header, payload }, frame_len))
}

/// `frame` ends with its CRC.
fn crc_check(frame: &[u8]) -> Result<(), ProtocolError> {
    let body_len = frame.len() - CRC_SIZE;
    let expected = u16::from_le_bytes([frame[body_len], frame[body_len + 1]]);
    let actual = crc16(&frame[..body_len]);
    if expected != actual {
        return Err(ProtocolError::CrcFailure { expected, actual });
    }
    Ok(())
}

/// CRC failure for a buffer whose header cannot be trusted, if any.
///
/// The frame ends where the declared size says, or at the end of the buffer
/// when the declared size runs past it.
fn trailing_crc_failure(bytes: &[u8]) -> Option<ProtocolError> {
    let declared = PacketHeader::fields(&bytes[..HEADER_SIZE]).frame_len();
    crc_check(&bytes[..declared.min(bytes.len())]).err()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::writer::PacketWriter;

    fn sample_frame() -> Bytes {
        let mut w = PacketWriter::new(64, 1);
        w.write_u32(7).unwrap();
        w.write_u16(0xBEEF).unwrap();
        w.finish()
    }

    #[test]
    fn header_layout_is_little_endian() {
        let mut header = PacketHeader::new(0x0102, 0x0304);
        header.payload_size = 0x0506;
        let bytes = header.to_bytes();
        assert_eq!(hex::encode(bytes), "305ee503000002000201040306050000");
    }

    #[test]
    fn decode_roundtrip() {
        let frame = sample_frame();
        let (packet, used) = decode_packet(&frame).unwrap();
        assert_eq!(used, frame.len());
        assert_eq!(used, HEADER_SIZE + 6 + CRC_SIZE);
        assert_eq!(packet.routing_id(), 64);
        assert_eq!(packet.message_id(), 1);
        let mut r = packet.reader();
        assert_eq!(r.read_u32().unwrap(), 7);
        assert_eq!(r.read_u16().unwrap(), 0xBEEF);
        assert!(r.is_empty());
    }

    #[test]
    fn decode_leaves_trailing_bytes() {
        let mut joined = sample_frame().to_vec();
        let first = joined.len();
        joined.extend_from_slice(&sample_frame());
        let (_, used) = decode_packet(&joined).unwrap();
        assert_eq!(used, first);
        assert!(decode_packet(&joined[used..]).is_ok());
    }

    #[test]
    fn prefix_decode_waits_for_more_bytes() {
        let frame = sample_frame();
        assert!(matches!(
            decode_packet_prefix(&frame[..frame.len() - 1]),
            Err(ProtocolError::Truncated { .. })
        ));
        assert!(matches!(
            decode_packet_prefix(&frame[..4]),
            Err(ProtocolError::Truncated { needed: HEADER_SIZE, got: 4 })
        ));
        let (_, used) = decode_packet_prefix(&frame).unwrap();
        assert_eq!(used, frame.len());
    }

    #[test]
    fn complete_buffer_cut_short_fails_its_crc() {
        let frame = sample_frame();
        assert!(matches!(
            decode_packet(&frame[..frame.len() - 1]),
            Err(ProtocolError::CrcFailure { .. })
        ));
        assert!(matches!(
            decode_packet(&frame[..4]),
            Err(ProtocolError::Truncated { needed: HEADER_SIZE, got: 4 })
        ));
    }

    #[test]
    fn corrupted_marker_fails_the_crc() {
        let mut frame = sample_frame().to_vec();
        frame[0] ^= 0xFF;
        assert!(matches!(
            decode_packet_prefix(&frame),
            Err(ProtocolError::BadMarker(_))
        ));
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::CrcFailure { .. })
        ));
    }

    #[test]
    fn consistent_frame_with_foreign_marker_is_a_bad_marker() {
        let mut frame = sample_frame().to_vec();
        frame[..4].copy_from_slice(&0xDEAD_BEEF_u32.to_le_bytes());
        let frame = reframe(frame);
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::BadMarker(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn grown_size_field_fails_the_crc() {
        let mut frame = sample_frame().to_vec();
        frame[12] ^= 0x80;
        assert!(matches!(
            decode_packet_prefix(&frame),
            Err(ProtocolError::Truncated { .. })
        ));
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::CrcFailure { .. })
        ));
        frame[12] ^= 0x80;
        frame[13] ^= 0x80;
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::CrcFailure { .. })
        ));
    }

    fn reframe(mut frame: Vec<u8>) -> Vec<u8> {
        let body = frame.len() - CRC_SIZE;
        let crc = crc16(&frame[..body]);
        frame[body..].copy_from_slice(&crc.to_le_bytes());
        frame
    }

    #[test]
    fn reject_major_version() {
        let mut frame = sample_frame().to_vec();
        frame[4] = 1;
        let frame = reframe(frame);
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::UnsupportedVersion { major: 1, .. })
        ));
    }

    #[test]
    fn accept_newer_minor_version() {
        let mut frame = sample_frame().to_vec();
        frame[6] = 9;
        let frame = reframe(frame);
        let (packet, _) = decode_packet(&frame).unwrap();
        assert_eq!(packet.header.version_minor, 9);
    }

    #[test]
    fn reject_reserved_flags() {
        let mut frame = sample_frame().to_vec();
        frame[15] = 0x80;
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::CrcFailure { .. })
        ));
        let frame = reframe(frame);
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::MalformedMessage(_))
        ));
    }

    #[test]
    fn reject_corrupt_payload() {
        let mut frame = sample_frame().to_vec();
        frame[HEADER_SIZE] ^= 0x01;
        assert!(matches!(
            decode_packet(&frame),
            Err(ProtocolError::CrcFailure { .. })
        ));
    }

    #[test]
    fn owned_packet_matches_view() {
        let frame = sample_frame();
        let (packet, _) = decode_packet(&frame).unwrap();
        let owned = packet.to_owned_packet();
        assert_eq!(owned.as_packet(), packet);
    }
}
