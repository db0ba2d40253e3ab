// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collated packets: complete frames carried back to back in one packet.
//!
//! The payload is a [`CollatedPacketMessage`] followed by the nested frames,
//! each with its own header and CRC. Compressed collation is rejected.

use bytes::Bytes;

use crate::error::ProtocolError;
use crate::flags::CollatedPacketFlags;
use crate::ids::routing;
use crate::messages::{CollatedPacketMessage, WireMessage, COLLATED_MESSAGE_SIZE};
use crate::packet::{decode_packet, Packet, MAX_PAYLOAD_SIZE};
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// Most nested frame bytes one collated packet can carry.
pub const MAX_COLLATED_BYTES: usize = MAX_PAYLOAD_SIZE - COLLATED_MESSAGE_SIZE;

/// Gathers finished frames into one collated packet.
#[derive(Debug, Clone, Default)]
pub struct CollatedPacket {
    frames: Vec<u8>,
    count: usize,
}

impl CollatedPacket {
    /// Empty collation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one complete frame.
    ///
    /// A frame that does not decode on its own is rejected, as is one that
    /// would not fit; either way the collation is unchanged.
    pub fn add(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        let (packet, used) = decode_packet(frame)?;
        if used != frame.len() {
            return Err(ProtocolError::MalformedMessage("collated frame has trailing bytes"));
        }
        if packet.routing_id() == routing::COLLATED_PACKET {
            return Err(ProtocolError::InvalidContent("collated packets do not nest"));
        }
        let available = MAX_COLLATED_BYTES - self.frames.len();
        if frame.len() > available {
            return Err(ProtocolError::PacketOverflow {
                needed: frame.len(),
                available,
            });
        }
        self.frames.extend_from_slice(frame);
        self.count += 1;
        Ok(())
    }

    /// Frames added since the last finish.
    pub const fn len(&self) -> usize {
        self.count
    }

    /// True when no frame has been added.
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Nested frame bytes so far.
    pub fn byte_len(&self) -> usize {
        self.frames.len()
    }

    /// Drop every added frame.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.count = 0;
    }

    /// Encode the collation through `w` and start over.
    pub fn finish(&mut self, w: &mut PacketWriter) -> Result<Bytes, ProtocolError> {
        let uncompressed_bytes = u32::try_from(self.frames.len())
            .map_err(|_| ProtocolError::InvalidContent("collation exceeds u32 bytes"))?;
        w.reset(routing::COLLATED_PACKET, 0);
        CollatedPacketMessage {
            flags: CollatedPacketFlags::NONE,
            uncompressed_bytes,
        }
        .write(w)?;
        w.write_bytes(&self.frames)?;
        self.clear();
        Ok(w.finish())
    }
}

/// Nested frames of a collated packet payload.
///
/// Reads the collation prefix from `r` and hands back the frames after it.
pub fn collated_frames<'a>(
    r: &mut PacketReader<'a>,
) -> Result<CollatedFrames<'a>, ProtocolError> {
    let msg = CollatedPacketMessage::read(r)?;
    if msg.flags.compressed() {
        return Err(ProtocolError::InvalidContent(
            "compressed collated packets are not supported",
        ));
    }
    let len = r.remaining();
    if msg.uncompressed_bytes as usize != len {
        return Err(ProtocolError::MalformedMessage(
            "collated byte count does not match payload",
        ));
    }
    Ok(CollatedFrames {
        rest: r.read_bytes(len)?,
    })
}

/// Iterator over the frames inside a collated packet.
///
/// The first framing error ends the iteration.
#[derive(Debug, Clone)]
pub struct CollatedFrames<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for CollatedFrames<'a> {
    type Item = Result<Packet<'a>, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match decode_packet(self.rest) {
            Ok((packet, used)) => {
                self.rest = &self.rest[used..];
                Some(Ok(packet))
            }
            Err(err) => {
                self.rest = &[];
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::packet::{CRC_SIZE, HEADER_SIZE};

    fn frame(routing_id: u16, value: u32) -> Bytes {
        let mut w = PacketWriter::new(routing_id, 1);
        w.write_u32(value).unwrap();
        w.finish()
    }

    fn nested(collated: &[u8]) -> Vec<Result<(u16, u32), ProtocolError>> {
        let (packet, _) = decode_packet(collated).unwrap();
        assert_eq!(packet.routing_id(), routing::COLLATED_PACKET);
        collated_frames(&mut packet.reader())
            .unwrap()
            .map(|p| p.map(|p| (p.routing_id(), p.reader().read_u32().unwrap())))
            .collect()
    }

    #[test]
    fn frames_come_back_in_order() {
        let mut collated = CollatedPacket::new();
        for i in 0..4 {
            collated.add(&frame(64 + i, u32::from(i))).unwrap();
        }
        assert_eq!(collated.len(), 4);
        assert_eq!(collated.byte_len(), 4 * (HEADER_SIZE + 4 + CRC_SIZE));

        let mut w = PacketWriter::default();
        let out = collated.finish(&mut w).unwrap();
        assert!(collated.is_empty());
        let got: Vec<_> = nested(&out).into_iter().map(Result::unwrap).collect();
        assert_eq!(got, vec![(64, 0), (65, 1), (66, 2), (67, 3)]);
    }

    #[test]
    fn empty_collation_has_no_frames() {
        let out = CollatedPacket::new().finish(&mut PacketWriter::default()).unwrap();
        assert!(nested(&out).is_empty());
    }

    #[test]
    fn add_rejects_partial_and_nested_frames() {
        let mut collated = CollatedPacket::new();
        let whole = frame(64, 1);
        assert!(collated.add(&whole[..whole.len() - 1]).is_err());
        let mut doubled = whole.to_vec();
        doubled.extend_from_slice(&whole);
        assert!(matches!(
            collated.add(&doubled),
            Err(ProtocolError::MalformedMessage(_))
        ));

        let mut inner = CollatedPacket::new();
        inner.add(&whole).unwrap();
        let inner = inner.finish(&mut PacketWriter::default()).unwrap();
        assert!(matches!(
            collated.add(&inner),
            Err(ProtocolError::InvalidContent(_))
        ));
        assert!(collated.is_empty());
    }

    #[test]
    fn full_collation_refuses_more() {
        let mut collated = CollatedPacket::new();
        let mut w = PacketWriter::new(64, 1);
        w.write_bytes(&vec![0u8; 30_000]).unwrap();
        let big = w.finish();
        collated.add(&big).unwrap();
        collated.add(&big).unwrap();
        let before = collated.byte_len();
        assert!(matches!(
            collated.add(&big),
            Err(ProtocolError::PacketOverflow { .. })
        ));
        assert_eq!(collated.byte_len(), before);
        assert!(collated.finish(&mut PacketWriter::default()).is_ok());
    }

    #[test]
    fn compressed_collation_is_rejected() {
        let mut w = PacketWriter::new(routing::COLLATED_PACKET, 0);
        CollatedPacketMessage {
            flags: CollatedPacketFlags::from_bits(CollatedPacketFlags::COMPRESS),
            uncompressed_bytes: 0,
        }
        .write(&mut w)
        .unwrap();
        let payload = w.payload().to_vec();
        assert!(matches!(
            collated_frames(&mut PacketReader::new(&payload)),
            Err(ProtocolError::InvalidContent(_))
        ));
    }

    #[test]
    fn corrupt_nested_frame_ends_iteration() {
        let mut collated = CollatedPacket::new();
        collated.add(&frame(64, 1)).unwrap();
        collated.add(&frame(65, 2)).unwrap();
        collated.add(&frame(66, 3)).unwrap();
        let out = collated.finish(&mut PacketWriter::default()).unwrap();

        // Flip a payload byte of the second nested frame and re-seal the outer one.
        let mut bytes = out.to_vec();
        let first_len = HEADER_SIZE + 4 + CRC_SIZE;
        let second = HEADER_SIZE + COLLATED_MESSAGE_SIZE + first_len + HEADER_SIZE;
        bytes[second] ^= 0x01;
        let body = bytes.len() - CRC_SIZE;
        let crc = crate::crc::crc16(&bytes[..body]);
        bytes[body..].copy_from_slice(&crc.to_le_bytes());

        let got = nested(&bytes);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], Ok((64, 1)));
        assert!(matches!(got[1], Err(ProtocolError::CrcFailure { .. })));
    }

    #[test]
    fn byte_count_must_match_payload() {
        let mut w = PacketWriter::new(routing::COLLATED_PACKET, 0);
        CollatedPacketMessage {
            flags: CollatedPacketFlags::NONE,
            uncompressed_bytes: 40,
        }
        .write(&mut w)
        .unwrap();
        w.write_bytes(&frame(64, 1)).unwrap();
        let payload = w.payload().to_vec();
        assert!(matches!(
            collated_frames(&mut PacketReader::new(&payload)),
            Err(ProtocolError::MalformedMessage(_))
        ));
    }
}
