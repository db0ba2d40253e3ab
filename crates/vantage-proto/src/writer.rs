// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packet builder.
//!
//! A [`PacketWriter`] holds exactly one open packet. Typed writes append
//! little-endian scalars to the payload and fail with
//! [`ProtocolError::PacketOverflow`] instead of splitting a value across the
//! capacity limit. [`PacketWriter::finish`] patches the payload size, appends
//! the CRC and hands back the frame.

use bytes::{BufMut, Bytes, BytesMut};
use glam::{Quat, Vec2, Vec3};

use crate::crc::crc16;
use crate::error::ProtocolError;
use crate::packet::{PacketHeader, HEADER_SIZE, MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE};

/// Builds one packet at a time into a reusable buffer.
#[derive(Debug, Clone)]
pub struct PacketWriter {
    buf: BytesMut,
    routing_id: u16,
    message_id: u16,
}

impl Default for PacketWriter {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl PacketWriter {
    /// Open a writer on a fresh packet.
    pub fn new(routing_id: u16, message_id: u16) -> Self {
        let mut writer = Self {
            buf: BytesMut::with_capacity(MAX_PACKET_SIZE),
            routing_id,
            message_id,
        };
        writer.reset(routing_id, message_id);
        writer
    }

    /// Discard the open packet and start a new one.
    pub fn reset(&mut self, routing_id: u16, message_id: u16) {
        self.routing_id = routing_id;
        self.message_id = message_id;
        self.buf.clear();
        self.buf.put_slice(&self.header(0).to_bytes());
    }

    /// Routing id of the open packet.
    #[inline]
    pub const fn routing_id(&self) -> u16 {
        self.routing_id
    }

    /// Message id of the open packet.
    #[inline]
    pub const fn message_id(&self) -> u16 {
        self.message_id
    }

    /// Bytes written to the payload so far.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.buf.len() - HEADER_SIZE
    }

    /// Payload bytes still available.
    #[inline]
    pub fn remaining(&self) -> usize {
        MAX_PAYLOAD_SIZE - self.payload_len()
    }

    /// Payload written so far.
    pub fn payload(&self) -> &[u8] {
        &self.buf[HEADER_SIZE..]
    }

    fn header(&self, payload_size: u16) -> PacketHeader {
        let mut header = PacketHeader::new(self.routing_id, self.message_id);
        header.payload_size = payload_size;
        header
    }

    fn ensure(&self, needed: usize) -> Result<(), ProtocolError> {
        let available = self.remaining();
        if needed > available {
            return Err(ProtocolError::PacketOverflow { needed, available });
        }
        Ok(())
    }

    /// Append a `u8`.
    pub fn write_u8(&mut self, v: u8) -> Result<(), ProtocolError> {
        self.ensure(1)?;
        self.buf.put_u8(v);
        Ok(())
    }

    /// Append a `u16`.
    pub fn write_u16(&mut self, v: u16) -> Result<(), ProtocolError> {
        self.ensure(2)?;
        self.buf.put_u16_le(v);
        Ok(())
    }

    /// Append a `u32`.
    pub fn write_u32(&mut self, v: u32) -> Result<(), ProtocolError> {
        self.ensure(4)?;
        self.buf.put_u32_le(v);
        Ok(())
    }

    /// Append a `u64`.
    pub fn write_u64(&mut self, v: u64) -> Result<(), ProtocolError> {
        self.ensure(8)?;
        self.buf.put_u64_le(v);
        Ok(())
    }

    /// Append an `f32`.
    pub fn write_f32(&mut self, v: f32) -> Result<(), ProtocolError> {
        self.ensure(4)?;
        self.buf.put_f32_le(v);
        Ok(())
    }

    /// Append raw bytes, all or nothing.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.ensure(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Append a vector as 2 × f32.
    pub fn write_vec2(&mut self, v: Vec2) -> Result<(), ProtocolError> {
        self.ensure(8)?;
        self.buf.put_f32_le(v.x);
        self.buf.put_f32_le(v.y);
        Ok(())
    }

    /// Append a vector as 3 × f32.
    pub fn write_vec3(&mut self, v: Vec3) -> Result<(), ProtocolError> {
        self.ensure(12)?;
        self.buf.put_f32_le(v.x);
        self.buf.put_f32_le(v.y);
        self.buf.put_f32_le(v.z);
        Ok(())
    }

    /// Append a quaternion as 4 × f32 in x, y, z, w order.
    pub fn write_quat(&mut self, q: Quat) -> Result<(), ProtocolError> {
        self.ensure(16)?;
        for c in q.to_array() {
            self.buf.put_f32_le(c);
        }
        Ok(())
    }

    /// Append a string as a u16 byte length followed by UTF-8, no terminator.
    pub fn write_str(&mut self, s: &str) -> Result<(), ProtocolError> {
        let len = u16::try_from(s.len())
            .map_err(|_| ProtocolError::InvalidContent("string longer than 65535 bytes"))?;
        self.ensure(2 + s.len())?;
        self.buf.put_u16_le(len);
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    /// Close the open packet and return the frame.
    ///
    /// The writer is left holding an empty packet with the same routing and
    /// message ids, ready for the next batch of writes.
    pub fn finish(&mut self) -> Bytes {
        // ensure() keeps the payload within MAX_PAYLOAD_SIZE, so this fits.
        let size = u16::try_from(self.payload_len()).unwrap_or(u16::MAX);
        let header = self.header(size);
        self.buf[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        let crc = crc16(&self.buf);
        self.buf.put_u16_le(crc);
        let frame = self.buf.split().freeze();
        self.reset(self.routing_id, self.message_id);
        frame
    }
}
