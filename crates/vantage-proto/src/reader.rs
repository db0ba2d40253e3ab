// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Checked cursor over a packet payload.

use bytes::Buf;
use glam::{Quat, Vec2, Vec3};

use crate::error::ProtocolError;

/// Reads little-endian values from a payload.
///
/// Every read checks the remaining length first and fails with
/// [`ProtocolError::MalformedMessage`] instead of panicking.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    cur: &'a [u8],
}

impl<'a> PacketReader<'a> {
    /// Cursor at the start of `payload`.
    pub const fn new(payload: &'a [u8]) -> Self {
        Self { cur: payload }
    }

    /// Unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.cur.remaining()
    }

    /// True once every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cur.is_empty()
    }

    fn need(&self, n: usize) -> Result<(), ProtocolError> {
        if self.cur.remaining() < n {
            return Err(ProtocolError::MalformedMessage("payload ends early"));
        }
        Ok(())
    }

    /// Read a `u8`.
    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        self.need(1)?;
        Ok(self.cur.get_u8())
    }

    /// Read a `u16`.
    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        self.need(2)?;
        Ok(self.cur.get_u16_le())
    }

    /// Read a `u32`.
    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        self.need(4)?;
        Ok(self.cur.get_u32_le())
    }

    /// Read a `u64`.
    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        self.need(8)?;
        Ok(self.cur.get_u64_le())
    }

    /// Read an `f32`.
    pub fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        self.need(4)?;
        Ok(self.cur.get_f32_le())
    }

    /// Read 2 × f32.
    pub fn read_vec2(&mut self) -> Result<Vec2, ProtocolError> {
        self.need(8)?;
        Ok(Vec2::new(self.cur.get_f32_le(), self.cur.get_f32_le()))
    }

    /// Read 3 × f32.
    pub fn read_vec3(&mut self) -> Result<Vec3, ProtocolError> {
        self.need(12)?;
        let x = self.cur.get_f32_le();
        let y = self.cur.get_f32_le();
        let z = self.cur.get_f32_le();
        Ok(Vec3::new(x, y, z))
    }

    /// Read a quaternion stored as x, y, z, w.
    pub fn read_quat(&mut self) -> Result<Quat, ProtocolError> {
        self.need(16)?;
        let x = self.cur.get_f32_le();
        let y = self.cur.get_f32_le();
        let z = self.cur.get_f32_le();
        let w = self.cur.get_f32_le();
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    /// Borrow the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        self.need(n)?;
        let (head, tail) = self.cur.split_at(n);
        self.cur = tail;
        Ok(head)
    }

    /// Read a u16-length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<&'a str, ProtocolError> {
        let len = usize::from(self.read_u16()?);
        let bytes = self.read_bytes(len)?;
        core::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidContent("text is not UTF-8"))
    }
}
