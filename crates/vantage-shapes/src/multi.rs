// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Batches of same-kind shapes sent as one object.
//!
//! The create message carries the shared pose and the first
//! [`BLOCK_COUNT_LIMIT`] member attribute blocks; any remainder follows in
//! data messages of up to the same number of blocks.

use vantage_proto::{
    ObjectAttributes, ObjectFlags, PacketReader, PacketWriter, ProtocolError,
};

use crate::block::place_block;
use crate::object::ShapeCore;
use crate::renderable::{DataStatus, Renderable};

/// Member attribute blocks per message.
pub const BLOCK_COUNT_LIMIT: usize = 1024;

/// Largest batch.
pub const SHAPE_COUNT_LIMIT: usize = 0xFFFF;

/// Many shapes of one kind under a single object id.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiShape {
    core: ShapeCore,
    item_count: u32,
    members: Vec<ObjectAttributes>,
}

impl MultiShape {
    /// Batch `members` under the routing id, object id and category of `first`.
    ///
    /// `first` supplies identity only; the shared pose starts at the identity.
    pub fn new(first: &dyn Renderable, members: Vec<ObjectAttributes>) -> Result<Self, ProtocolError> {
        if members.is_empty() {
            return Err(ProtocolError::InvalidContent("multi-shape needs at least one member"));
        }
        if members.len() > SHAPE_COUNT_LIMIT {
            return Err(ProtocolError::InvalidContent("multi-shape member limit exceeded"));
        }
        let source = first.core();
        let mut core = ShapeCore::new(source.routing_id(), source.object_id);
        core.category = source.category;
        core.flags = source.flags.with(ObjectFlags::MULTI_SHAPE, true);
        let item_count = u32::try_from(members.len())
            .map_err(|_| ProtocolError::InvalidContent("multi-shape member limit exceeded"))?;
        Ok(Self {
            core,
            item_count,
            members,
        })
    }

    /// Batch the attribute blocks of `shapes`. The first shape supplies identity.
    pub fn from_shapes<S: Renderable>(shapes: &[S]) -> Result<Self, ProtocolError> {
        let first = shapes
            .first()
            .ok_or(ProtocolError::InvalidContent("multi-shape needs at least one member"))?;
        Self::new(first, shapes.iter().map(|s| s.core().attributes).collect())
    }

    /// Rebuild from a received core; members arrive with the create trailer.
    pub const fn from_core(core: ShapeCore) -> Self {
        Self {
            core,
            item_count: 0,
            members: Vec::new(),
        }
    }

    /// Declared member count.
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Member attribute blocks, relative to the shared pose.
    pub fn members(&self) -> &[ObjectAttributes] {
        &self.members
    }

    fn read_blocks(&mut self, r: &mut PacketReader<'_>, count: u16) -> Result<(), ProtocolError> {
        let have = u32::try_from(self.members.len()).unwrap_or(u32::MAX);
        place_block(&mut self.members, self.item_count, have, u32::from(count), || {
            ObjectAttributes::read(r)
        })
    }

    fn status(&self) -> DataStatus {
        if self.members.len() < self.item_count as usize {
            DataStatus::More
        } else {
            DataStatus::Done
        }
    }
}

fn block_count(n: usize) -> u16 {
    // BLOCK_COUNT_LIMIT fits in u16.
    u16::try_from(n.min(BLOCK_COUNT_LIMIT)).unwrap_or(u16::MAX)
}

impl Renderable for MultiShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn write_create_extension(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        let blocks = block_count(self.members.len());
        w.write_u32(self.item_count)?;
        w.write_u16(blocks)?;
        for member in &self.members[..usize::from(blocks)] {
            member.write(w)?;
        }
        Ok(())
    }

    fn read_create_extension(&mut self, r: &mut PacketReader<'_>) -> Result<(), ProtocolError> {
        self.item_count = r.read_u32()?;
        if self.item_count as usize > SHAPE_COUNT_LIMIT {
            return Err(ProtocolError::InvalidContent("multi-shape member limit exceeded"));
        }
        let blocks = r.read_u16()?;
        if usize::from(blocks) > BLOCK_COUNT_LIMIT {
            return Err(ProtocolError::InvalidContent("too many multi-shape blocks"));
        }
        self.members.clear();
        self.read_blocks(r, blocks)
    }

    fn is_complex(&self) -> bool {
        self.members.len() > BLOCK_COUNT_LIMIT
    }

    fn write_data(&self, w: &mut PacketWriter, progress: &mut u32) -> Result<DataStatus, ProtocolError> {
        if !self.is_complex() {
            return Ok(DataStatus::Done);
        }
        self.core.write_data_prefix(w)?;
        let offset = (BLOCK_COUNT_LIMIT + *progress as usize).min(self.members.len());
        let remaining = self.members.len() - offset;
        let blocks = block_count(remaining);
        w.write_u16(blocks)?;
        for member in &self.members[offset..offset + usize::from(blocks)] {
            member.write(w)?;
        }
        *progress += u32::from(blocks);
        Ok(if remaining > usize::from(blocks) {
            DataStatus::More
        } else {
            DataStatus::Done
        })
    }

    fn read_data(&mut self, r: &mut PacketReader<'_>) -> Result<DataStatus, ProtocolError> {
        let blocks = r.read_u16()?;
        if usize::from(blocks) > BLOCK_COUNT_LIMIT {
            return Err(ProtocolError::InvalidContent("too many multi-shape blocks"));
        }
        self.read_blocks(r, blocks)?;
        Ok(self.status())
    }
}
