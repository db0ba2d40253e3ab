// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The capability every shape kind implements.

use glam::{Quat, Vec3};
use vantage_proto::{Colour, PacketReader, PacketWriter, ProtocolError, UpdateMessage};

use crate::object::ShapeCore;
use crate::resource::MeshHandle;

/// Outcome of a successful data message step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStatus {
    /// All data has been written or received.
    Done,
    /// Further data messages follow.
    More,
}

/// Serialisation and receive-side reconstruction of a shape.
///
/// Only [`Renderable::core`] and [`Renderable::core_mut`] are required; simple
/// shapes need nothing else. Shapes with trailing create data override the
/// `*_create_extension` pair, and complex shapes override the data pair.
pub trait Renderable {
    /// Shared identity and attributes.
    fn core(&self) -> &ShapeCore;

    /// Mutable shared identity and attributes.
    fn core_mut(&mut self) -> &mut ShapeCore;

    /// Trailing data written after the create message.
    fn write_create_extension(&self, _w: &mut PacketWriter) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Parse trailing create data.
    fn read_create_extension(&mut self, _r: &mut PacketReader<'_>) -> Result<(), ProtocolError> {
        Ok(())
    }

    /// Open a create packet: core message plus trailing data.
    fn write_create(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        self.core().write_create(w)?;
        self.write_create_extension(w)
    }

    /// Open an update packet.
    fn write_update(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        self.core().write_update(w)
    }

    /// Open a destroy packet.
    fn write_destroy(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        self.core().write_destroy(w)
    }

    /// True when creation must be followed by data messages.
    fn is_complex(&self) -> bool {
        false
    }

    /// Open the next data packet, advancing `progress`.
    ///
    /// `progress` starts at zero and is owned by the caller between calls.
    fn write_data(
        &self,
        _w: &mut PacketWriter,
        _progress: &mut u32,
    ) -> Result<DataStatus, ProtocolError> {
        Err(self.core().no_data())
    }

    /// Consume a data message body following the object id.
    fn read_data(&mut self, _r: &mut PacketReader<'_>) -> Result<DataStatus, ProtocolError> {
        Err(self.core().no_data())
    }

    /// Resources this shape references.
    fn resources(&self) -> Vec<MeshHandle> {
        Vec::new()
    }

    /// Apply a received update.
    fn apply_update(&mut self, msg: &UpdateMessage) {
        self.core_mut().apply_update(msg);
    }

    /// Copy the attribute block of `other`.
    fn update_from(&mut self, other: &dyn Renderable) {
        self.core_mut().attributes = other.core().attributes;
    }
}

/// Fluent setters for any [`Renderable`].
pub trait ShapeBuilder: Renderable + Sized {
    /// Set the category.
    fn with_category(mut self, category: u16) -> Self {
        self.core_mut().category = category;
        self
    }

    /// Set the position.
    fn with_position(mut self, position: Vec3) -> Self {
        self.core_mut().attributes.position = position;
        self
    }

    /// Set the rotation.
    fn with_rotation(mut self, rotation: Quat) -> Self {
        self.core_mut().attributes.rotation = rotation;
        self
    }

    /// Set the raw scale.
    fn with_scale(mut self, scale: Vec3) -> Self {
        self.core_mut().attributes.scale = scale;
        self
    }

    /// Set the colour.
    fn with_colour(mut self, colour: Colour) -> Self {
        self.core_mut().attributes.colour = colour;
        self
    }

    /// Set or clear object flag bits.
    fn with_flag(mut self, mask: u16, on: bool) -> Self {
        let core = self.core_mut();
        core.flags = core.flags.with(mask, on);
        self
    }
}

impl<T: Renderable + Sized> ShapeBuilder for T {}
