// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Text shapes. The string follows the create message as a u16 length plus
//! UTF-8 bytes.

use glam::Vec3;
use vantage_proto::{ObjectFlags, PacketReader, PacketWriter, ProtocolError, ShapeKind};

use crate::object::ShapeCore;
use crate::orient::{direction_of, rotation_to, DEFAULT_FACING};
use crate::renderable::Renderable;

/// Text anchored in screen space, or at a projected world position when the
/// world-space flag is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Text2D {
    core: ShapeCore,
    text: String,
}

impl Text2D {
    /// Screen-space text at the origin.
    pub fn new(object_id: u32, text: impl Into<String>) -> Self {
        Self {
            core: ShapeCore::new(ShapeKind::Text2D.routing_id(), object_id),
            text: text.into(),
        }
    }

    /// Rebuild from a received core; text arrives with the create suffix.
    pub const fn from_core(core: ShapeCore) -> Self {
        Self {
            core,
            text: String::new(),
        }
    }

    /// The text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// True when the position is a world coordinate to project.
    pub const fn in_world_space(&self) -> bool {
        self.core.flags.user()
    }

    /// Select world-space or screen-space placement.
    pub fn with_world_space(mut self, on: bool) -> Self {
        self.core.flags = self.core.flags.with(ObjectFlags::USER, on);
        self
    }
}

/// Text placed in the world, facing a fixed direction or the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Text3D {
    core: ShapeCore,
    text: String,
}

impl Text3D {
    /// World text at the origin facing -Y.
    pub fn new(object_id: u32, text: impl Into<String>) -> Self {
        Self {
            core: ShapeCore::new(ShapeKind::Text3D.routing_id(), object_id),
            text: text.into(),
        }
    }

    /// Rebuild from a received core; text arrives with the create suffix.
    pub const fn from_core(core: ShapeCore) -> Self {
        Self {
            core,
            text: String::new(),
        }
    }

    /// The text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Font size, carried in scale z.
    pub const fn font_size(&self) -> f32 {
        self.core.attributes.scale.z
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.core.attributes.scale.z = size;
        self
    }

    /// True when the text always faces the camera.
    pub const fn screen_facing(&self) -> bool {
        self.core.flags.user()
    }

    /// Select camera-facing text.
    pub fn with_screen_facing(mut self, on: bool) -> Self {
        self.core.flags = self.core.flags.with(ObjectFlags::USER, on);
        self
    }

    /// Direction the text faces.
    pub fn facing(&self) -> Vec3 {
        direction_of(self.core.rotation(), DEFAULT_FACING)
    }

    /// Face `dir`. Clears screen facing.
    pub fn set_facing(&mut self, dir: Vec3) {
        self.core.flags = self.core.flags.with(ObjectFlags::USER, false);
        self.core.attributes.rotation = rotation_to(DEFAULT_FACING, dir);
    }

    /// Builder form of [`Self::set_facing`].
    pub fn with_facing(mut self, dir: Vec3) -> Self {
        self.set_facing(dir);
        self
    }
}

fn write_text(text: &str, w: &mut PacketWriter) -> Result<(), ProtocolError> {
    w.write_str(text)
}

fn read_text(r: &mut PacketReader<'_>) -> Result<String, ProtocolError> {
    r.read_str().map(str::to_owned)
}

macro_rules! text_renderable {
    ($name:ident) => {
        impl Renderable for $name {
            fn core(&self) -> &ShapeCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut ShapeCore {
                &mut self.core
            }

            fn write_create_extension(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
                write_text(&self.text, w)
            }

            fn read_create_extension(
                &mut self,
                r: &mut PacketReader<'_>,
            ) -> Result<(), ProtocolError> {
                self.text = read_text(r)?;
                Ok(())
            }
        }
    };
}

text_renderable!(Text2D);
text_renderable!(Text3D);
