// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Flag words carried in messages.
//!
//! Object flags (u16):
//! - bit0: WIREFRAME
//! - bit1: TRANSPARENT
//! - bit2: TWO_SIDED
//! - bit3: REPLACE (create replaces a live shape with the same id)
//! - bit4: MULTI_SHAPE
//! - bit5: SKIP_RESOURCES
//! - bit6: DOUBLE_PRECISION (reserved, rejected on read)
//! - bit8: USER (meaning depends on the shape kind)
//! - bit9..13: update selectors, see [`ObjectFlags::UPDATE_MODE`]

macro_rules! flag_word {
    ($(#[$meta:meta])* $name:ident: $repr:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub $repr);

        impl $name {
            /// No bits set.
            pub const NONE: Self = Self(0);

            /// Create flags from raw bits.
            #[inline]
            pub const fn from_bits(bits: $repr) -> Self {
                Self(bits)
            }

            /// Raw bits.
            #[inline]
            pub const fn bits(self) -> $repr {
                self.0
            }

            /// True if every bit in `mask` is set.
            #[inline]
            pub const fn contains(self, mask: $repr) -> bool {
                self.0 & mask == mask
            }

            /// Copy with `mask` set or cleared.
            #[inline]
            pub const fn with(self, mask: $repr, on: bool) -> Self {
                if on {
                    Self(self.0 | mask)
                } else {
                    Self(self.0 & !mask)
                }
            }
        }
    };
}

flag_word! {
    /// Flags on create and update messages.
    ObjectFlags: u16
}

impl ObjectFlags {
    /// Draw as wireframe.
    pub const WIREFRAME: u16 = 1 << 0;
    /// Draw with transparency.
    pub const TRANSPARENT: u16 = 1 << 1;
    /// Disable back-face culling.
    pub const TWO_SIDED: u16 = 1 << 2;
    /// A create replaces a live shape with the same id.
    pub const REPLACE: u16 = 1 << 3;
    /// Create carries a batch of shapes.
    pub const MULTI_SHAPE: u16 = 1 << 4;
    /// Receiver should not expect resources for this shape.
    pub const SKIP_RESOURCES: u16 = 1 << 5;
    /// Reserved for double precision attributes.
    pub const DOUBLE_PRECISION: u16 = 1 << 6;
    /// Shape specific: text2d world space, text3d screen facing, mesh normals.
    pub const USER: u16 = 1 << 8;
    /// Update messages only apply the selected attribute groups below.
    pub const UPDATE_MODE: u16 = 1 << 9;
    /// Update selects position.
    pub const POSITION: u16 = 1 << 10;
    /// Update selects rotation.
    pub const ROTATION: u16 = 1 << 11;
    /// Update selects scale.
    pub const SCALE: u16 = 1 << 12;
    /// Update selects colour.
    pub const COLOUR: u16 = 1 << 13;

    /// Check if REPLACE is set.
    #[inline]
    pub const fn replace(self) -> bool {
        self.contains(Self::REPLACE)
    }

    /// Check if MULTI_SHAPE is set.
    #[inline]
    pub const fn multi_shape(self) -> bool {
        self.contains(Self::MULTI_SHAPE)
    }

    /// Check if the shape-specific USER bit is set.
    #[inline]
    pub const fn user(self) -> bool {
        self.contains(Self::USER)
    }

    /// Check if UPDATE_MODE is set.
    #[inline]
    pub const fn partial_update(self) -> bool {
        self.contains(Self::UPDATE_MODE)
    }
}

flag_word! {
    /// Flags on the mesh create message.
    MeshCreateFlags: u16
}

impl MeshCreateFlags {
    /// Reserved for double precision vertices.
    pub const DOUBLE_PRECISION: u16 = 1 << 0;
    /// Index blocks carry u16 values instead of u32.
    pub const INDEX_U16: u16 = 1 << 1;

    /// Check if INDEX_U16 is set.
    #[inline]
    pub const fn index_u16(self) -> bool {
        self.contains(Self::INDEX_U16)
    }
}

flag_word! {
    /// Flags on the mesh finalise message.
    MeshFinaliseFlags: u32
}

impl MeshFinaliseFlags {
    /// Receiver computes normals because none were sent.
    pub const CALCULATE_NORMALS: u32 = 1 << 0;
}

flag_word! {
    /// Channels present in a mesh resource.
    MeshComponentFlags: u32
}

impl MeshComponentFlags {
    /// Vertex positions.
    pub const VERTEX: u32 = 1 << 0;
    /// Indices.
    pub const INDEX: u32 = 1 << 1;
    /// Per-vertex colours.
    pub const COLOUR: u32 = 1 << 2;
    /// Normals.
    pub const NORMAL: u32 = 1 << 3;
    /// Texture coordinates.
    pub const UV: u32 = 1 << 4;
}

flag_word! {
    /// Flags on the end-of-frame control message.
    EndFrameFlags: u32
}

impl EndFrameFlags {
    /// Keep transient shapes for another frame.
    pub const PERSIST: u32 = 1 << 0;

    /// Check if PERSIST is set.
    #[inline]
    pub const fn persist(self) -> bool {
        self.contains(Self::PERSIST)
    }
}

flag_word! {
    /// Flags on the collated packet message.
    CollatedPacketFlags: u16
}

impl CollatedPacketFlags {
    /// Nested packets are deflate compressed.
    pub const COMPRESS: u16 = 1 << 0;

    /// Check if COMPRESS is set.
    #[inline]
    pub const fn compressed(self) -> bool {
        self.contains(Self::COMPRESS)
    }
}
