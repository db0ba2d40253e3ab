// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Amortised mesh transfer.
//!
//! A mesh resource streams as a sequence of component messages followed by a
//! finalise message. Each call to [`transfer_mesh`] writes exactly one message
//! and returns the advanced [`TransferProgress`], so the caller decides how
//! many calls fit into a frame's byte budget.
//!
//! Phases run `Vertex → Index → Normal → Colour → Uv → Finalise → End`,
//! skipping channels the mesh does not flag or leaves empty.

use tracing::warn;
use vantage_proto::messages::MESH_COMPONENT_HEADER_SIZE;
use vantage_proto::{
    routing, MeshComponentFlags, MeshComponentHeader, MeshCreateFlags, MeshCreateMessage,
    MeshDestroyMessage, MeshFinaliseFlags, MeshFinaliseMessage, MeshMessageId, ObjectAttributes,
    PacketWriter, ProtocolError, WireMessage, CRC_SIZE, HEADER_SIZE, MAX_PACKET_SIZE,
};

use crate::mesh::{MeshIndices, MeshResource};

/// Stage of a mesh transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TransferPhase {
    /// Vertex positions.
    #[default]
    Vertex,
    /// Indices.
    Index,
    /// Normals.
    Normal,
    /// Per-vertex colours.
    Colour,
    /// Texture coordinates.
    Uv,
    /// Finalise message.
    Finalise,
    /// Nothing left to send.
    End,
}

impl TransferPhase {
    /// Phase following this one, ignoring channel presence.
    pub const fn following(self) -> Self {
        match self {
            Self::Vertex => Self::Index,
            Self::Index => Self::Normal,
            Self::Normal => Self::Colour,
            Self::Colour => Self::Uv,
            Self::Uv => Self::Finalise,
            Self::Finalise | Self::End => Self::End,
        }
    }

    /// Mesh component bit backing this phase, if it streams a channel.
    pub const fn component(self) -> Option<u32> {
        match self {
            Self::Vertex => Some(MeshComponentFlags::VERTEX),
            Self::Index => Some(MeshComponentFlags::INDEX),
            Self::Normal => Some(MeshComponentFlags::NORMAL),
            Self::Colour => Some(MeshComponentFlags::COLOUR),
            Self::Uv => Some(MeshComponentFlags::UV),
            Self::Finalise | Self::End => None,
        }
    }

    /// Message id used for this phase's blocks.
    pub const fn message_id(self) -> MeshMessageId {
        match self {
            Self::Vertex => MeshMessageId::Vertex,
            Self::Index => MeshMessageId::Index,
            Self::Normal => MeshMessageId::Normal,
            Self::Colour => MeshMessageId::VertexColour,
            Self::Uv => MeshMessageId::Uv,
            Self::Finalise | Self::End => MeshMessageId::Finalise,
        }
    }
}

/// Resumable transfer state threaded through [`transfer_mesh`] calls.
///
/// `Default` is the state for a transfer that has not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferProgress {
    /// Elements of the current phase already sent.
    pub progress: u32,
    /// Current phase.
    pub phase: TransferPhase,
    /// Finalise has been sent.
    pub complete: bool,
    /// The transfer hit an error; restart from [`TransferProgress::default`].
    pub failed: bool,
}

impl TransferProgress {
    /// True once no further calls are useful.
    pub const fn is_done(&self) -> bool {
        self.complete || self.failed
    }
}

/// Elements of `element_size` bytes to send in one packet.
///
/// `byte_limit` of zero means "as many as fit". The result is at least one and
/// never more than a single packet can hold.
pub fn estimate_transfer_count(element_size: usize, byte_limit: usize) -> usize {
    estimate_transfer_count_with_overhead(element_size, byte_limit, 0)
}

/// As [`estimate_transfer_count`], reserving `overhead` payload bytes for the
/// message header that precedes the elements.
pub fn estimate_transfer_count_with_overhead(
    element_size: usize,
    byte_limit: usize,
    overhead: usize,
) -> usize {
    let element_size = element_size.max(1);
    let max = MAX_PACKET_SIZE.saturating_sub(HEADER_SIZE + overhead + CRC_SIZE) / element_size;
    let count = if byte_limit > 0 {
        byte_limit / element_size
    } else {
        max
    };
    count.clamp(1, max.max(1))
}

fn channel_len<M: MeshResource + ?Sized>(mesh: &M, phase: TransferPhase) -> usize {
    match phase {
        TransferPhase::Vertex => mesh.vertices().len(),
        TransferPhase::Index => mesh.indices().len(),
        TransferPhase::Normal => mesh.normals().len(),
        TransferPhase::Colour => mesh.colours().len(),
        TransferPhase::Uv => mesh.uvs().len(),
        TransferPhase::Finalise | TransferPhase::End => 0,
    }
}

fn element_size<M: MeshResource + ?Sized>(mesh: &M, phase: TransferPhase) -> usize {
    match phase {
        TransferPhase::Vertex | TransferPhase::Normal => 12,
        TransferPhase::Index => mesh.indices().element_size(),
        TransferPhase::Uv => 8,
        TransferPhase::Colour | TransferPhase::Finalise | TransferPhase::End => 4,
    }
}

fn selectable<M: MeshResource + ?Sized>(mesh: &M, phase: TransferPhase) -> bool {
    match phase.component() {
        Some(bit) => mesh.components().contains(bit) && channel_len(mesh, phase) > 0,
        None => true,
    }
}

/// The next phase after `current` that has something to send.
///
/// Finalise and End are always selectable.
pub fn next_phase<M: MeshResource + ?Sized>(mesh: &M, current: TransferPhase) -> TransferPhase {
    let mut phase = current.following();
    while !selectable(mesh, phase) {
        phase = phase.following();
    }
    phase
}

fn count_u32(len: usize) -> Result<u32, ProtocolError> {
    u32::try_from(len).map_err(|_| ProtocolError::InvalidContent("mesh channel exceeds u32 range"))
}

/// Open a mesh create packet for `mesh`.
pub fn write_mesh_create<M: MeshResource + ?Sized>(
    mesh: &M,
    w: &mut PacketWriter,
) -> Result<(), ProtocolError> {
    if mesh.is_placeholder() {
        return Err(ProtocolError::InvalidContent("placeholder mesh carries no data"));
    }
    let indices = mesh.indices();
    let flags = MeshCreateFlags::NONE.with(
        MeshCreateFlags::INDEX_U16,
        matches!(indices, MeshIndices::U16(_)),
    );
    w.reset(routing::MESH, MeshMessageId::Create.raw());
    MeshCreateMessage {
        mesh_id: mesh.id(),
        vertex_count: count_u32(mesh.vertices().len())?,
        index_count: count_u32(indices.len())?,
        flags,
        draw_type: mesh.draw_type(),
        attributes: ObjectAttributes::from_transform(mesh.transform(), mesh.tint()),
    }
    .write(w)
}

/// Open a mesh destroy packet for `mesh`.
pub fn write_mesh_destroy<M: MeshResource + ?Sized>(
    mesh: &M,
    w: &mut PacketWriter,
) -> Result<(), ProtocolError> {
    w.reset(routing::MESH, MeshMessageId::Destroy.raw());
    MeshDestroyMessage { mesh_id: mesh.id() }.write(w)
}

fn write_finalise<M: MeshResource + ?Sized>(
    mesh: &M,
    w: &mut PacketWriter,
) -> Result<(), ProtocolError> {
    let normals_sent = selectable(mesh, TransferPhase::Normal);
    let flags = MeshFinaliseFlags::NONE.with(
        MeshFinaliseFlags::CALCULATE_NORMALS,
        mesh.calculate_normals() && !normals_sent,
    );
    w.reset(routing::MESH, MeshMessageId::Finalise.raw());
    MeshFinaliseMessage {
        mesh_id: mesh.id(),
        flags,
    }
    .write(w)
}

/// Write one component block for `phase` starting at `offset`.
///
/// Returns the number of elements written.
fn write_component<M: MeshResource + ?Sized>(
    mesh: &M,
    w: &mut PacketWriter,
    phase: TransferPhase,
    offset: u32,
    byte_limit: usize,
) -> Result<u32, ProtocolError> {
    let len = channel_len(mesh, phase);
    let start = offset as usize;
    if start >= len {
        return Err(ProtocolError::IndexingOutOfRange {
            offset,
            count: 0,
            len: count_u32(len)?,
        });
    }
    let remaining = len - start;
    let budget = estimate_transfer_count_with_overhead(
        element_size(mesh, phase),
        byte_limit,
        MESH_COMPONENT_HEADER_SIZE,
    );
    let count = u16::try_from(budget.min(remaining))
        .map_err(|_| ProtocolError::InvalidContent("component block exceeds u16 count"))?;
    let range = start..start + usize::from(count);

    w.reset(routing::MESH, phase.message_id().raw());
    MeshComponentHeader {
        mesh_id: mesh.id(),
        offset,
        count,
    }
    .write(w)?;

    match phase {
        TransferPhase::Vertex => {
            for v in &mesh.vertices()[range] {
                w.write_vec3(*v)?;
            }
        }
        TransferPhase::Normal => {
            for n in &mesh.normals()[range] {
                w.write_vec3(*n)?;
            }
        }
        TransferPhase::Colour => {
            for c in &mesh.colours()[range] {
                w.write_u32(c.0)?;
            }
        }
        TransferPhase::Uv => {
            for uv in &mesh.uvs()[range] {
                w.write_vec2(*uv)?;
            }
        }
        TransferPhase::Index => match mesh.indices() {
            MeshIndices::U16(idx) => {
                for i in &idx[range] {
                    w.write_u16(*i)?;
                }
            }
            MeshIndices::U32(idx) => {
                for i in &idx[range] {
                    w.write_u32(*i)?;
                }
            }
            MeshIndices::None => {
                return Err(ProtocolError::InvalidContent("index phase without indices"));
            }
        },
        TransferPhase::Finalise | TransferPhase::End => {
            return Err(ProtocolError::InvalidContent("not a component phase"));
        }
    }
    Ok(u32::from(count))
}

/// Write the next message of a mesh transfer and return the advanced progress.
///
/// Exactly one message is written into `w` per call unless the transfer is
/// already complete or failed, in which case `w` is left untouched. On error
/// the returned progress has `failed` set and the transfer must restart.
pub fn transfer_mesh<M: MeshResource + ?Sized>(
    mesh: &M,
    w: &mut PacketWriter,
    byte_limit: usize,
    progress: TransferProgress,
) -> TransferProgress {
    let mut p = progress;
    if p.is_done() {
        return p;
    }
    if mesh.is_placeholder() {
        warn!(mesh_id = mesh.id(), "cannot transfer a placeholder mesh");
        p.failed = true;
        return p;
    }
    if !selectable(mesh, p.phase) {
        p.progress = 0;
        p.phase = next_phase(mesh, p.phase);
    }

    let result = match p.phase {
        TransferPhase::Finalise | TransferPhase::End => write_finalise(mesh, w).map(|()| {
            p.phase = TransferPhase::End;
            p.complete = true;
        }),
        phase => write_component(mesh, w, phase, p.progress, byte_limit).map(|sent| {
            p.progress += sent;
            if p.progress as usize >= channel_len(mesh, phase) {
                p.progress = 0;
                p.phase = next_phase(mesh, phase);
            }
        }),
    };
    if let Err(err) = result {
        warn!(mesh_id = mesh.id(), phase = ?p.phase, error = %err, "mesh transfer failed");
        p.failed = true;
    }
    p
}
