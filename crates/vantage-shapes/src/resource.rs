// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared resources referenced by shapes.

use std::sync::Arc;

use vantage_proto::{PacketWriter, ProtocolError, ResourceKey};

use crate::mesh::MeshResource;
use crate::transfer::{transfer_mesh, write_mesh_create, write_mesh_destroy, TransferProgress};

/// A resource that can be announced, streamed and released.
pub trait Resource {
    /// Identity of the resource on the wire.
    fn key(&self) -> ResourceKey;

    /// Open the create packet.
    fn write_resource_create(&self, w: &mut PacketWriter) -> Result<(), ProtocolError>;

    /// Open the destroy packet.
    fn write_resource_destroy(&self, w: &mut PacketWriter) -> Result<(), ProtocolError>;

    /// Write the next transfer message. See [`transfer_mesh`].
    fn transfer(
        &self,
        w: &mut PacketWriter,
        byte_limit: usize,
        progress: TransferProgress,
    ) -> TransferProgress;
}

impl<M: MeshResource + ?Sized> Resource for M {
    fn key(&self) -> ResourceKey {
        ResourceKey::mesh(self.id())
    }

    fn write_resource_create(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        write_mesh_create(self, w)
    }

    fn write_resource_destroy(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        write_mesh_destroy(self, w)
    }

    fn transfer(
        &self,
        w: &mut PacketWriter,
        byte_limit: usize,
        progress: TransferProgress,
    ) -> TransferProgress {
        transfer_mesh(self, w, byte_limit, progress)
    }
}

/// Shared handle to a mesh resource.
pub type MeshHandle = Arc<dyn MeshResource>;

/// Distinct resources in `handles`, first occurrence wins.
pub fn unique_keys(handles: &[MeshHandle]) -> Vec<ResourceKey> {
    let mut keys: Vec<ResourceKey> = Vec::with_capacity(handles.len());
    for handle in handles {
        let key = handle.key();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
