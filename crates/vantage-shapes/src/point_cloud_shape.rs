// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shape drawing a point cloud resource, optionally restricted to a subset of
//! its points by index.

use std::sync::Arc;

use vantage_proto::{PacketReader, PacketWriter, ProtocolError, ShapeKind};

use crate::mesh::PlaceholderMesh;
use crate::block::place_block;
use crate::object::ShapeCore;
use crate::renderable::{DataStatus, Renderable};
use crate::resource::MeshHandle;
use crate::transfer::estimate_transfer_count_with_overhead;

/// Data message bytes ahead of the indices: object id, offset, count.
const INDEX_BLOCK_OVERHEAD: usize = 4 + 4 + 4;

/// View onto a point cloud resource.
#[derive(Debug, Clone)]
pub struct PointCloudShape {
    core: ShapeCore,
    cloud: MeshHandle,
    point_scale: f32,
    index_count: u32,
    indices: Vec<u32>,
}

impl PointCloudShape {
    /// Show every point of `cloud`.
    pub fn new(object_id: u32, cloud: MeshHandle) -> Self {
        Self::from_core(
            ShapeCore::new(ShapeKind::PointCloud.routing_id(), object_id),
            cloud,
        )
    }

    /// Rebuild from a received core.
    pub const fn from_core(core: ShapeCore, cloud: MeshHandle) -> Self {
        Self {
            core,
            cloud,
            point_scale: 0.0,
            index_count: 0,
            indices: Vec::new(),
        }
    }

    /// Restrict the view to `indices`.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.index_count = u32::try_from(indices.len()).unwrap_or(u32::MAX);
        self.indices = indices;
        self
    }

    /// Point size; zero uses the viewer default.
    pub fn with_point_scale(mut self, scale: f32) -> Self {
        self.point_scale = scale;
        self
    }

    /// The cloud resource.
    pub fn cloud(&self) -> &MeshHandle {
        &self.cloud
    }

    /// Replace the cloud, as when resolving a placeholder.
    pub fn set_cloud(&mut self, cloud: MeshHandle) {
        self.cloud = cloud;
    }

    /// Point size.
    pub const fn point_scale(&self) -> f32 {
        self.point_scale
    }

    /// Declared index count.
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Indices received or assigned so far.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl Renderable for PointCloudShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn write_create_extension(&self, w: &mut PacketWriter) -> Result<(), ProtocolError> {
        w.write_u32(self.cloud.id())?;
        w.write_u32(self.index_count)?;
        w.write_f32(self.point_scale)
    }

    fn read_create_extension(&mut self, r: &mut PacketReader<'_>) -> Result<(), ProtocolError> {
        let cloud_id = r.read_u32()?;
        self.index_count = r.read_u32()?;
        self.point_scale = r.read_f32()?;
        self.cloud = Arc::new(PlaceholderMesh::new(cloud_id));
        self.indices.clear();
        Ok(())
    }

    fn is_complex(&self) -> bool {
        self.index_count > 0
    }

    fn write_data(&self, w: &mut PacketWriter, progress: &mut u32) -> Result<DataStatus, ProtocolError> {
        self.core.write_data_prefix(w)?;
        let offset = (*progress as usize).min(self.indices.len());
        let budget = estimate_transfer_count_with_overhead(4, 0, INDEX_BLOCK_OVERHEAD);
        let count = budget.min(self.indices.len() - offset);
        let count32 = u32::try_from(count)
            .map_err(|_| ProtocolError::InvalidContent("index block exceeds u32 count"))?;
        w.write_u32(*progress)?;
        w.write_u32(count32)?;
        for index in &self.indices[offset..offset + count] {
            w.write_u32(*index)?;
        }
        *progress += count32;
        Ok(if (*progress as usize) < self.indices.len() {
            DataStatus::More
        } else {
            DataStatus::Done
        })
    }

    fn read_data(&mut self, r: &mut PacketReader<'_>) -> Result<DataStatus, ProtocolError> {
        let offset = r.read_u32()?;
        let count = r.read_u32()?;
        place_block(&mut self.indices, self.index_count, offset, count, || r.read_u32())?;
        Ok(if self.indices.len() < self.index_count as usize {
            DataStatus::More
        } else {
            DataStatus::Done
        })
    }

    fn resources(&self) -> Vec<MeshHandle> {
        if self.cloud.is_placeholder() {
            Vec::new()
        } else {
            vec![Arc::clone(&self.cloud)]
        }
    }
}
