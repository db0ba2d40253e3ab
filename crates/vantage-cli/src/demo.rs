// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `vantage demo`: record a sample scene.
//!
//! Two mesh resources (a terrain grid and a helix point cloud) are announced
//! up front and streamed amortised, spending at most the configured byte
//! budget per frame. The shapes that reference them are created before the
//! meshes finish and resolve on the receiver once each mesh is finalised.

use std::f32::consts::TAU;
use std::sync::Arc;

use anyhow::{bail, Result};
use glam::{Mat4, Vec3};
use vantage_app_core::settings::StreamSettings;
use vantage_proto::{
    routing, CategoryActiveMessage, CategoryMessageId, CategoryNameMessage, Colour, ControlId,
    ControlMessage, MeshDrawType, PacketSink, PacketWriter, WireMessage,
};
use vantage_shapes::{
    Arrow, DataStatus, MeshHandle, MeshSet, PointCloud, PointCloudShape, Renderable, Resource,
    ShapeBuilder, SimpleMesh, Sphere, Star, Text2D, TransferProgress,
};

const CATEGORY_SCENE: u16 = 1;
const CATEGORY_MARKERS: u16 = 2;
const CATEGORY_LABELS: u16 = 3;

const GRID_ID: u32 = 1;
const CLOUD_ID: u32 = 2;
const GRID_SIZE: u16 = 48;
const CLOUD_POINTS: u16 = 2000;

/// What was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSummary {
    /// Frames ended.
    pub frames: u32,
    /// Packets written.
    pub packets: u64,
    /// Bytes written.
    pub bytes: usize,
    /// Frames that carried mesh transfer messages.
    pub transfer_frames: u32,
}

struct Recorder<'a, S> {
    w: PacketWriter,
    sink: &'a mut S,
    packets: u64,
    bytes: usize,
}

impl<'a, S: PacketSink> Recorder<'a, S> {
    fn new(sink: &'a mut S) -> Self {
        Self {
            w: PacketWriter::default(),
            sink,
            packets: 0,
            bytes: 0,
        }
    }

    fn flush(&mut self) -> Result<usize> {
        let frame = self.w.finish();
        self.sink.send(&frame)?;
        self.packets += 1;
        self.bytes += frame.len();
        Ok(frame.len())
    }

    fn message<M: WireMessage>(&mut self, routing_id: u16, message_id: u16, msg: &M) -> Result<()> {
        self.w.reset(routing_id, message_id);
        msg.write(&mut self.w)?;
        self.flush()?;
        Ok(())
    }

    fn control(&mut self, id: ControlId, value32: u32) -> Result<()> {
        self.message(
            routing::CONTROL,
            id.raw(),
            &ControlMessage {
                value32,
                ..ControlMessage::default()
            },
        )
    }

    fn category(&mut self, category_id: u16, parent_id: u16, name: &str) -> Result<()> {
        self.message(
            routing::CATEGORY,
            CategoryMessageId::Name.raw(),
            &CategoryNameMessage {
                category_id,
                parent_id,
                default_active: true,
                name: name.to_owned(),
            },
        )
    }

    fn create(&mut self, shape: &dyn Renderable) -> Result<()> {
        shape.write_create(&mut self.w)?;
        self.flush()?;
        if shape.is_complex() {
            let mut progress = 0;
            while shape.write_data(&mut self.w, &mut progress)? == DataStatus::More {
                self.flush()?;
            }
            self.flush()?;
        }
        Ok(())
    }

    fn update(&mut self, shape: &dyn Renderable) -> Result<()> {
        shape.write_update(&mut self.w)?;
        self.flush()?;
        Ok(())
    }

    /// Advance every unfinished transfer until `budget` bytes are spent.
    /// Returns the bytes written.
    fn pump(
        &mut self,
        transfers: &mut [(MeshHandle, TransferProgress)],
        byte_limit: usize,
        budget: usize,
    ) -> Result<usize> {
        let mut spent = 0;
        for (mesh, progress) in transfers.iter_mut() {
            while !progress.is_done() && (budget == 0 || spent < budget) {
                *progress = mesh.transfer(&mut self.w, byte_limit, *progress);
                if progress.failed {
                    bail!("transfer of mesh {} failed", mesh.id());
                }
                spent += self.flush()?;
            }
        }
        Ok(spent)
    }
}

fn terrain_grid() -> SimpleMesh {
    let n = GRID_SIZE;
    let mut vertices = Vec::with_capacity(usize::from(n) * usize::from(n));
    let mut colours = Vec::with_capacity(vertices.capacity());
    for y in 0..n {
        for x in 0..n {
            let (fx, fy) = (f32::from(x), f32::from(y));
            let height = (fx * 0.3).sin() * (fy * 0.2).cos();
            vertices.push(Vec3::new(fx, fy, height));
            colours.push(if height > 0.0 { Colour::GREEN } else { Colour::BLUE });
        }
    }
    let n = u32::from(n);
    let mut indices = Vec::new();
    for y in 0..n - 1 {
        for x in 0..n - 1 {
            let i = y * n + x;
            indices.extend_from_slice(&[i, i + 1, i + n, i + 1, i + n + 1, i + n]);
        }
    }
    SimpleMesh::new(GRID_ID, MeshDrawType::Triangles)
        .with_vertices(vertices)
        .with_indices(indices)
        .with_colours(colours)
}

fn helix() -> PointCloud {
    let points = (0..CLOUD_POINTS)
        .map(|i| {
            let t = f32::from(i) / f32::from(CLOUD_POINTS);
            let angle = t * TAU * 8.0;
            Vec3::new(angle.cos() * 4.0, angle.sin() * 4.0, t * 10.0)
        })
        .collect();
    PointCloud::new(CLOUD_ID, points)
}

/// Write the demo scene into `sink`.
///
/// At least `frames` frames are recorded; more follow if the mesh transfers
/// need them to fit the per-frame budget.
pub fn record<S: PacketSink>(
    sink: &mut S,
    frames: u32,
    settings: &StreamSettings,
) -> Result<DemoSummary> {
    let mut rec = Recorder::new(sink);
    let byte_limit = settings.transfer.byte_limit;
    let budget = settings.transfer.frame_byte_budget;

    rec.message(routing::SERVER_INFO, 0, &settings.server.to_message()?)?;
    rec.control(ControlId::FrameCount, frames)?;
    rec.category(CATEGORY_SCENE, 0, "scene")?;
    rec.category(CATEGORY_MARKERS, CATEGORY_SCENE, "markers")?;
    rec.category(CATEGORY_LABELS, 0, "labels")?;

    let grid: MeshHandle = Arc::new(terrain_grid());
    let cloud: MeshHandle = Arc::new(helix());
    let mut transfers = vec![
        (Arc::clone(&grid), TransferProgress::default()),
        (Arc::clone(&cloud), TransferProgress::default()),
    ];
    for (mesh, _) in &transfers {
        mesh.write_resource_create(&mut rec.w)?;
        rec.flush()?;
    }

    rec.create(
        &MeshSet::new(1)
            .with_category(CATEGORY_SCENE)
            .with_part(grid, Mat4::IDENTITY, Colour::WHITE),
    )?;
    rec.create(
        &PointCloudShape::new(2, cloud)
            .with_category(CATEGORY_SCENE)
            .with_position(Vec3::new(24.0, 24.0, 2.0)),
    )?;
    rec.create(
        &Arrow::from_points(3, Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0))
            .with_category(CATEGORY_MARKERS)
            .with_colour(Colour::RED),
    )?;

    let mut frame = 0u32;
    let mut transfer_frames = 0;
    while frame < frames || transfers.iter().any(|(_, p)| !p.is_done()) {
        if rec.pump(&mut transfers, byte_limit, budget)? > 0 {
            transfer_frames += 1;
        }

        let step = u16::try_from(frame % 30).unwrap_or_default();
        let angle = f32::from(step) / 30.0 * TAU;
        let orbit = Vec3::new(24.0 + angle.cos() * 10.0, 24.0 + angle.sin() * 10.0, 3.0);
        let marker = Sphere::new(4)
            .with_category(CATEGORY_MARKERS)
            .with_position(orbit)
            .with_colour(Colour::YELLOW);
        if frame == 0 {
            rec.create(&marker)?;
        } else {
            rec.update(&marker)?;
        }
        rec.create(&Star::new(0).with_category(CATEGORY_MARKERS).with_position(orbit))?;
        rec.create(&Text2D::new(0, format!("frame {frame}")).with_category(CATEGORY_LABELS))?;
        rec.control(ControlId::EndFrame, 0)?;
        frame += 1;
    }

    // Hide the scene branch for the closing frame.
    rec.message(
        routing::CATEGORY,
        CategoryMessageId::Active.raw(),
        &CategoryActiveMessage {
            category_id: CATEGORY_SCENE,
            active: false,
        },
    )?;
    rec.control(ControlId::EndFrame, 0)?;
    rec.control(ControlId::End, 0)?;

    Ok(DemoSummary {
        frames: frame + 1,
        packets: rec.packets,
        bytes: rec.bytes,
        transfer_frames,
    })
}
