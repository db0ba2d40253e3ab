// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connection-scoped decoder: packets in, scene events out.
//!
//! The decoder owns the shape registry, the mesh resource table and the
//! category tree for one connection. Each packet is routed by its routing
//! id; a rejected message is logged, counted by [`ErrorCode`] and returned,
//! and the decoder stays usable for the next packet.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use vantage_proto::{
    collated_frames, routing, CameraMessage, CategoryActiveMessage, CategoryMessageId,
    CategoryNameMessage, ControlId, ControlMessage, CoordinateFrame, DataMessage, DestroyMessage,
    EndFrameFlags, ErrorCode, MeshCreateMessage, MeshDestroyMessage, MeshFinaliseMessage,
    MeshMessageId, ObjectMessageId, Packet, PacketReader, PacketStreamReader, ProtocolError,
    ResourceKey, ServerInfoMessage, ShapeKind, TransportError, UpdateMessage, WireMessage,
};
use vantage_scene_port::{ApplyError, CategoryInfo, CategoryTree, SceneEvent, ScenePort};
use vantage_shapes::Shape;

use crate::registry::ShapeRegistry;
use crate::resources::ResourceTable;

/// Why a packet was not applied.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The packet broke a protocol rule.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The renderer refused the resulting event.
    #[error(transparent)]
    Port(#[from] ApplyError),
}

/// Counters kept by [`SceneDecoder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Packets offered to the decoder.
    pub packets: u64,
    /// Packets applied without error.
    pub applied: u64,
    /// Packets per routing id.
    pub by_routing: BTreeMap<u16, u64>,
    /// Rejected messages per error code.
    pub errors: BTreeMap<ErrorCode, u64>,
    /// Events the renderer refused.
    pub port_errors: u64,
    /// Transient shapes skipped because transients are ignored.
    pub ignored_transients: u64,
}

impl DecoderStats {
    /// Total rejected messages.
    pub fn rejected(&self) -> u64 {
        self.errors.values().sum::<u64>() + self.port_errors
    }
}

/// Rebuilds scene state from packets and drives a [`ScenePort`].
#[derive(Debug)]
pub struct SceneDecoder<P> {
    port: P,
    shapes: ShapeRegistry,
    resources: ResourceTable,
    categories: CategoryTree,
    cameras: BTreeMap<u8, CameraMessage>,
    server_info: ServerInfoMessage,
    total_frames: Option<u32>,
    frame: u64,
    ended: bool,
    ignore_transient: bool,
    stats: DecoderStats,
}

impl<P: ScenePort> SceneDecoder<P> {
    /// Decoder with empty state.
    pub fn new(port: P) -> Self {
        Self {
            port,
            shapes: ShapeRegistry::new(),
            resources: ResourceTable::new(),
            categories: CategoryTree::new(),
            cameras: BTreeMap::new(),
            server_info: ServerInfoMessage::default(),
            total_frames: None,
            frame: 0,
            ended: false,
            ignore_transient: false,
            stats: DecoderStats::default(),
        }
    }

    /// Skip transient shapes and their data.
    pub fn with_ignore_transient(mut self, ignore: bool) -> Self {
        self.ignore_transient = ignore;
        self
    }

    /// Apply one packet.
    pub fn handle_packet(&mut self, packet: &Packet<'_>) -> Result<(), DecodeError> {
        self.stats.packets += 1;
        *self.stats.by_routing.entry(packet.routing_id()).or_default() += 1;
        let result = self.dispatch(packet);
        match &result {
            Ok(()) => self.stats.applied += 1,
            Err(DecodeError::Protocol(err)) => {
                *self.stats.errors.entry(err.code()).or_default() += 1;
                warn!(
                    routing_id = packet.routing_id(),
                    message_id = packet.message_id(),
                    code = err.code().label(),
                    error = %err,
                    "message rejected"
                );
            }
            Err(DecodeError::Port(err)) => {
                self.stats.port_errors += 1;
                warn!(routing_id = packet.routing_id(), error = %err, "renderer rejected event");
            }
        }
        result
    }

    /// Decode packets until the stream ends or an end control arrives.
    ///
    /// Rejected messages are counted and skipped; only transport failures
    /// stop the loop early.
    pub fn consume<R: Read>(&mut self, stream: &mut PacketStreamReader<R>) -> Result<(), TransportError> {
        while !self.ended {
            let Some(packet) = stream.next_packet()? else {
                break;
            };
            let _ = self.handle_packet(&packet.as_packet());
        }
        Ok(())
    }

    fn dispatch(&mut self, packet: &Packet<'_>) -> Result<(), DecodeError> {
        let mut r = packet.reader();
        match packet.routing_id() {
            routing::SERVER_INFO => self.server_info_message(&mut r),
            routing::CONTROL => self.control(packet.message_id(), &mut r),
            routing::COLLATED_PACKET => self.collated(&mut r),
            routing::MESH => self.mesh(packet.message_id(), &mut r),
            routing::CAMERA => self.camera_message(&mut r),
            routing::CATEGORY => self.category(packet.message_id(), &mut r),
            id => match ShapeKind::from_routing_id(id) {
                Some(_) => self.shape(id, packet.message_id(), &mut r),
                None => Err(ProtocolError::UnknownMessageHandler(id).into()),
            },
        }
    }

    fn server_info_message(&mut self, r: &mut PacketReader<'_>) -> Result<(), DecodeError> {
        self.server_info = ServerInfoMessage::read(r)?;
        info!(
            time_unit = self.server_info.time_unit,
            frame_time = self.server_info.default_frame_time,
            "server info"
        );
        self.port.apply_event(&SceneEvent::ServerInfo(self.server_info))?;
        Ok(())
    }

    /// Apply each nested frame as if it arrived on its own.
    ///
    /// Nested packets are counted and reported individually; the collated
    /// packet itself fails only when its framing is broken.
    fn collated(&mut self, r: &mut PacketReader<'_>) -> Result<(), DecodeError> {
        let mut applied = 0usize;
        for nested in collated_frames(r)? {
            let packet = nested?;
            if packet.routing_id() == routing::COLLATED_PACKET {
                return Err(ProtocolError::InvalidContent("collated packets do not nest").into());
            }
            if self.handle_packet(&packet).is_ok() {
                applied += 1;
            }
            if self.ended {
                break;
            }
        }
        debug!(applied, "collated packet");
        Ok(())
    }

    // Camera messages ignore the message id.
    fn camera_message(&mut self, r: &mut PacketReader<'_>) -> Result<(), DecodeError> {
        let msg = CameraMessage::read(r)?;
        self.cameras.insert(msg.camera_id, msg);
        self.port.apply_event(&SceneEvent::Camera(msg))?;
        Ok(())
    }

    fn control(&mut self, message_id: u16, r: &mut PacketReader<'_>) -> Result<(), DecodeError> {
        let id = ControlId::from_raw(message_id).ok_or(ProtocolError::InvalidMessageId {
            routing_id: routing::CONTROL,
            message_id,
        })?;
        let msg = ControlMessage::read(r)?;
        match id {
            ControlId::EndFrame => {
                let persist = EndFrameFlags::from_bits(msg.control_flags).persist();
                self.port.render(self.categories.state());
                let dropped = self.shapes.end_frame(persist);
                debug!(frame = self.frame, dropped, persist, "end of frame");
                self.port.apply_event(&SceneEvent::FrameEnded {
                    frame: self.frame,
                    persist,
                })?;
                self.frame += 1;
            }
            ControlId::ForceFrameFlush => self.port.render(self.categories.state()),
            ControlId::CoordinateFrame => {
                let frame = u8::try_from(msg.value32)
                    .ok()
                    .and_then(CoordinateFrame::from_raw)
                    .ok_or(ProtocolError::InvalidContent("unknown coordinate frame"))?;
                self.server_info.coordinate_frame = frame;
                self.port.apply_event(&SceneEvent::CoordinateFrameChanged(frame))?;
            }
            ControlId::FrameCount => self.total_frames = Some(msg.value32),
            ControlId::Reset => {
                self.reset();
                self.port.apply_event(&SceneEvent::Reset)?;
            }
            ControlId::Keyframe => debug!(frame = msg.value32, "keyframe"),
            ControlId::End => {
                info!(frames = self.frame, "end of stream");
                self.ended = true;
            }
        }
        Ok(())
    }

    fn category(&mut self, message_id: u16, r: &mut PacketReader<'_>) -> Result<(), DecodeError> {
        let id = CategoryMessageId::from_raw(message_id).ok_or(ProtocolError::InvalidMessageId {
            routing_id: routing::CATEGORY,
            message_id,
        })?;
        match id {
            CategoryMessageId::Name => {
                let msg = CategoryNameMessage::read(r)?;
                self.categories.define(CategoryInfo::from(&msg));
                self.port.apply_event(&SceneEvent::CategoryChanged {
                    category_id: msg.category_id,
                    active: msg.default_active,
                })?;
            }
            CategoryMessageId::Active => {
                let msg = CategoryActiveMessage::read(r)?;
                for category_id in self.categories.set_active(msg.category_id, msg.active) {
                    self.port.apply_event(&SceneEvent::CategoryChanged {
                        category_id,
                        active: msg.active,
                    })?;
                }
            }
        }
        Ok(())
    }

    fn mesh(&mut self, message_id: u16, r: &mut PacketReader<'_>) -> Result<(), DecodeError> {
        let id = MeshMessageId::from_raw(message_id).ok_or(ProtocolError::InvalidMessageId {
            routing_id: routing::MESH,
            message_id,
        })?;
        match id {
            MeshMessageId::Create => self.resources.create(&MeshCreateMessage::read(r)?),
            MeshMessageId::Redefine => self.resources.redefine(&MeshCreateMessage::read(r)?)?,
            MeshMessageId::Vertex
            | MeshMessageId::Index
            | MeshMessageId::VertexColour
            | MeshMessageId::Normal
            | MeshMessageId::Uv => {
                self.resources.component(id, r)?;
            }
            MeshMessageId::Finalise => {
                let msg = MeshFinaliseMessage::read(r)?;
                let mesh = Arc::clone(self.resources.finalise(&msg)?);
                self.port.apply_event(&SceneEvent::ResourceFinalised(&*mesh))?;
                // Shapes that arrived before the mesh now point at it.
                let mut resolved = 0;
                for shape in self.shapes.iter_mut() {
                    if self.resources.resolve_shape(shape) > 0 {
                        resolved += 1;
                        self.port.apply_event(&SceneEvent::ShapeUpdated(&*shape))?;
                    }
                }
                debug!(mesh_id = msg.mesh_id, resolved, "mesh finalised");
            }
            MeshMessageId::Destroy => {
                let msg = MeshDestroyMessage::read(r)?;
                self.resources.destroy(msg.mesh_id)?;
                self.port
                    .apply_event(&SceneEvent::ResourceDestroyed(ResourceKey::mesh(msg.mesh_id)))?;
            }
        }
        Ok(())
    }

    fn shape(&mut self, routing_id: u16, message_id: u16, r: &mut PacketReader<'_>) -> Result<(), DecodeError> {
        let id = ObjectMessageId::from_raw(message_id).ok_or(ProtocolError::InvalidMessageId {
            routing_id,
            message_id,
        })?;
        match id {
            ObjectMessageId::Create => {
                let mut shape = Shape::read_create(routing_id, r)?;
                if self.ignore_transient && shape.object_id() == 0 {
                    self.stats.ignored_transients += 1;
                    return Ok(());
                }
                self.resources.resolve_shape(&mut shape);
                let shape = self.shapes.create(shape)?;
                self.port.apply_event(&SceneEvent::ShapeCreated(&*shape))?;
            }
            ObjectMessageId::Update => {
                let msg = UpdateMessage::read(r)?;
                let shape = self.shapes.update(routing_id, &msg)?;
                self.port.apply_event(&SceneEvent::ShapeUpdated(shape))?;
            }
            ObjectMessageId::Destroy => {
                let msg = DestroyMessage::read(r)?;
                self.shapes.destroy(routing_id, msg.object_id)?;
                self.port.apply_event(&SceneEvent::ShapeDestroyed {
                    routing_id,
                    object_id: msg.object_id,
                })?;
            }
            ObjectMessageId::Data => {
                let msg = DataMessage::read(r)?;
                if self.ignore_transient && msg.object_id == 0 {
                    return Ok(());
                }
                let (shape, _) = self.shapes.data(routing_id, msg.object_id, r)?;
                self.resources.resolve_shape(shape);
                self.port.apply_event(&SceneEvent::ShapeUpdated(&*shape))?;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.shapes.reset();
        self.resources.clear();
        self.categories.reset();
        self.cameras.clear();
        self.frame = 0;
        self.total_frames = None;
    }

    /// The renderer.
    pub const fn port(&self) -> &P {
        &self.port
    }

    /// The renderer, mutably.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the decoder, returning the renderer.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Live shapes.
    pub const fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    /// Mesh resources.
    pub const fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    /// Category names and activation state.
    pub const fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    /// Latest view of a camera.
    pub fn camera(&self, camera_id: u8) -> Option<&CameraMessage> {
        self.cameras.get(&camera_id)
    }

    /// Latest server info, or the defaults.
    pub const fn server_info(&self) -> ServerInfoMessage {
        self.server_info
    }

    /// Frames completed since the last reset.
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Frame count announced by a recording, if any.
    pub const fn total_frames(&self) -> Option<u32> {
        self.total_frames
    }

    /// True once an end control has arrived.
    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    /// Counters so far.
    pub const fn stats(&self) -> &DecoderStats {
        &self.stats
    }
}
