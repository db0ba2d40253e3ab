// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use std::io::Cursor;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use vantage_proto::{
    routing, CategoryActiveMessage, CategoryMessageId, CategoryNameMessage, Colour, ControlId,
    ControlMessage, ErrorCode, MeshDrawType, PacketSink, PacketStreamReader, PacketWriter,
    ResourceKey, ServerInfoMessage, ShapeKind, WireMessage,
};
use vantage_scene_codec::{MockAdapter, SceneDecoder};
use vantage_shapes::{
    DataStatus, MeshHandle, MeshResource, MeshSet, MeshShape, Renderable,
    Resource, Shape, ShapeBuilder, SimpleMesh, Sphere, Text3D, TransferProgress,
};

struct Sender {
    w: PacketWriter,
    out: Vec<u8>,
}

impl Sender {
    fn new() -> Self {
        Self {
            w: PacketWriter::default(),
            out: Vec::new(),
        }
    }

    fn flush(&mut self) {
        let frame = self.w.finish();
        self.out.send(&frame).unwrap();
    }

    fn message<M: WireMessage>(&mut self, routing_id: u16, message_id: u16, msg: &M) {
        self.w.reset(routing_id, message_id);
        msg.write(&mut self.w).unwrap();
        self.flush();
    }

    fn shape(&mut self, shape: &dyn Renderable) {
        shape.write_create(&mut self.w).unwrap();
        self.flush();
        if shape.is_complex() {
            let mut progress = 0;
            while shape.write_data(&mut self.w, &mut progress).unwrap() == DataStatus::More {
                self.flush();
            }
            self.flush();
        }
    }

    fn resource(&mut self, mesh: &dyn MeshResource, byte_limit: usize) {
        mesh.write_resource_create(&mut self.w).unwrap();
        self.flush();
        let mut progress = TransferProgress::default();
        while !progress.is_done() {
            progress = mesh.transfer(&mut self.w, byte_limit, progress);
            assert!(!progress.failed);
            self.flush();
        }
    }

    fn control(&mut self, id: ControlId, flags: u32) {
        self.message(
            routing::CONTROL,
            id.raw(),
            &ControlMessage {
                control_flags: flags,
                ..ControlMessage::default()
            },
        );
    }
}

fn big_mesh() -> SimpleMesh {
    let vertices: Vec<Vec3> = (0..9000u16).map(|i| Vec3::splat(f32::from(i))).collect();
    SimpleMesh::new(21, MeshDrawType::Triangles)
        .with_indices((0..9000).collect())
        .with_colours(vec![Colour::RED; vertices.len()])
        .with_vertices(vertices)
}

#[test]
fn recorded_scene_rebuilds_on_the_receiver() {
    let mesh = big_mesh();
    let handle: MeshHandle = Arc::new(mesh.clone());
    let mut tx = Sender::new();
    tx.message(routing::SERVER_INFO, 0, &ServerInfoMessage::default());
    tx.message(
        routing::CATEGORY,
        CategoryMessageId::Name.raw(),
        &CategoryNameMessage {
            category_id: 1,
            parent_id: 0,
            default_active: true,
            name: "debug".into(),
        },
    );
    // The set arrives before its mesh and is resolved on finalise.
    tx.shape(&MeshSet::new(30).with_part(Arc::clone(&handle), Mat4::IDENTITY, Colour::WHITE));
    tx.resource(&mesh, 16 * 1024);
    tx.shape(&Sphere::new(1).with_category(1).with_position(Vec3::X));
    tx.shape(&Text3D::new(0, "transient"));
    tx.shape(
        &MeshShape::new(2, MeshDrawType::Points).with_vertices(vec![Vec3::ONE; 10_000]),
    );
    tx.control(ControlId::EndFrame, 0);
    tx.message(
        routing::CATEGORY,
        CategoryMessageId::Active.raw(),
        &CategoryActiveMessage {
            category_id: 1,
            active: false,
        },
    );
    tx.control(ControlId::EndFrame, 0);
    tx.control(ControlId::End, 0);

    let mut stream = PacketStreamReader::new(Cursor::new(tx.out));
    let mut dec = SceneDecoder::new(MockAdapter::new());
    dec.consume(&mut stream).unwrap();

    assert!(dec.is_ended());
    assert_eq!(dec.stats().rejected(), 0, "{:?}", dec.stats().errors);
    assert_eq!(stream.stats().crc_failures, 0);
    assert_eq!(dec.frame(), 2);

    let remote = dec.resources().get(ResourceKey::mesh(21)).unwrap();
    assert_eq!(remote.vertices(), mesh.vertices());
    assert_eq!(remote.colours(), mesh.colours());
    assert_eq!(remote.indices().len(), 9000);

    let port = dec.port();
    assert_eq!(port.meshes[&21], 9000);
    let set = port.get_shape(ShapeKind::MeshSet.routing_id(), 30).unwrap();
    assert_eq!(set.resources, 1);
    assert_eq!(port.server_info, Some(ServerInfoMessage::default()));
    // Frame one shows the set, sphere, text and mesh; frame two hides category 1.
    assert_eq!(port.render_count, 2);
    assert_eq!(port.last_visible, 2);
    assert!(port.transients.is_empty());

    match dec.shapes().get(ShapeKind::MeshShape.routing_id(), 2).unwrap() {
        Shape::Mesh(inline) => assert_eq!(inline.vertices(), &[Vec3::ONE; 10_000][..]),
        other => panic!("expected a mesh shape, got {:?}", other.kind()),
    }
}

#[test]
fn semantic_errors_do_not_stop_the_stream() {
    let mut tx = Sender::new();
    tx.shape(&Sphere::new(5));
    tx.shape(&Sphere::new(5));
    tx.message(
        ShapeKind::Sphere.routing_id(),
        3,
        &vantage_proto::DestroyMessage { object_id: 77 },
    );
    tx.message(routing::MATERIAL, 0, &ControlMessage::default());
    tx.shape(&Sphere::new(6));
    tx.control(ControlId::EndFrame, 0);

    let mut stream = PacketStreamReader::new(Cursor::new(tx.out));
    let mut dec = SceneDecoder::new(MockAdapter::new());
    dec.consume(&mut stream).unwrap();

    let errors = &dec.stats().errors;
    assert_eq!(errors[&ErrorCode::DuplicateShape], 1);
    assert_eq!(errors[&ErrorCode::InvalidObjectId], 1);
    assert_eq!(errors[&ErrorCode::UnknownMessageHandler], 1);
    assert_eq!(dec.shapes().persistent_len(), 2);
    assert_eq!(dec.port().render_count, 1);
}

#[test]
fn destroyed_meshes_leave_the_table() {
    let mesh = SimpleMesh::new(4, MeshDrawType::Points).with_vertices(vec![Vec3::Z; 3]);
    let mut tx = Sender::new();
    tx.resource(&mesh, 0);
    mesh.write_resource_destroy(&mut tx.w).unwrap();
    tx.flush();

    let mut dec = SceneDecoder::new(MockAdapter::new());
    dec.consume(&mut PacketStreamReader::new(Cursor::new(tx.out))).unwrap();
    assert_eq!(dec.resources().ready_len(), 0);
    assert!(dec.port().meshes.is_empty());
    assert_eq!(dec.stats().rejected(), 0);
}
