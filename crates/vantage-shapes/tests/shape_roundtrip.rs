// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vantage_proto::{
    decode_packet, Colour, DataMessage, MeshDrawType, ObjectFlags, ObjectMessageId, PacketWriter,
    ShapeKind, UpdateMessage, WireMessage,
};
use vantage_shapes::{
    Arrow, BoxShape, Capsule, Cone, Cylinder, DataStatus, MeshHandle, MeshResource, MeshSet,
    MeshShape, MultiShape, Plane, PointCloud, PointCloudShape, Pose, Renderable, Shape, ShapeBuilder,
    SimpleMesh, Sphere, Star, Text2D, Text3D,
};

fn one_of_each() -> Vec<Shape> {
    let mesh: MeshHandle = Arc::new(
        SimpleMesh::new(7, MeshDrawType::Triangles).with_vertices(vec![Vec3::ZERO; 3]),
    );
    let cloud: MeshHandle = Arc::new(PointCloud::new(8, vec![Vec3::X, Vec3::Y]));
    vec![
        Sphere::new(1).with_radius(0.5).with_position(Vec3::ONE).into(),
        BoxShape::new(2).with_extents(Vec3::new(1.0, 2.0, 3.0)).into(),
        Cone::new(3).with_angle(0.3).with_direction(Vec3::X).into(),
        Cylinder::from_points(4, Vec3::ZERO, Vec3::Y, 0.2).into(),
        Capsule::from_points(5, Vec3::ZERO, Vec3::NEG_Z, 0.1).into(),
        Plane::new(6).with_normal(Vec3::Y).with_size(3.0).into(),
        Star::new(7).with_radius(0.25).with_colour(Colour::YELLOW).into(),
        Arrow::from_points(8, Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)).into(),
        Pose::from_parts(9, Vec3::X, Vec3::ONE, Quat::from_rotation_y(1.0)).into(),
        MeshShape::new(10, MeshDrawType::Lines)
            .with_vertices(vec![Vec3::ZERO, Vec3::ONE])
            .with_indices(vec![0, 1])
            .with_colours(vec![Colour::RED, Colour::BLUE])
            .into(),
        MeshSet::new(11).with_part(mesh, Mat4::from_translation(Vec3::Z), Colour::GREEN).into(),
        PointCloudShape::new(12, cloud).with_indices(vec![1, 0, 1]).into(),
        Text3D::new(13, "world").with_font_size(20.0).with_facing(Vec3::X).into(),
        Text2D::new(14, "screen").with_world_space(true).into(),
        MultiShape::from_shapes(&[Sphere::new(15), Sphere::new(15).with_position(Vec3::Y)])
            .unwrap()
            .into(),
    ]
}

/// Every message a sender emits to create `shape`, in order.
fn create_frames(shape: &Shape) -> Vec<Vec<u8>> {
    let mut w = PacketWriter::default();
    shape.write_create(&mut w).unwrap();
    let mut frames = vec![w.finish().to_vec()];
    if shape.is_complex() {
        let mut progress = 0;
        loop {
            let status = shape.write_data(&mut w, &mut progress).unwrap();
            frames.push(w.finish().to_vec());
            if status == DataStatus::Done {
                break;
            }
        }
    }
    frames
}

fn rebuild(frames: &[Vec<u8>]) -> Shape {
    let (packet, _) = decode_packet(&frames[0]).unwrap();
    assert_eq!(packet.message_id(), ObjectMessageId::Create.raw());
    let mut r = packet.reader();
    let mut shape = Shape::read_create(packet.routing_id(), &mut r).unwrap();
    assert!(r.is_empty());
    for frame in &frames[1..] {
        let (packet, _) = decode_packet(frame).unwrap();
        let mut r = packet.reader();
        let data = DataMessage::read(&mut r).unwrap();
        assert_eq!(data.object_id, shape.object_id());
        shape.read_data(&mut r).unwrap();
    }
    shape
}

#[test]
fn every_kind_round_trips_through_create() {
    let shapes = one_of_each();
    let kinds: Vec<ShapeKind> = shapes.iter().filter_map(Shape::kind).collect();
    for kind in ShapeKind::ALL {
        assert!(kinds.contains(&kind), "missing {}", kind.name());
    }
    for shape in &shapes {
        let frames = create_frames(shape);
        let rebuilt = rebuild(&frames);
        assert_eq!(rebuilt.routing_id(), shape.routing_id());
        assert_eq!(rebuilt.core(), shape.core());
        // Re-encoding the received shape must reproduce the sender's bytes.
        assert_eq!(create_frames(&rebuilt), frames, "{:?}", shape.kind());
    }
}

#[test]
fn update_and_destroy_are_identity_scoped() {
    for shape in one_of_each() {
        let mut w = PacketWriter::default();
        shape.write_destroy(&mut w).unwrap();
        let frame = w.finish();
        let (packet, _) = decode_packet(&frame).unwrap();
        assert_eq!(packet.payload, shape.object_id().to_le_bytes());

        shape.write_update(&mut w).unwrap();
        let frame = w.finish();
        let (packet, _) = decode_packet(&frame).unwrap();
        let update = UpdateMessage::read(&mut packet.reader()).unwrap();
        assert_eq!(update.object_id, shape.object_id());
        assert_eq!(update.attributes, shape.core().attributes);
    }
}

#[test]
fn random_partial_updates_touch_only_selected_groups() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..200 {
        let mut shape: Shape = Sphere::new(1).with_colour(Colour::BLUE).into();
        let before = shape.core().attributes;
        let mut flags = ObjectFlags::from_bits(ObjectFlags::UPDATE_MODE);
        for bit in [
            ObjectFlags::POSITION,
            ObjectFlags::ROTATION,
            ObjectFlags::SCALE,
            ObjectFlags::COLOUR,
        ] {
            flags = flags.with(bit, rng.gen_bool(0.5));
        }
        let mut update = UpdateMessage {
            object_id: 1,
            flags,
            attributes: before,
        };
        update.attributes.position = Vec3::new(rng.gen(), rng.gen(), rng.gen());
        update.attributes.rotation = Quat::from_rotation_z(rng.gen_range(0.1..3.0));
        update.attributes.scale = Vec3::splat(rng.gen_range(2.0..4.0));
        update.attributes.colour = Colour(rng.gen());

        shape.apply_update(&update);
        let after = shape.core().attributes;
        let pick = |bit: u16| flags.contains(bit);
        assert_eq!(
            after.position,
            if pick(ObjectFlags::POSITION) { update.attributes.position } else { before.position }
        );
        assert_eq!(
            after.rotation,
            if pick(ObjectFlags::ROTATION) { update.attributes.rotation } else { before.rotation }
        );
        assert_eq!(
            after.scale,
            if pick(ObjectFlags::SCALE) { update.attributes.scale } else { before.scale }
        );
        assert_eq!(
            after.colour,
            if pick(ObjectFlags::COLOUR) { update.attributes.colour } else { before.colour }
        );
    }
}

#[test]
fn clone_is_deep_for_inline_data() {
    let original = MeshShape::new(1, MeshDrawType::Points).with_vertices(vec![Vec3::X; 4]);
    let copy = original.clone().with_vertices(vec![Vec3::Y; 2]);
    assert_eq!(original.vertices().len(), 4);
    assert_eq!(copy.vertices().len(), 2);
}

#[derive(Debug, Clone)]
struct Attrs {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    colour: u32,
    category: u16,
    flags: u16,
}

#[derive(Debug, Clone)]
struct Geometry {
    draw: MeshDrawType,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    coloured: bool,
}

fn vec3(range: std::ops::Range<f32>) -> impl Strategy<Value = Vec3> {
    (range.clone(), range.clone(), range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn unit_rotation() -> impl Strategy<Value = Quat> {
    (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
        .prop_filter("degenerate quaternion", |(x, y, z, w)| x * x + y * y + z * z + w * w > 0.01)
        .prop_map(|(x, y, z, w)| Quat::from_xyzw(x, y, z, w).normalize())
}

fn attrs() -> impl Strategy<Value = Attrs> {
    (
        vec3(-1.0e4..1.0e4),
        unit_rotation(),
        vec3(0.001..1.0e3),
        any::<u32>(),
        any::<u16>(),
        (any::<bool>(), any::<bool>(), any::<bool>()),
    )
        .prop_map(|(position, rotation, scale, colour, category, (wire, transparent, two_sided))| {
            let flags = ObjectFlags::NONE
                .with(ObjectFlags::WIREFRAME, wire)
                .with(ObjectFlags::TRANSPARENT, transparent)
                .with(ObjectFlags::TWO_SIDED, two_sided);
            Attrs {
                position,
                rotation,
                scale,
                colour,
                category,
                flags: flags.bits(),
            }
        })
}

fn geometry() -> impl Strategy<Value = Geometry> {
    (
        prop_oneof![
            Just(MeshDrawType::Points),
            Just(MeshDrawType::Lines),
            Just(MeshDrawType::Triangles),
            Just(MeshDrawType::Voxels),
        ],
        prop::collection::vec(vec3(-500.0..500.0), 1..400),
        prop::collection::vec(any::<u32>(), 0..400),
        any::<bool>(),
    )
        .prop_map(|(draw, vertices, indices, coloured)| Geometry {
            draw,
            vertices,
            indices,
            coloured,
        })
}

fn build(kind: ShapeKind, id: u32, text: &str, geo: &Geometry) -> Shape {
    match kind {
        ShapeKind::Sphere => Sphere::new(id).into(),
        ShapeKind::Box => BoxShape::new(id).into(),
        ShapeKind::Cone => Cone::new(id).into(),
        ShapeKind::Cylinder => Cylinder::new(id).into(),
        ShapeKind::Capsule => Capsule::new(id).into(),
        ShapeKind::Plane => Plane::new(id).into(),
        ShapeKind::Star => Star::new(id).into(),
        ShapeKind::Arrow => Arrow::new(id).into(),
        ShapeKind::Pose => Pose::new(id).into(),
        ShapeKind::MeshShape => {
            let mut mesh = MeshShape::new(id, geo.draw)
                .with_vertices(geo.vertices.clone())
                .with_indices(geo.indices.clone());
            if geo.coloured {
                let colours = (0u32..).take(geo.vertices.len()).map(|i| Colour(0xFF00_0000 | i));
                mesh = mesh.with_colours(colours.collect());
            }
            mesh.into()
        }
        ShapeKind::MeshSet => {
            let mesh: MeshHandle = Arc::new(
                SimpleMesh::new(id.wrapping_add(1), geo.draw).with_vertices(geo.vertices.clone()),
            );
            MeshSet::new(id).with_part(mesh, Mat4::from_translation(geo.vertices[0]), Colour::GREEN).into()
        }
        ShapeKind::PointCloud => {
            let len = u32::try_from(geo.vertices.len()).unwrap();
            let cloud: MeshHandle = Arc::new(PointCloud::new(id.wrapping_add(1), geo.vertices.clone()));
            PointCloudShape::new(id, cloud)
                .with_indices(geo.indices.iter().map(|i| i % len).collect())
                .into()
        }
        ShapeKind::Text3D => Text3D::new(id, text).into(),
        ShapeKind::Text2D => Text2D::new(id, text).into(),
    }
}

fn dress(shape: Shape, a: &Attrs) -> Shape {
    shape
        .with_position(a.position)
        .with_rotation(a.rotation)
        .with_scale(a.scale)
        .with_colour(Colour(a.colour))
        .with_category(a.category)
        .with_flag(a.flags, true)
}

proptest! {
    #[test]
    fn random_shapes_survive_encode_and_decode(
        kind in prop::sample::select(ShapeKind::ALL.to_vec()),
        id in 1u32..,
        a in attrs(),
        text in "\\PC{0,48}",
        geo in geometry(),
    ) {
        let shape = dress(build(kind, id, &text, &geo), &a);
        let frames = create_frames(&shape);
        let rebuilt = rebuild(&frames);

        prop_assert_eq!(rebuilt.kind(), Some(kind));
        prop_assert_eq!(rebuilt.core(), shape.core());
        match (&rebuilt, &shape) {
            (Shape::Mesh(got), Shape::Mesh(sent)) => prop_assert_eq!(got, sent),
            (Shape::Text3D(got), Shape::Text3D(sent)) => prop_assert_eq!(got, sent),
            (Shape::Text2D(got), Shape::Text2D(sent)) => prop_assert_eq!(got, sent),
            (Shape::PointCloud(got), Shape::PointCloud(sent)) => {
                prop_assert_eq!(got.indices(), sent.indices());
                prop_assert_eq!(got.cloud().id(), sent.cloud().id());
            }
            (Shape::MeshSet(got), Shape::MeshSet(sent)) => {
                prop_assert_eq!(got.parts().len(), sent.parts().len());
                prop_assert_eq!(got.parts()[0].resource_id(), sent.parts()[0].resource_id());
                prop_assert_eq!(got.parts()[0].transform, sent.parts()[0].transform);
                prop_assert_eq!(got.parts()[0].colour, sent.parts()[0].colour);
            }
            _ => {}
        }
        prop_assert_eq!(create_frames(&rebuilt), frames);
    }
}
