use cgmath::Vector3;
use instant::Instant;
use spatial_ngin::{
    config::PortalConfig,
    context::Context,
    data_structures::mesh::WHITE,
    flows::{
        anchors::PlaneMirror,
        portal::{CeilingPortal, PortalPhase},
    },
    render::Render,
    tracking::{AnchorEventKind, AnchorId, PlaneClassification},
};

use crate::common::test_utils::{
    EPSILON, assert_near, assert_vec_near, at, init_flow, plane_event, test_config, track, update_flow,
};

mod common;

fn context() -> Context {
    Context::new(test_config(), Instant::now())
}

#[test]
fn planes_are_mirrored_with_their_classification_color() {
    let mut ctx = context();
    let mut mirror = PlaneMirror::new();
    init_flow::<(), _>(&mut mirror, &mut ctx);
    let root = mirror.root().unwrap();
    let now = ctx.now;

    let wall = plane_event(
        5,
        AnchorEventKind::Added,
        PlaneClassification::Wall,
        2.0,
        1.5,
        Vector3::new(0.0, 1.0, -2.0),
    );
    let _: Vec<()> = track(&mut mirror, &mut ctx, &wall, now);
    assert_eq!(mirror.len(), 1);

    let mirrored = *mirror.get(AnchorId(5)).unwrap();
    let entity = ctx.scene.node(mirrored.entity).unwrap();
    assert_eq!(entity.name, "anchor-5");
    assert_eq!(ctx.scene.parent(mirrored.entity), Some(root));
    assert_vec_near(entity.local().position, Vector3::new(0.0, 1.0, -2.0), EPSILON);

    let plane = ctx.scene.node(mirrored.plane).unwrap();
    let material = plane.material().unwrap();
    assert_eq!(material.color, PlaneClassification::Wall.color());
    assert!(material.unlit);
    let extents = ctx.scene.mesh(mirrored.mesh).unwrap().bounds().extents();
    assert_near(extents.x, 2.0, EPSILON);
    assert_near(extents.z, 1.5, EPSILON);
}

#[test]
fn updates_reuse_the_entity_and_replace_the_mesh() {
    let mut ctx = context();
    let mut mirror = PlaneMirror::new();
    init_flow::<(), _>(&mut mirror, &mut ctx);
    let now = ctx.now;
    let position = Vector3::new(0.0, 0.0, 0.0);

    let added = plane_event(1, AnchorEventKind::Added, PlaneClassification::Floor, 1.0, 1.0, position);
    let _: Vec<()> = track(&mut mirror, &mut ctx, &added, now);
    let before = *mirror.get(AnchorId(1)).unwrap();
    ctx.scene.drain_render();

    let updated = plane_event(
        1,
        AnchorEventKind::Updated,
        PlaneClassification::Floor,
        3.0,
        2.0,
        Vector3::new(0.5, 0.0, 0.0),
    );
    let _: Vec<()> = track(&mut mirror, &mut ctx, &updated, now);
    assert_eq!(mirror.len(), 1);
    assert_eq!(*mirror.get(AnchorId(1)).unwrap(), before);
    assert_near(
        ctx.scene.mesh(before.mesh).unwrap().bounds().extents().x,
        3.0,
        EPSILON,
    );
    assert!(ctx.scene.drain_render().contains(&Render::Mesh {
        node: before.plane,
        mesh: before.mesh
    }));
    assert_vec_near(
        ctx.scene.local_transform(before.entity).unwrap().position,
        Vector3::new(0.5, 0.0, 0.0),
        EPSILON,
    );
}

#[test]
fn removal_detaches_and_windows_are_skipped() {
    let mut ctx = context();
    let mut mirror = PlaneMirror::new();
    init_flow::<(), _>(&mut mirror, &mut ctx);
    let now = ctx.now;
    let origin = Vector3::new(0.0, 0.0, 0.0);

    let window = plane_event(2, AnchorEventKind::Added, PlaneClassification::Window, 1.0, 1.0, origin);
    let _: Vec<()> = track(&mut mirror, &mut ctx, &window, now);
    assert!(mirror.is_empty());

    let table = plane_event(3, AnchorEventKind::Added, PlaneClassification::Table, 1.0, 1.0, origin);
    let _: Vec<()> = track(&mut mirror, &mut ctx, &table, now);
    let mirrored = *mirror.get(AnchorId(3)).unwrap();
    ctx.scene.drain_render();

    let removed = plane_event(3, AnchorEventKind::Removed, PlaneClassification::Table, 1.0, 1.0, origin);
    let _: Vec<()> = track(&mut mirror, &mut ctx, &removed, now);
    assert!(mirror.is_empty());
    assert!(!ctx.scene.contains(mirrored.entity));
    assert!(!ctx.scene.contains(mirrored.plane));
    assert_eq!(
        ctx.scene.drain_render(),
        vec![Render::Detach {
            node: mirrored.entity
        }]
    );

    // unknown removals are ignored
    let _: Vec<()> = track(&mut mirror, &mut ctx, &removed, now);
    assert!(ctx.scene.drain_render().is_empty());
}

#[test]
fn portal_opens_in_the_largest_ceiling_and_grows() {
    let mut ctx = context();
    let t0 = ctx.now;
    let mut portal = CeilingPortal::new(&PortalConfig::default());
    init_flow::<(), _>(&mut portal, &mut ctx);

    let small = plane_event(
        10,
        AnchorEventKind::Added,
        PlaneClassification::Ceiling,
        1.0,
        1.0,
        Vector3::new(5.0, 2.5, 0.0),
    );
    let large = plane_event(
        11,
        AnchorEventKind::Added,
        PlaneClassification::Ceiling,
        2.0,
        3.0,
        Vector3::new(0.0, 2.5, 0.0),
    );
    let floor = plane_event(
        12,
        AnchorEventKind::Added,
        PlaneClassification::Floor,
        9.0,
        9.0,
        Vector3::new(0.0, 0.0, 0.0),
    );
    for event in [&small, &large, &floor] {
        let _: Vec<()> = track(&mut portal, &mut ctx, event, t0);
    }
    assert_near(portal.max_radius(), 1.6, EPSILON);

    update_flow::<(), _>(&mut portal, &mut ctx, at(t0, 1000));
    assert_eq!(portal.phase(), PortalPhase::Detecting);
    assert!(portal.portal_node().is_none());

    update_flow::<(), _>(&mut portal, &mut ctx, at(t0, 2000));
    let node = portal.portal_node().unwrap();
    assert!(matches!(portal.phase(), PortalPhase::Growing { .. }));
    let local = ctx.scene.local_transform(node).unwrap();
    assert_vec_near(local.position, Vector3::new(0.0, 2.5, 0.0), EPSILON);
    assert_vec_near(local.scale, Vector3::new(0.0, 0.0, 0.0), EPSILON);
    assert_eq!(ctx.scene.node(node).unwrap().material().map(|m| m.color), Some(WHITE));

    update_flow::<(), _>(&mut portal, &mut ctx, at(t0, 4500));
    let scale = ctx.scene.local_transform(node).unwrap().scale;
    assert_vec_near(scale, Vector3::new(0.5, 0.5, 0.5), EPSILON);

    update_flow::<(), _>(&mut portal, &mut ctx, at(t0, 7000));
    assert_eq!(portal.phase(), PortalPhase::Open { node });
    let scale = ctx.scene.local_transform(node).unwrap().scale;
    assert_vec_near(scale, Vector3::new(1.0, 1.0, 1.0), EPSILON);

    // late ceilings are ignored
    let huge = plane_event(
        13,
        AnchorEventKind::Added,
        PlaneClassification::Ceiling,
        10.0,
        10.0,
        Vector3::new(0.0, 3.0, 0.0),
    );
    let _: Vec<()> = track(&mut portal, &mut ctx, &huge, at(t0, 7100));
    assert_near(portal.max_radius(), 1.6, EPSILON);
}

#[test]
fn portal_is_abandoned_without_a_ceiling() {
    let mut ctx = context();
    let t0 = ctx.now;
    let mut portal = CeilingPortal::new(&PortalConfig::default());
    init_flow::<(), _>(&mut portal, &mut ctx);

    update_flow::<(), _>(&mut portal, &mut ctx, t0);
    update_flow::<(), _>(&mut portal, &mut ctx, at(t0, 2500));
    assert_eq!(portal.phase(), PortalPhase::Abandoned);
    assert!(ctx.scene.is_empty());
}
