//! Picking pass integration tests on the CPU backend.

mod common;

use std::sync::Arc;

use common::{Call, SoftBackend};
use scenepick_core::*;

const SIZE: u32 = 64;

fn camera() -> CameraView {
    CameraView::look_at_perspective(
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        60.0_f32.to_radians(),
        0.1,
        100.0,
        SIZE,
        SIZE,
    )
}

fn pixel_of(position: Vec3) -> (u32, u32) {
    let (pixel, _) = camera().project(position).expect("in front of the camera");
    (pixel.x as u32, pixel.y as u32)
}

fn mesh_at(name: &str, id: u64, position: Vec3) -> Arc<SceneNode> {
    SceneNode::mesh(name, MeshId(id), Aabb::unit())
        .at(position)
        .into_shared()
}

fn hud_at(name: &str, kind: HudKind, position: Vec3) -> Arc<SceneNode> {
    SceneNode::hud(name, kind).at(position).into_shared()
}

fn compute(
    pass: &mut PickingPass<SoftBackend, SceneNode>,
    backend: &mut SoftBackend,
    root: &Arc<SceneNode>,
    now: f64,
) -> Option<PassStats> {
    pass.compute_picking_at(backend, &camera(), SIZE, SIZE, root, now)
}

#[test]
fn test_round_trip_mesh_and_hud() {
    let root = SceneNode::group("root").into_shared();
    let cube = mesh_at("cube", 1, Vec3::ZERO);
    let lamp = hud_at("lamp", HudKind::Light, Vec3::new(2.5, 0.0, 0.0));
    root.add_child(cube.clone());
    root.add_child(lamp.clone());

    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    let stats = compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");
    assert_eq!(stats.meshes, 1);
    assert_eq!(stats.hud_instances, 1);
    assert_eq!(stats.hud_draws, 1);

    let (x, y) = pixel_of(Vec3::ZERO);
    let hit = pass.get_entity_at(&mut backend, x, y).expect("cube under cursor");
    assert!(Arc::ptr_eq(&hit, &cube));
    assert_eq!(pass.get_color_at(&mut backend, x, y), cube.pick_color().to_vec4());

    let (x, y) = pixel_of(Vec3::new(2.5, 0.0, 0.0));
    let hit = pass.get_entity_at(&mut backend, x, y).expect("lamp under cursor");
    assert!(Arc::ptr_eq(&hit, &lamp));
}

#[test]
fn test_background_resolves_to_nothing() {
    let root = SceneNode::group("root").into_shared();
    root.add_child(mesh_at("cube", 1, Vec3::ZERO));

    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    assert!(pass.get_entity_at(&mut backend, 0, 0).is_none());
    assert_eq!(pass.get_color_at(&mut backend, 0, 0), Vec4::ZERO);
}

#[test]
fn test_pass_calls_are_well_formed() {
    let root = mesh_at("cube", 1, Vec3::ZERO);
    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    assert_eq!(
        backend.calls,
        [
            Call::CreateTarget { label: "picking", width: SIZE, height: SIZE },
            Call::BeginOffscreen,
            Call::SetMaterial(IdMaterial::PickingId),
            Call::DrawMesh(MeshId(1)),
            Call::EndPass,
        ]
    );
}

#[test]
fn test_nearer_mesh_wins() {
    let root = SceneNode::group("root").into_shared();
    let far = mesh_at("far", 1, Vec3::new(0.0, 0.0, -5.0));
    let near = mesh_at("near", 2, Vec3::ZERO);
    // Near first, so a missing depth test would let `far` overwrite it.
    root.add_child(near.clone());
    root.add_child(far);

    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    let (x, y) = pixel_of(Vec3::ZERO);
    let hit = pass.get_entity_at(&mut backend, x, y).expect("something is hit");
    assert!(Arc::ptr_eq(&hit, &near));
}

#[test]
fn test_fallback_match_survives_color_drift() {
    let root = mesh_at("cube", 1, Vec3::ZERO);
    let mut backend = SoftBackend::new();
    backend.drift = [2, -1, 1];
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    let (x, y) = pixel_of(Vec3::ZERO);
    assert_ne!(
        pass.get_color_at(&mut backend, x, y),
        root.pick_color().to_vec4(),
        "the texel is not an exact key"
    );
    let hit = pass.get_entity_at(&mut backend, x, y).expect("fallback match");
    assert!(Arc::ptr_eq(&hit, &root));
}

#[test]
fn test_drift_resolves_to_drawn_entity_not_a_neighbour() {
    let root = SceneNode::group("root").into_shared();
    let a = mesh_at("a", 1, Vec3::ZERO);
    root.add_child(a.clone());
    // Registered but culled, so their keys compete in the fallback scan.
    let others: Vec<_> = (0..32)
        .map(|i| mesh_at(&format!("b{i}"), 2 + i, Vec3::new(500.0, 0.0, 0.0)))
        .collect();
    for other in &others {
        root.add_child(other.clone());
    }

    for drift in [[1, 0, 0], [-1, 0, 0], [0, 1, -1], [-1, -1, -1]] {
        let mut backend = SoftBackend::new();
        backend.drift = drift;
        let mut pass = PickingPass::default();
        compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

        let (x, y) = pixel_of(Vec3::ZERO);
        let texel = ColorKey::quantize(pass.get_color_at(&mut backend, x, y));
        assert!(
            others.iter().all(|b| b.pick_color() != texel),
            "drift {drift:?} landed on another entity's key"
        );
        let hit = pass.get_entity_at(&mut backend, x, y).expect("fallback match");
        assert!(Arc::ptr_eq(&hit, &a), "drift {drift:?} resolved to {}", hit.name());
    }
}

#[test]
fn test_zero_tolerance_rejects_drift() {
    let root = mesh_at("cube", 1, Vec3::ZERO);
    let mut backend = SoftBackend::new();
    backend.drift = [2, -1, 1];
    let mut options = PickingOptions::default();
    options.fallback_tolerance = 0.0;
    let mut pass = PickingPass::new(options);
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    let (x, y) = pixel_of(Vec3::ZERO);
    assert!(pass.get_entity_at(&mut backend, x, y).is_none());
}

#[test]
fn test_culled_entities_are_registered_but_not_drawn() {
    let root = SceneNode::group("root").into_shared();
    let offscreen = mesh_at("offscreen", 1, Vec3::new(500.0, 0.0, 0.0));
    root.add_child(offscreen.clone());

    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    let stats = compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    assert_eq!(stats.meshes, 0);
    assert_eq!(stats.culled, 1);
    assert_eq!(backend.count(|c| matches!(c, Call::DrawMesh(_))), 0);
    assert!(pass.registry().contains(&offscreen));
}

#[test]
fn test_hud_batches_split_at_block_size() {
    let cases: [(usize, Vec<usize>); 4] = [
        (0, vec![]),
        (32, vec![32]),
        (33, vec![32, 1]),
        (65, vec![32, 32, 1]),
    ];
    for (count, expected) in cases {
        let root = SceneNode::group("root").into_shared();
        for i in 0..count {
            let x = (i % 9) as f32 * 0.5 - 2.0;
            let y = (i / 9) as f32 * 0.5 - 2.0;
            root.add_child(hud_at("icon", HudKind::AudioSource, Vec3::new(x, y, 0.0)));
        }

        let mut backend = SoftBackend::new();
        let mut pass = PickingPass::default();
        let stats = compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

        assert_eq!(backend.hud_blocks(), expected, "{count} instances");
        assert_eq!(stats.hud_draws, expected.len());
        assert_eq!(stats.hud_instances, count);
        let hud_material = backend.count(|c| *c == Call::SetMaterial(IdMaterial::HudBillboard));
        assert_eq!(hud_material, usize::from(count > 0));
    }
}

#[test]
fn test_unvisited_entries_are_evicted_after_ttl() {
    let root = SceneNode::group("root").into_shared();
    let cube = mesh_at("cube", 1, Vec3::ZERO);
    root.add_child(cube.clone());

    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");
    root.remove_child(&cube);

    let stats = compute(&mut pass, &mut backend, &root, 9.5).expect("pass completes");
    assert_eq!(stats.evicted, 0);
    assert!(pass.registry().contains(&cube));

    let stats = compute(&mut pass, &mut backend, &root, 10.5).expect("pass completes");
    assert_eq!(stats.evicted, 1);
    assert!(!pass.registry().contains(&cube));
}

#[test]
fn test_destroyed_entity_resolves_to_nothing() {
    let root = SceneNode::group("root").into_shared();
    let cube = mesh_at("cube", 1, Vec3::ZERO);
    root.add_child(cube.clone());

    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    // Destroy the entity without re-rendering: its color is still on the target.
    root.remove_child(&cube);
    let color = cube.pick_color();
    drop(cube);

    let (x, y) = pixel_of(Vec3::ZERO);
    assert_eq!(pass.get_color_at(&mut backend, x, y), color.to_vec4());
    assert!(pass.get_entity_at(&mut backend, x, y).is_none());
}

#[test]
fn test_target_follows_requested_size() {
    let root = mesh_at("cube", 1, Vec3::ZERO);
    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    let creates = |b: &SoftBackend| b.count(|c| matches!(c, Call::CreateTarget { .. }));

    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");
    compute(&mut pass, &mut backend, &root, 0.1).expect("pass completes");
    assert_eq!(creates(&backend), 1);

    pass.compute_picking_at(&mut backend, &camera(), 32, 16, &root, 0.2)
        .expect("pass completes");
    assert_eq!(creates(&backend), 2);
    assert_eq!(pass.size(), Some((32, 16)));

    // Outside the smaller target.
    assert!(pass.get_entity_at(&mut backend, 40, 8).is_none());
}

#[test]
fn test_failed_target_creation_makes_the_pass_a_no_op() {
    let root = mesh_at("cube", 1, Vec3::ZERO);
    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");
    assert!(pass.is_ready());

    backend.fail_create = true;
    let result = pass.compute_picking_at(&mut backend, &camera(), 128, 128, &root, 1.0);
    assert!(result.is_none());
    assert!(!pass.is_ready());
    assert_eq!(pass.size(), None);

    let (x, y) = pixel_of(Vec3::ZERO);
    assert!(pass.get_entity_at(&mut backend, x, y).is_none());
    assert_eq!(backend.count(|c| matches!(c, Call::Read(_))), 0);
}

#[test]
fn test_zero_size_is_a_no_op() {
    let root = mesh_at("cube", 1, Vec3::ZERO);
    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    assert!(pass
        .compute_picking_at(&mut backend, &camera(), 0, SIZE, &root, 0.0)
        .is_none());
    assert!(backend.calls.is_empty());
}

#[test]
fn test_missing_mesh_is_skipped() {
    let root = SceneNode::group("root").into_shared();
    root.add_child(mesh_at("broken", 1, Vec3::new(-2.0, 0.0, 0.0)));
    let cube = mesh_at("cube", 2, Vec3::ZERO);
    root.add_child(cube.clone());

    let mut backend = SoftBackend::new();
    backend.missing_meshes.insert(MeshId(1));
    let mut pass = PickingPass::default();
    let stats = compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");
    assert_eq!(stats.meshes, 1);

    let (x, y) = pixel_of(Vec3::ZERO);
    let hit = pass.get_entity_at(&mut backend, x, y).expect("cube still drawn");
    assert!(Arc::ptr_eq(&hit, &cube));
}

#[test]
fn test_entity_near_cursor() {
    let root = SceneNode::group("root").into_shared();
    let lamp = hud_at("lamp", HudKind::Light, Vec3::ZERO);
    root.add_child(lamp.clone());

    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");

    let (x, y) = pixel_of(Vec3::ZERO);
    let (x, y) = (x + 5, y);
    assert!(pass.get_entity_at(&mut backend, x, y).is_none());
    let hit = pass.get_entity_near(&mut backend, x, y, 4).expect("within radius");
    assert!(Arc::ptr_eq(&hit, &lamp));
    assert!(pass.get_entity_near(&mut backend, x, y, 1).is_none());
}

#[test]
fn test_clear_forgets_everything() {
    let root = mesh_at("cube", 1, Vec3::ZERO);
    let mut backend = SoftBackend::new();
    let mut pass = PickingPass::default();
    compute(&mut pass, &mut backend, &root, 0.0).expect("pass completes");
    assert_eq!(pass.registry().len(), 1);

    pass.clear();
    assert!(pass.registry().is_empty());
    assert_eq!(pass.size(), None);
    assert!(!pass.is_ready());
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "picking queried before compute_picking")]
fn test_query_before_compute_asserts() {
    let mut backend = SoftBackend::new();
    let pass: PickingPass<SoftBackend, SceneNode> = PickingPass::default();
    let _ = pass.get_entity_at(&mut backend, 0, 0);
}
