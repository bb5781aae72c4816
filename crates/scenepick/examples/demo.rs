//! Headless picking demo.
//!
//! Builds a small scene, renders the ID target, prints what lies under a few
//! pixels, and writes the ID target to `picking.png`.

use scenepick::*;

fn main() -> Result<()> {
    init_logging();

    let mut editor = EditorPicking::<SceneNode>::headless(PickingOptions::default())?;

    let positions = [
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.0),
        Vec3::new(0.5, 0.5, 0.0),
        Vec3::new(-0.5, 0.5, 0.0),
    ];
    let quad = [0, 1, 2, 0, 2, 3];

    let root = SceneNode::group("root").into_shared();
    for (i, x) in [-1.5_f32, 0.0, 1.5].into_iter().enumerate() {
        let node = editor
            .mesh_node(format!("panel {i}"), &positions, &quad)?
            .at(Vec3::new(x, 0.0, 0.0));
        root.add_child(node.into_shared());
    }
    for (kind, x) in HudKind::ALL.into_iter().zip([-1.5_f32, -0.5, 0.5, 1.5]) {
        let node = SceneNode::hud(kind.name(), kind).at(Vec3::new(x, 1.2, 0.0));
        root.add_child(node.into_shared());
    }

    let (width, height) = (320, 240);
    let camera = CameraView::look_at_perspective(
        Vec3::new(0.0, 0.5, 5.0),
        Vec3::new(0.0, 0.5, 0.0),
        50.0_f32.to_radians(),
        0.1,
        100.0,
        width,
        height,
    );

    if let Some(stats) = editor.compute_picking(&camera, width, height, &root) {
        println!(
            "picking pass: {} meshes, {} HUD icons in {} draws",
            stats.meshes, stats.hud_instances, stats.hud_draws
        );
    }

    for point in [
        Vec3::new(-1.5, 0.0, 0.0),
        Vec3::ZERO,
        Vec3::new(1.5, 1.2, 0.0),
        Vec3::new(0.0, 3.0, 0.0),
    ] {
        let Some((pixel, _)) = camera.project(point) else {
            continue;
        };
        let (x, y) = (pixel.x as u32, pixel.y as u32);
        match editor.get_entity_near(x, y, 2) {
            Some(entity) => println!("({x}, {y}) -> {}", entity.name()),
            None => println!("({x}, {y}) -> nothing"),
        }
    }

    editor.save_picking_target("picking.png")?;
    println!("wrote picking.png");
    Ok(())
}
