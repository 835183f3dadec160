//! End-to-end behavior of the dice scene and the model importer

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use dicebox_core::die::SpinClock;
use dicebox_core::projection::{MAX_ZOOM, MIN_ZOOM};
use dicebox_core::{
    load_model, Camera, Command, DiceSimulation, ImportError, ImportOptions, Model,
    RandomSource, Scene, SimulationConfig, VertexIdentity,
};
use nalgebra::{Matrix4, Point3};

const VIEWPORT: (u32, u32) = (800, 600);

fn asset(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../assets").join(name)
}

fn planar(count: usize, seed: u64) -> DiceSimulation {
    DiceSimulation::new(count, SimulationConfig::planar(), RandomSource::seeded(seed))
}

#[test]
fn three_dice_start_settled_on_canonical_angles() {
    let simulation = planar(3, 1);
    assert_eq!(simulation.len(), 3);
    for die in simulation.dice() {
        let face = die.face().expect("fresh dice are settled");
        assert!((1..=6).contains(&face.value()));
        let angles = face.angles();
        assert_relative_eq!(die.rotation.x, angles.x);
        assert_relative_eq!(die.rotation.y, angles.y);
    }
}

#[test]
fn rolled_die_settles_once_its_budget_runs_out() {
    let mut simulation = planar(1, 2);
    simulation.roll(0);
    let SpinClock::Frames { budget, .. } = simulation.dice()[0].spin().unwrap().clock else {
        panic!("planar spins count frames");
    };

    for _ in 0..=budget {
        simulation.advance(1.0 / 60.0);
    }

    let die = &simulation.dice()[0];
    let face = die.face().expect("die landed");
    let angles = face.angles();
    assert_relative_eq!(die.rotation.x, angles.x);
    assert_relative_eq!(die.rotation.y, angles.y);
}

#[test]
fn landing_faces_cover_every_value() {
    let mut seen = [false; 7];
    let mut simulation = DiceSimulation::new(
        10,
        SimulationConfig::tracked(),
        RandomSource::seeded(99),
    );
    for _ in 0..10 {
        simulation.roll_all();
        for _ in 0..80 {
            simulation.advance(0.1);
        }
        for face in simulation.faces().into_iter().flatten() {
            seen[face.value() as usize] = true;
        }
    }
    assert!(seen[1..].iter().all(|&hit| hit), "faces seen: {:?}", seen);
}

#[test]
fn nearby_spinning_dice_flip_heading_once() {
    let mut simulation = planar(2, 3);
    simulation.dice_mut()[0].translation = Point3::new(0.0, 0.0, 0.0);
    simulation.dice_mut()[1].translation = Point3::new(0.5, 0.0, 0.0);
    simulation.roll_all();

    simulation.advance(1.0 / 60.0);
    for die in simulation.dice() {
        assert!(die.colliding);
        assert!(!die.heading.x && !die.heading.y);
    }

    // Still close: already colliding, so no second flip
    simulation.advance(1.0 / 60.0);
    for die in simulation.dice() {
        assert!(die.colliding);
        assert!(!die.heading.x && !die.heading.y);
    }

    simulation.dice_mut()[1].translation = Point3::new(1.4, 1.4, 0.0);
    simulation.advance(1.0 / 60.0);
    assert!(simulation.dice().iter().all(|die| !die.colliding));
}

#[test]
fn settled_dice_skip_collision_checks() {
    let mut simulation = planar(2, 4);
    simulation.dice_mut()[0].translation = Point3::origin();
    simulation.dice_mut()[1].translation = Point3::new(0.3, 0.0, 0.0);
    simulation.advance(1.0 / 60.0);
    assert!(simulation.dice().iter().all(|die| !die.colliding));
}

#[test]
fn pointer_on_die_rolls_only_that_die() {
    let mut simulation = DiceSimulation::new(
        2,
        SimulationConfig::tracked(),
        RandomSource::seeded(5),
    );
    simulation.dice_mut()[0].translation = Point3::origin();
    simulation.dice_mut()[1].translation = Point3::new(0.9, 0.9, 0.0);

    let camera = Camera::new(VIEWPORT.0, VIEWPORT.1);
    let hits = simulation.roll_at(&camera, &Matrix4::identity(), (400.0, 300.0), VIEWPORT);
    assert_eq!(hits, 1);
    assert!(simulation.dice()[0].is_spinning());
    assert!(!simulation.dice()[1].is_spinning());
}

#[test]
fn cube_dedup_reduces_corners() {
    let model = Model::cube();
    assert_eq!(model.mesh.indices().len(), 36);
    assert_eq!(model.mesh.vertices().len(), 24);
    assert!(model.mesh.vertices().len() < model.mesh.indices().len());
}

#[test]
fn die_asset_imports_with_materials() {
    let model = load_model(&asset("d6.obj"), &ImportOptions::default()).unwrap();
    assert_eq!(model.mesh.vertices().len(), 24);
    assert_eq!(model.mesh.triangle_count(), 12);
    assert!(model.has_normals);
    assert!(model.has_tex_coords);
    assert_eq!(
        model.diffuse_texture.as_deref(),
        Some(asset("d6.png").as_path())
    );

    let bounds = model.mesh.bounds().unwrap();
    assert_relative_eq!(bounds.diagonal(), 2.0, epsilon = 1e-5);
    assert_relative_eq!(bounds.center(), Point3::origin(), epsilon = 1e-6);

    let ember = model
        .mesh
        .vertices()
        .iter()
        .filter(|vertex| (vertex.material.diffuse.x - 0.8).abs() < 1e-6)
        .count();
    assert_eq!(ember, 4);
}

#[test]
fn position_identity_shares_cube_corners() {
    let options = ImportOptions {
        identity: VertexIdentity::Position,
        ..ImportOptions::default()
    };
    let model = load_model(&asset("d6.obj"), &options).unwrap();
    assert_eq!(model.mesh.vertices().len(), 8);
}

#[test]
fn failed_reload_leaves_scene_unchanged() {
    let mut scene = Scene::new(
        Model::cube(),
        2,
        SimulationConfig::planar(),
        RandomSource::seeded(6),
    );
    let dice_before = scene.simulation().dice().to_vec();

    let broken = std::env::temp_dir().join(format!("dicebox-broken-{}.obj", std::process::id()));
    std::fs::write(&broken, "v 0 0 0\nv 1 0 0\nv 0 1\nf 1 2 3\n").unwrap();
    let result = scene.apply(Command::ReloadModel(broken.clone()), VIEWPORT);
    std::fs::remove_file(&broken).ok();

    match result {
        Err(ImportError::Parse { line, path, .. }) => {
            assert_eq!(line, 3);
            assert_eq!(path, broken);
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert_eq!(scene.model().source, PathBuf::from("<memory>"));
    assert_eq!(scene.simulation().dice(), &dice_before[..]);

    scene
        .apply(Command::ReloadModel(asset("d6.obj")), VIEWPORT)
        .unwrap();
    assert_eq!(scene.model().source, asset("d6.obj"));
    assert_eq!(scene.simulation().dice(), &dice_before[..]);
}

#[test]
fn zoom_commands_are_clamped() {
    let mut scene = Scene::new(
        Model::cube(),
        1,
        SimulationConfig::tracked(),
        RandomSource::seeded(8),
    );
    scene.apply(Command::Zoom(100.0), VIEWPORT).unwrap();
    assert_eq!(scene.camera().zoom(), MAX_ZOOM);
    scene.apply(Command::Zoom(-100.0), VIEWPORT).unwrap();
    assert_eq!(scene.camera().zoom(), MIN_ZOOM);
}

#[test]
fn spin_speed_and_count_commands_are_clamped() {
    let mut scene = Scene::new(
        Model::cube(),
        3,
        SimulationConfig::tracked(),
        RandomSource::seeded(10),
    );
    scene.apply(Command::SetSpinSpeed(50.0), VIEWPORT).unwrap();
    assert_eq!(scene.simulation().config().spin_speed, 10.0);
    scene.apply(Command::SetDieCount(11), VIEWPORT).unwrap();
    assert_eq!(scene.simulation().len(), 10);
    assert_eq!(scene.model_matrices().len(), 10);
    assert!(scene.simulation().dice().iter().all(|die| die.spin_speed == 10.0));
}
