/// Scene facade: the model, the dice and the camera behind one command API
use std::path::PathBuf;

use nalgebra::Matrix4;

use crate::error::ImportResult;
use crate::import::{load_model, ImportOptions, Model};
use crate::projection::Camera;
use crate::random::RandomSource;
use crate::simulation::{DiceSimulation, SimulationConfig, SimulationMode};
use crate::transform::{RotationState, Transform};

/// Everything a host can ask the scene to do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RollAll,
    /// Roll the dice under a pointer given in viewport pixels
    RollAt { x: f32, y: f32 },
    /// Degrees, for countdown spins
    SetSpinSpeed(f32),
    SetDieCount(usize),
    ReloadModel(PathBuf),
    Zoom(f32),
    /// Turn the whole scene; radians around the vertical and horizontal axes
    RotateView { yaw: f32, pitch: f32 },
}

#[derive(Debug, Clone)]
pub struct Scene {
    model: Model,
    simulation: DiceSimulation,
    camera: Camera,
    view: RotationState,
    options: ImportOptions,
}

impl Scene {
    pub fn new(model: Model, count: usize, config: SimulationConfig, rng: RandomSource) -> Self {
        let (width, height) = config.viewport;
        let mut camera = Camera::new(width.max(1.0) as u32, height.max(1.0) as u32);
        camera.set_zoom(match config.mode {
            SimulationMode::Planar => 3.0,
            SimulationMode::Tracked => 1.0,
        });

        Self {
            model,
            simulation: DiceSimulation::new(count, config, rng),
            camera,
            view: RotationState::zero(),
            options: ImportOptions::default(),
        }
    }

    pub fn with_import_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Swap in an already imported model; the dice keep their state
    pub fn replace_model(&mut self, model: Model) {
        self.model = model;
    }

    pub fn simulation(&self) -> &DiceSimulation {
        &self.simulation
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn view_rotation(&self) -> RotationState {
        self.view
    }

    /// Keep the camera aspect and the in-plane speed scale in step with the host
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
        self.simulation.set_viewport(width as f32, height as f32);
    }

    /// Apply one host command. Only a model reload can fail, and a failed
    /// reload leaves the scene as it was.
    pub fn apply(&mut self, command: Command, viewport: (u32, u32)) -> ImportResult<()> {
        match command {
            Command::RollAll => self.simulation.roll_all(),
            Command::RollAt { x, y } => {
                let base = self.base_matrix();
                let hits = self.simulation.roll_at(&self.camera, &base, (x, y), viewport);
                log::debug!("Pointer at ({}, {}) hit {} dice", x, y, hits);
            }
            Command::SetSpinSpeed(degrees) => self.simulation.set_spin_speed(degrees),
            Command::SetDieCount(count) => self.simulation.set_die_count(count),
            Command::ReloadModel(path) => {
                self.model = load_model(&path, &self.options)?;
            }
            Command::Zoom(delta) => self.camera.zoom_by(delta),
            Command::RotateView { yaw, pitch } => {
                self.view.rotate(pitch, yaw, 0.0);
                self.view.wrap();
            }
        }
        Ok(())
    }

    pub fn advance(&mut self, dt: f32) {
        self.simulation.advance(dt);
    }

    /// Scene-wide rotation applied before every die pose
    pub fn base_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(&self.view)
    }

    /// One pose per die
    pub fn model_matrices(&self) -> Vec<Matrix4<f32>> {
        self.simulation.model_matrices(&self.base_matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(count: usize) -> Scene {
        Scene::new(
            Model::cube(),
            count,
            SimulationConfig::planar(),
            RandomSource::seeded(11),
        )
    }

    #[test]
    fn test_roll_all_spins_every_die() {
        let mut scene = scene(4);
        scene.apply(Command::RollAll, (800, 600)).unwrap();
        assert!(scene.simulation().dice().iter().all(|die| die.is_spinning()));
        assert_eq!(scene.model_matrices().len(), 4);
    }

    #[test]
    fn test_die_count_rebuilds_simulation() {
        let mut scene = scene(2);
        scene.apply(Command::RollAll, (800, 600)).unwrap();
        scene.apply(Command::SetDieCount(0), (800, 600)).unwrap();
        assert_eq!(scene.simulation().len(), 1);
        assert!(scene.simulation().all_settled());
    }

    #[test]
    fn test_failed_reload_keeps_model() {
        let mut scene = scene(1);
        let before = scene.model().mesh.vertices().len();
        let result = scene.apply(
            Command::ReloadModel(PathBuf::from("/nonexistent/die.obj")),
            (800, 600),
        );
        assert!(result.is_err());
        assert_eq!(scene.model().mesh.vertices().len(), before);
        assert_eq!(scene.simulation().len(), 1);
    }

    #[test]
    fn test_view_rotation_wraps() {
        let mut scene = scene(1);
        scene
            .apply(Command::RotateView { yaw: -0.5, pitch: 7.0 }, (800, 600))
            .unwrap();
        let view = scene.view_rotation();
        assert!((0.0..std::f32::consts::TAU).contains(&view.x));
        assert!((0.0..std::f32::consts::TAU).contains(&view.y));
    }
}
