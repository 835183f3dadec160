/// Dicebox Web - WASM facade over the dice scene
///
/// The JS host owns the GPU. It uploads `vertex_data` and `indices` once per
/// model, calls `advance` every animation frame, and draws the mesh once per
/// matrix returned by `model_matrices`.
use dicebox_core::{
    Command, ImportOptions, Model, RandomSource, Scene, SimulationConfig, SimulationMode,
};
use nalgebra::Matrix4;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WebDice {
    scene: Scene,
    viewport: (u32, u32),
}

#[wasm_bindgen]
impl WebDice {
    /// The wall clock is unavailable in the browser sandbox, so the host
    /// supplies the seed (for example `Date.now()`).
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u64, planar: bool) -> WebDice {
        let mode = if planar {
            SimulationMode::Planar
        } else {
            SimulationMode::Tracked
        };
        let config = SimulationConfig::for_mode(mode);
        let viewport = (config.viewport.0 as u32, config.viewport.1 as u32);
        let scene = Scene::new(Model::cube(), count, config, RandomSource::seeded(seed));
        WebDice { scene, viewport }
    }

    /// Replace the die model with OBJ text. On failure the old model stays.
    pub fn load_obj(&mut self, text: &str) -> Result<(), JsValue> {
        match Model::from_obj_str(text, &ImportOptions::default()) {
            Ok(model) => {
                self.scene.replace_model(model);
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                report(&message);
                Err(JsValue::from_str(&message))
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.scene.resize(width, height);
    }

    /// Step the animation by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.scene.advance(dt);
    }

    pub fn roll_all(&mut self) {
        self.send(Command::RollAll);
    }

    /// Roll whatever lies under a pointer at `(x, y)` on a `width` x `height` canvas
    pub fn roll_at(&mut self, x: f32, y: f32, width: u32, height: u32) {
        self.viewport = (width, height);
        self.send(Command::RollAt { x, y });
    }

    pub fn set_spin_speed(&mut self, degrees: f32) {
        self.send(Command::SetSpinSpeed(degrees));
    }

    pub fn set_die_count(&mut self, count: usize) {
        self.send(Command::SetDieCount(count));
    }

    pub fn zoom(&mut self, delta: f32) {
        self.send(Command::Zoom(delta));
    }

    pub fn rotate_view(&mut self, yaw: f32, pitch: f32) {
        self.send(Command::RotateView { yaw, pitch });
    }

    pub fn die_count(&self) -> usize {
        self.scene.simulation().len()
    }

    /// Position, normal and texture coordinate per vertex, 8 floats each
    pub fn vertex_data(&self) -> Vec<f32> {
        self.scene
            .model()
            .mesh
            .vertices()
            .iter()
            .flat_map(|vertex| vertex.interleaved())
            .collect()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.scene.model().mesh.indices().to_vec()
    }

    /// 16 column-major floats per die
    pub fn model_matrices(&self) -> Vec<f32> {
        self.scene
            .model_matrices()
            .iter()
            .flat_map(|matrix| column_major(matrix))
            .collect()
    }

    pub fn view_matrix(&self) -> Vec<f32> {
        column_major(&self.scene.camera().view_matrix()).to_vec()
    }

    pub fn projection_matrix(&self) -> Vec<f32> {
        column_major(&self.scene.camera().projection_matrix()).to_vec()
    }

    /// Face value per die, 0 while it is still spinning
    pub fn faces(&self) -> Vec<u8> {
        self.scene
            .simulation()
            .faces()
            .iter()
            .map(|face| face.map_or(0, |face| face.value()))
            .collect()
    }
}

impl WebDice {
    fn send(&mut self, command: Command) {
        if let Err(err) = self.scene.apply(command, self.viewport) {
            report(&err.to_string());
        }
    }
}

fn column_major(matrix: &Matrix4<f32>) -> [f32; 16] {
    let mut values = [0.0; 16];
    values.copy_from_slice(matrix.as_slice());
    values
}

#[cfg(target_arch = "wasm32")]
fn report(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn report(_message: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn test_buffers_match_the_cube() {
        let dice = WebDice::new(2, 5, true);
        assert_eq!(dice.die_count(), 2);
        assert_eq!(dice.vertex_data().len(), 24 * 8);
        assert_eq!(dice.indices().len(), 36);
        assert_eq!(dice.model_matrices().len(), 2 * 16);
        assert!(dice.faces().iter().all(|&face| (1..=6).contains(&face)));
    }

    #[test]
    fn test_rolled_dice_report_zero() {
        let mut dice = WebDice::new(3, 9, false);
        dice.roll_all();
        assert_eq!(dice.faces(), vec![0, 0, 0]);
        for _ in 0..80 {
            dice.advance(0.1);
        }
        assert!(dice.faces().iter().all(|&face| face > 0));
    }

    #[test]
    fn test_load_obj_replaces_buffers() {
        let mut dice = WebDice::new(1, 1, true);
        dice.load_obj(TRIANGLE).unwrap();
        assert_eq!(dice.vertex_data().len(), 3 * 8);
        assert_eq!(dice.indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_translation_is_in_last_column() {
        let dice = WebDice::new(1, 4, true);
        let matrices = dice.model_matrices();
        let die = &dice.scene.simulation().dice()[0];
        assert!((matrices[12] - die.translation.x).abs() < 1e-6);
        assert!((matrices[13] - die.translation.y).abs() < 1e-6);
    }
}
