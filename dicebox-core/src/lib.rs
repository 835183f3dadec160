/// Dicebox Core Library - dice animation and model import
///
/// This library drives a set of animated dice (spin, bounce, land on a face)
/// and turns OBJ or STL files into deduplicated, indexed meshes ready to draw
/// once per die.

pub mod dedup;
pub mod die;
pub mod error;
pub mod geometry;
pub mod import;
pub mod obj;
pub mod projection;
pub mod random;
pub mod scene;
pub mod shading;
pub mod simulation;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use dedup::{MeshBuilder, VertexIdentity};
pub use die::{Die, DieState, Face};
pub use error::{ImportError, ImportResult};
pub use geometry::{Material, Mesh, Vertex};
pub use import::{load_model, ImportOptions, Model};
pub use projection::{Camera, ProjectionMode};
pub use random::RandomSource;
pub use scene::{Command, Scene};
pub use shading::{Light, ShadingMode};
pub use simulation::{DiceSimulation, SimulationConfig, SimulationMode};
pub use transform::{Axis, RotationState, Transform};
