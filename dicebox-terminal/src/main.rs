/// Dicebox Terminal - roll dice in the terminal
///
/// Controls:
///   - Space / Enter: Roll every die
///   - Left click: Roll the dice under the pointer
///   - 1-9, 0: Number of dice (0 means ten)
///   - + / -: Spin speed
///   - M: Cycle shading, P: Toggle projection
///   - Z / X or mouse wheel: Zoom
///   - WASD / Arrow Keys: Turn the view
///   - Q/ESC: Quit
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dicebox_core::{
    load_model, ImportOptions, Model, RandomSource, Scene, ShadingMode, SimulationConfig,
    SimulationMode,
};
use dicebox_terminal::TerminalApp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Dice slide around, bounce off the walls and each other
    Planar,
    /// Dice stay in place; click one to roll it
    Tracked,
}

impl From<Mode> for SimulationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Planar => SimulationMode::Planar,
            Mode::Tracked => SimulationMode::Tracked,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "dicebox")]
#[command(about = "Interactive 3D dice in the terminal", long_about = None)]
struct Cli {
    /// OBJ or STL model to use as the die; a cube when omitted
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Number of dice (1-10)
    #[arg(short, long, default_value_t = 3)]
    dice: usize,

    /// Spin model
    #[arg(long, value_enum, default_value_t = Mode::Planar)]
    mode: Mode,

    /// Nominal ticks per second for frame-counted spins
    #[arg(long, default_value_t = 30.0)]
    tick_rate: f32,

    /// flat, gouraud, phong, blinnphong, normal or depth
    #[arg(long, default_value_t = ShadingMode::default())]
    shading: ShadingMode,

    /// Keep the model's own size and position instead of fitting it
    #[arg(long)]
    keep_scale: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = ImportOptions {
        standardize: !cli.keep_scale,
        ..ImportOptions::default()
    };
    let model = match &cli.model {
        Some(path) => load_model(path, &options)
            .with_context(|| format!("Failed to load model {}", path.display()))?,
        None => Model::cube(),
    };

    let config = SimulationConfig {
        tick_rate: cli.tick_rate,
        ..SimulationConfig::for_mode(cli.mode.into())
    };
    let scene = Scene::new(model, cli.dice, config, RandomSource::from_clock())
        .with_import_options(options);

    let mut app = TerminalApp::new(scene, cli.shading).context("Failed to open the terminal")?;
    app.run().context("Terminal session failed")?;

    Ok(())
}
