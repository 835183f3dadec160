/// Dice animation: rolling, spinning, bouncing and landing
use nalgebra::{Matrix4, Point3, Vector2, Vector3};

use crate::die::{Die, DieState, Face, Spin, SpinClock};
use crate::projection::Camera;
use crate::random::RandomSource;
use crate::transform::{Axis, Transform};

pub const MIN_DICE: usize = 1;
pub const MAX_DICE: usize = 10;
pub const MIN_SPIN_SPEED: f32 = 0.01;
pub const MAX_SPIN_SPEED: f32 = 10.0;
pub const MIN_TICK_RATE: f32 = 1.0;
pub const MAX_TICK_RATE: f32 = 1000.0;

/// Which spin model drives the dice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    /// Frame-counted spins; dice slide around the plane, bounce off walls and
    /// each other
    Planar,
    /// Time-counted spins; dice stay where they are
    Tracked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub mode: SimulationMode,
    /// Nominal ticks per second used to size frame budgets and speeds
    pub tick_rate: f32,
    /// Viewport size in pixels; scales in-plane speeds
    pub viewport: (f32, f32),
    /// Walls sit at `±bound` on x and y
    pub bound: f32,
    pub collision_threshold: f32,
    /// Degrees, for countdown spins
    pub spin_speed: f32,
    /// Countdown length range in seconds
    pub spin_seconds: (f32, f32),
    pub die_scale: f32,
    /// Dice spawn inside `[-spawn_extent, spawn_extent)` on each placed axis
    pub spawn_extent: f32,
}

impl SimulationConfig {
    pub fn planar() -> Self {
        Self {
            mode: SimulationMode::Planar,
            tick_rate: 60.0,
            viewport: (800.0, 600.0),
            bound: 1.5,
            collision_threshold: 1.2,
            spin_speed: 1.0,
            spin_seconds: (2.0, 7.0),
            die_scale: 0.5,
            spawn_extent: 1.5,
        }
    }

    pub fn tracked() -> Self {
        Self {
            mode: SimulationMode::Tracked,
            spawn_extent: 1.0,
            ..Self::planar()
        }
    }

    pub fn for_mode(mode: SimulationMode) -> Self {
        match mode {
            SimulationMode::Planar => Self::planar(),
            SimulationMode::Tracked => Self::tracked(),
        }
    }

    /// Pin the tick rate into `[MIN_TICK_RATE, MAX_TICK_RATE]`. A NaN rate
    /// falls back to the preset's.
    pub fn sanitized(mut self) -> Self {
        self.tick_rate = if self.tick_rate.is_nan() {
            Self::planar().tick_rate
        } else {
            self.tick_rate.clamp(MIN_TICK_RATE, MAX_TICK_RATE)
        };
        self
    }

    fn nominal_delta(&self) -> f32 {
        if self.tick_rate > 0.0 {
            1.0 / self.tick_rate
        } else {
            0.0
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::planar()
    }
}

/// Owns the dice and the random source that drives them
#[derive(Debug, Clone)]
pub struct DiceSimulation {
    config: SimulationConfig,
    dice: Vec<Die>,
    rng: RandomSource,
    /// Most recent tick length, used to size in-plane speeds on roll
    last_delta: f32,
}

impl DiceSimulation {
    pub fn new(count: usize, config: SimulationConfig, rng: RandomSource) -> Self {
        let config = config.sanitized();
        let last_delta = config.nominal_delta();
        let mut simulation = Self {
            config,
            dice: Vec::new(),
            rng,
            last_delta,
        };
        simulation.set_die_count(count);
        simulation
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn mode(&self) -> SimulationMode {
        self.config.mode
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn dice_mut(&mut self) -> &mut [Die] {
        &mut self.dice
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Face of each die, `None` while it spins
    pub fn faces(&self) -> Vec<Option<Face>> {
        self.dice.iter().map(Die::face).collect()
    }

    pub fn all_settled(&self) -> bool {
        self.dice.iter().all(|die| !die.is_spinning())
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.config.viewport = (width, height);
    }

    /// Replace every die with a fresh settled one. The count is pinned into
    /// `[MIN_DICE, MAX_DICE]`.
    pub fn set_die_count(&mut self, count: usize) {
        let count = count.clamp(MIN_DICE, MAX_DICE);
        self.rng.reseed();
        self.dice = (0..count).map(|_| self.spawn()).collect();
        log::debug!("Placed {} dice", count);
    }

    fn spawn(&mut self) -> Die {
        let extent = self.config.spawn_extent;
        let x = self.rng.uniform_real(-extent, extent);
        let y = self.rng.uniform_real(-extent, extent);
        let z = match self.config.mode {
            SimulationMode::Planar => 0.0,
            SimulationMode::Tracked => self.rng.uniform_real(-extent, extent),
        };
        let face = Face::roll(&mut self.rng);
        Die::settled(Point3::new(x, y, z), face, self.config.spin_speed)
    }

    /// Set the countdown spin speed in degrees on every die
    pub fn set_spin_speed(&mut self, degrees: f32) {
        let degrees = if degrees.is_nan() {
            self.config.spin_speed
        } else {
            degrees.clamp(MIN_SPIN_SPEED, MAX_SPIN_SPEED)
        };
        self.config.spin_speed = degrees;
        for die in &mut self.dice {
            die.spin_speed = degrees;
        }
    }

    /// Start `index` spinning. A die that is already spinning restarts with
    /// fresh draws. Returns `false` for an index past the end.
    pub fn roll(&mut self, index: usize) -> bool {
        if index >= self.dice.len() {
            return false;
        }
        let spin = new_spin(&mut self.rng, &self.config, self.last_delta);
        self.dice[index].start(spin);
        log::debug!("Die {} rolled around {:?}", index, spin.axis);
        true
    }

    pub fn roll_all(&mut self) {
        for index in 0..self.dice.len() {
            self.roll(index);
        }
    }

    /// Roll every die under the pointer. Returns how many were hit.
    pub fn roll_at(
        &mut self,
        camera: &Camera,
        base: &Matrix4<f32>,
        pointer: (f32, f32),
        viewport: (u32, u32),
    ) -> usize {
        let hits: Vec<usize> = self
            .dice
            .iter()
            .enumerate()
            .filter(|(_, die)| camera.hit_test(pointer, viewport, base, &die.translation))
            .map(|(index, _)| index)
            .collect();
        for &index in &hits {
            self.roll(index);
        }
        hits.len()
    }

    /// Advance every spinning die by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if dt > 0.0 {
            self.last_delta = dt;
        }

        for index in 0..self.dice.len() {
            if !self.dice[index].is_spinning() {
                continue;
            }
            let landed = match self.config.mode {
                SimulationMode::Planar => {
                    self.check_collision(index);
                    planar_tick(&mut self.dice[index], &mut self.rng, &self.config, dt)
                }
                SimulationMode::Tracked => {
                    tracked_tick(&mut self.dice[index], &mut self.rng, dt)
                }
            };
            if let Some(face) = landed {
                log::debug!("Die {} landed on {}", index, face);
            }
        }
    }

    /// Flip the heading of `index` on the first tick it comes near another die
    fn check_collision(&mut self, index: usize) {
        let position = self.dice[index].translation;
        let threshold = self.config.collision_threshold;
        let near = self
            .dice
            .iter()
            .enumerate()
            .any(|(other, die)| other != index && (die.translation - position).norm() < threshold);

        let die = &mut self.dice[index];
        if !near {
            die.colliding = false;
        } else if !die.colliding {
            die.heading.flip();
            die.colliding = true;
        }
    }

    /// One pose matrix per die under the `base` scene rotation
    pub fn model_matrices(&self, base: &Matrix4<f32>) -> Vec<Matrix4<f32>> {
        self.dice
            .iter()
            .map(|die| {
                Transform::die_model_matrix(base, &die.translation, self.config.die_scale, &die.rotation)
            })
            .collect()
    }
}

fn new_spin(rng: &mut RandomSource, config: &SimulationConfig, dt: f32) -> Spin {
    match config.mode {
        SimulationMode::Planar => {
            let rate = config.tick_rate.round() as i64;
            let budget = rng
                .uniform_int(rate.saturating_mul(2), rate.saturating_mul(5))
                .clamp(0, u32::MAX as i64) as u32;
            let (axis, angular_speed, directional_speed) = draw_motion(rng, config, dt);
            Spin {
                axis,
                angular_speed,
                directional_speed,
                clock: SpinClock::Frames { elapsed: 0, budget },
            }
        }
        SimulationMode::Tracked => {
            let (low, high) = config.spin_seconds;
            let remaining = rng.uniform_real(low, high);
            Spin {
                axis: rng.choose_axis(),
                angular_speed: Vector3::zeros(),
                directional_speed: Vector2::zeros(),
                clock: SpinClock::Countdown { remaining },
            }
        }
    }
}

fn draw_motion(
    rng: &mut RandomSource,
    config: &SimulationConfig,
    dt: f32,
) -> (Axis, Vector3<f32>, Vector2<f32>) {
    let axis = rng.choose_axis();
    let (low, high) = (4.0 * config.tick_rate, 8.0 * config.tick_rate);
    let angular_speed = Vector3::new(
        rng.uniform_real(low, high).to_radians(),
        rng.uniform_real(low, high).to_radians(),
        rng.uniform_real(low, high).to_radians(),
    );
    let (width, height) = config.viewport;
    let directional_speed = Vector2::new(
        rng.uniform_real(dt / 200.0, dt / 100.0) * width,
        rng.uniform_real(dt / 200.0, dt / 100.0) * height,
    );
    (axis, angular_speed, directional_speed)
}

/// Reseed and pick the face to land on
fn land(die: &mut Die, rng: &mut RandomSource) -> Face {
    rng.reseed();
    let face = Face::roll(rng);
    die.land(face);
    face
}

fn planar_tick(
    die: &mut Die,
    rng: &mut RandomSource,
    config: &SimulationConfig,
    dt: f32,
) -> Option<Face> {
    let DieState::Spinning(mut spin) = die.state else {
        return None;
    };

    let SpinClock::Frames { elapsed, budget } = &mut spin.clock else {
        return None;
    };
    *elapsed += 1;
    let expired = *elapsed > *budget;

    let bound = config.bound;
    let mut bounced = false;
    if die.translation.x >= bound {
        die.heading.x = false;
        bounced = true;
    } else if die.translation.x <= -bound {
        die.heading.x = true;
        bounced = true;
    }
    if die.translation.y >= bound {
        die.heading.y = false;
        bounced = true;
    } else if die.translation.y <= -bound {
        die.heading.y = true;
        bounced = true;
    }
    if bounced {
        let (axis, angular_speed, directional_speed) = draw_motion(rng, config, dt);
        spin.axis = axis;
        spin.angular_speed = angular_speed;
        spin.directional_speed = directional_speed;
    }

    let step = spin.directional_speed;
    die.translation.x += if die.heading.x { step.x } else { -step.x };
    die.translation.y += if die.heading.y { step.y } else { -step.y };

    if expired {
        return Some(land(die, rng));
    }

    die.rotation
        .advance(spin.axis, spin.angular_speed[spin.axis.index()] * dt);
    die.state = DieState::Spinning(spin);
    None
}

fn tracked_tick(die: &mut Die, rng: &mut RandomSource, dt: f32) -> Option<Face> {
    let DieState::Spinning(mut spin) = die.state else {
        return None;
    };
    let SpinClock::Countdown { remaining } = &mut spin.clock else {
        return None;
    };

    *remaining -= dt;
    let left = *remaining;
    die.rotation
        .advance(spin.axis, die.spin_speed.to_radians() * left);

    if left <= 0.0 {
        return Some(land(die, rng));
    }
    die.state = DieState::Spinning(spin);
    None
}
