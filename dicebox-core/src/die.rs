/// A single die: pose, heading and spin state
use nalgebra::{Point3, Vector2, Vector3};

use crate::random::RandomSource;
use crate::transform::{Axis, RotationState};

/// Canonical (x, y, z) angles in degrees at which each face points at the viewer.
/// Index 0 is unused.
const FACE_ANGLES: [[f32; 3]; 7] = [
    [0.0, 0.0, 0.0],
    [125.0, 120.0, 45.0],
    [345.0, 170.0, 15.0],
    [75.0, 190.0, 13.0],
    [75.0, 20.0, 77.0],
    [347.0, 342.0, 75.0],
    [105.0, 300.0, 45.0],
];

/// A face value in `1..=6`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Face(u8);

impl Face {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub const ALL: [Face; 6] = [Face(1), Face(2), Face(3), Face(4), Face(5), Face(6)];

    /// Draw a face uniformly from `1..=6`
    pub fn roll(rng: &mut RandomSource) -> Self {
        let index = rng.uniform_int(0, Self::ALL.len() as i64 - 1);
        Self::ALL[index as usize]
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Canonical orientation for this face, in radians
    pub fn angles(self) -> RotationState {
        let [x, y, z] = FACE_ANGLES[self.0 as usize];
        RotationState::new(x.to_radians(), y.to_radians(), z.to_radians())
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a spin decides it is over
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinClock {
    /// Counted in ticks; lands once `elapsed` exceeds `budget`
    Frames { elapsed: u32, budget: u32 },
    /// Counted in seconds; lands once `remaining` reaches zero
    Countdown { remaining: f32 },
}

/// Parameters of an active spin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub axis: Axis,
    /// Radians per second around each axis; only `axis` is applied
    pub angular_speed: Vector3<f32>,
    /// World units per tick along x and y
    pub directional_speed: Vector2<f32>,
    pub clock: SpinClock,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DieState {
    Settled { face: Face },
    Spinning(Spin),
}

/// Direction of travel on each in-plane axis; `true` moves toward +
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading {
    pub x: bool,
    pub y: bool,
}

impl Heading {
    pub fn flip(&mut self) {
        self.x = !self.x;
        self.y = !self.y;
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self { x: true, y: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Die {
    pub translation: Point3<f32>,
    pub rotation: RotationState,
    pub heading: Heading,
    pub colliding: bool,
    /// Degrees; countdown spins scale it by the time left
    pub spin_speed: f32,
    pub state: DieState,
}

impl Die {
    /// A die resting on `face` at `translation`
    pub fn settled(translation: Point3<f32>, face: Face, spin_speed: f32) -> Self {
        Self {
            translation,
            rotation: face.angles(),
            heading: Heading::default(),
            colliding: false,
            spin_speed,
            state: DieState::Settled { face },
        }
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.state, DieState::Spinning(_))
    }

    /// The face shown, or `None` while the die is still spinning
    pub fn face(&self) -> Option<Face> {
        match self.state {
            DieState::Settled { face } => Some(face),
            DieState::Spinning(_) => None,
        }
    }

    pub fn spin(&self) -> Option<&Spin> {
        match &self.state {
            DieState::Spinning(spin) => Some(spin),
            DieState::Settled { .. } => None,
        }
    }

    pub fn start(&mut self, spin: Spin) {
        self.state = DieState::Spinning(spin);
    }

    /// Settle on `face`. Only x and y are snapped; z keeps its last value.
    pub fn land(&mut self, face: Face) {
        let angles = face.angles();
        self.rotation.x = angles.x;
        self.rotation.y = angles.y;
        self.state = DieState::Settled { face };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_face_range() {
        assert!(Face::new(0).is_none());
        assert!(Face::new(7).is_none());
        assert_eq!(Face::new(6).map(Face::value), Some(6));
    }

    #[test]
    fn test_rolled_faces_stay_in_range() {
        let mut rng = RandomSource::seeded(12);
        let mut seen = [0usize; 7];
        for _ in 0..600 {
            let face = Face::roll(&mut rng);
            assert_eq!(Face::new(face.value()), Some(face));
            seen[face.value() as usize] += 1;
        }
        assert_eq!(seen[0], 0);
        assert!(seen[1..].iter().all(|&count| count > 0));
    }

    #[test]
    fn test_face_angles_are_radians() {
        let three = Face::new(3).unwrap().angles();
        assert_relative_eq!(three.x, 75f32.to_radians());
        assert_relative_eq!(three.y, 190f32.to_radians());
        assert_relative_eq!(three.z, 13f32.to_radians());
    }

    #[test]
    fn test_land_keeps_z() {
        let mut die = Die::settled(Point3::origin(), Face::new(1).unwrap(), 1.0);
        die.rotation.z = 0.5;
        die.start(Spin {
            axis: Axis::Z,
            angular_speed: Vector3::zeros(),
            directional_speed: Vector2::zeros(),
            clock: SpinClock::Countdown { remaining: 1.0 },
        });
        assert!(die.is_spinning());
        assert_eq!(die.face(), None);

        let five = Face::new(5).unwrap();
        die.land(five);
        assert_eq!(die.face(), Some(five));
        assert_relative_eq!(die.rotation.x, 347f32.to_radians());
        assert_relative_eq!(die.rotation.y, 342f32.to_radians());
        assert_relative_eq!(die.rotation.z, 0.5);
    }

    #[test]
    fn test_heading_flip() {
        let mut heading = Heading::default();
        heading.flip();
        assert_eq!(heading, Heading { x: false, y: false });
    }
}
