/// Lighting models shared by the renderers
use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use thiserror::Error;

use crate::geometry::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadingMode {
    /// Lambert on the face normal
    Flat,
    /// Lambert per vertex, interpolated across the face
    Gouraud,
    /// Reflection-vector specular on an interpolated normal
    Phong,
    /// Half-vector specular on an interpolated normal
    #[default]
    BlinnPhong,
    /// The normal itself as a color
    Normal,
    /// Brightness falls off with depth
    Depth,
}

impl ShadingMode {
    pub const ALL: [ShadingMode; 6] = [
        ShadingMode::Flat,
        ShadingMode::Gouraud,
        ShadingMode::Phong,
        ShadingMode::BlinnPhong,
        ShadingMode::Normal,
        ShadingMode::Depth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShadingMode::Flat => "flat",
            ShadingMode::Gouraud => "gouraud",
            ShadingMode::Phong => "phong",
            ShadingMode::BlinnPhong => "blinnphong",
            ShadingMode::Normal => "normal",
            ShadingMode::Depth => "depth",
        }
    }

    /// The following mode, wrapping around
    pub fn next(self) -> Self {
        let position = Self::ALL.iter().position(|&mode| mode == self).unwrap_or(0);
        Self::ALL[(position + 1) % Self::ALL.len()]
    }

    /// Whether the renderer should interpolate normals and light per pixel
    pub fn per_pixel(self) -> bool {
        matches!(
            self,
            ShadingMode::Phong | ShadingMode::BlinnPhong | ShadingMode::Normal
        )
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown shading mode '{0}'")]
pub struct UnknownShadingMode(pub String);

impl FromStr for ShadingMode {
    type Err = UnknownShadingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| UnknownShadingMode(s.to_string()))
    }
}

/// A directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Direction the light travels, normalized
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vector3::new(-1.0, -1.0, -1.0).normalize(),
            ambient: Vector3::zeros(),
            diffuse: Vector3::new(1.0, 1.0, 1.0),
            specular: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Lambert factor for a unit normal
pub fn lambert(normal: &Vector3<f32>, light: &Light) -> f32 {
    normal.dot(&-light.direction).max(0.0)
}

/// Color of a surface point in `[0, 1]` per channel.
///
/// `to_eye` points from the surface toward the viewer and `depth` is the
/// normalized depth in `[0, 1]`, near to far. A normal that cannot be
/// normalized gets ambient light only.
pub fn shade(
    mode: ShadingMode,
    normal: &Vector3<f32>,
    to_eye: &Vector3<f32>,
    material: &Material,
    light: &Light,
    depth: f32,
) -> Vector3<f32> {
    let ambient = light.ambient.component_mul(&material.ambient.xyz());

    let color = match mode {
        ShadingMode::Depth => {
            let brightness = 1.0 - depth.clamp(0.0, 1.0);
            Vector3::repeat(brightness)
        }
        ShadingMode::Normal => match unit(normal) {
            Some(n) => n.map(|c| c * 0.5 + 0.5),
            None => Vector3::repeat(0.5),
        },
        _ => match unit(normal) {
            Some(n) => {
                ambient
                    + diffuse_term(&n, material, light)
                    + specular_term(mode, &n, to_eye, material, light)
            }
            None => ambient,
        },
    };

    color.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) })
}

fn unit(v: &Vector3<f32>) -> Option<Vector3<f32>> {
    if v.iter().all(|c| c.is_finite()) {
        v.try_normalize(f32::EPSILON)
    } else {
        None
    }
}

fn diffuse_term(normal: &Vector3<f32>, material: &Material, light: &Light) -> Vector3<f32> {
    light.diffuse.component_mul(&material.diffuse.xyz()) * lambert(normal, light)
}

fn specular_term(
    mode: ShadingMode,
    normal: &Vector3<f32>,
    to_eye: &Vector3<f32>,
    material: &Material,
    light: &Light,
) -> Vector3<f32> {
    let to_light = -light.direction;
    if normal.dot(&to_light) <= 0.0 {
        return Vector3::zeros();
    }
    let Some(eye) = unit(to_eye) else {
        return Vector3::zeros();
    };

    let alignment = match mode {
        ShadingMode::Phong => {
            let reflected = normal * (2.0 * normal.dot(&to_light)) - to_light;
            reflected.dot(&eye)
        }
        ShadingMode::BlinnPhong => match (to_light + eye).try_normalize(f32::EPSILON) {
            Some(half) => normal.dot(&half),
            None => 0.0,
        },
        _ => return Vector3::zeros(),
    };

    let strength = alignment.max(0.0).powf(material.shininess.max(1.0));
    light.specular.component_mul(&material.specular.xyz()) * strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mode_cycle_visits_every_mode() {
        let mut mode = ShadingMode::Flat;
        let mut seen = Vec::new();
        for _ in 0..ShadingMode::ALL.len() {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(mode, ShadingMode::Flat);
        assert_eq!(seen, ShadingMode::ALL.to_vec());
    }

    #[test]
    fn test_mode_names_parse() {
        for mode in ShadingMode::ALL {
            assert_eq!(mode.name().parse::<ShadingMode>(), Ok(mode));
        }
        assert_eq!("Blinn-Phong".parse::<ShadingMode>(), Ok(ShadingMode::BlinnPhong));
        assert!("toon".parse::<ShadingMode>().is_err());
    }

    #[test]
    fn test_lambert_bounds() {
        let light = Light::default();
        let facing = -light.direction;
        assert_relative_eq!(lambert(&facing, &light), 1.0, epsilon = 1e-6);
        assert_eq!(lambert(&light.direction, &light), 0.0);
    }

    #[test]
    fn test_shade_stays_in_unit_range() {
        let light = Light::default();
        let material = Material::default();
        let normal = -light.direction;
        for mode in ShadingMode::ALL {
            let color = shade(mode, &normal, &normal, &material, &light, 0.3);
            assert!(color.iter().all(|&c| (0.0..=1.0).contains(&c)), "{mode}: {color:?}");
        }
    }

    #[test]
    fn test_degenerate_normal_gets_ambient() {
        let light = Light::default();
        let material = Material::default();
        let nan = Vector3::new(f32::NAN, f32::NAN, f32::NAN);
        let color = shade(ShadingMode::Phong, &nan, &Vector3::z(), &material, &light, 0.0);
        assert_eq!(color, Vector3::zeros());
    }

    #[test]
    fn test_normal_mode_maps_axes() {
        let color = shade(
            ShadingMode::Normal,
            &Vector3::x(),
            &Vector3::z(),
            &Material::default(),
            &Light::default(),
            0.0,
        );
        assert_relative_eq!(color, Vector3::new(1.0, 0.5, 0.5));
    }
}
