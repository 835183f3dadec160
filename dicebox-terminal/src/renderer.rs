/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use dicebox_core::geometry::face_normal;
use dicebox_core::shading::shade;
use dicebox_core::{Camera, Light, Mesh, ShadingMode, Transform, Vertex};
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Half the depth range the depth shader spreads across, around the origin
const DEPTH_HALF_SPAN: f32 = 2.0;

/// A corner after projection, with what the shaders interpolate
#[derive(Debug, Clone, Copy, Default)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    normal: Vector3<f32>,
    to_eye: Vector3<f32>,
}

enum Fill {
    Solid(Vector3<f32>),
    PerVertex([Vector3<f32>; 3]),
    PerPixel,
}

/// ASCII renderer that draws meshes as colored terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
    pub shading: ShadingMode,
    pub light: Light,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
            shading: ShadingMode::default(),
            light: Light::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let shading = self.shading;
        let light = self.light;
        *self = Self::new(width, height);
        self.shading = shading;
        self.light = light;
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
    }

    /// Character at a cell, mostly for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn lit_cells(&self) -> usize {
        self.char_buffer.iter().filter(|&&c| c != ' ').count()
    }

    /// Draw one posed copy of `mesh`
    pub fn render_mesh(&mut self, mesh: &Mesh, model_matrix: &Matrix4<f32>, camera: &Camera) {
        let Some(normal_matrix) = Transform::normal_matrix(&Matrix4::identity(), model_matrix)
        else {
            return;
        };
        for triangle in mesh.triangles() {
            self.render_triangle(triangle, model_matrix, &normal_matrix, camera);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: [&Vertex; 3],
        model_matrix: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        camera: &Camera,
    ) {
        let eye = camera.position();
        let mut corners = [ScreenVertex::default(); 3];
        for (corner, vertex) in corners.iter_mut().zip(triangle) {
            let Some((x, y, depth)) = camera.project_to_screen(
                &vertex.position,
                model_matrix,
                self.width as u32,
                self.height as u32,
            ) else {
                return; // Triangle is clipped
            };
            let world = model_matrix.transform_point(&vertex.position);
            *corner = ScreenVertex {
                x,
                y,
                depth,
                normal: normal_matrix * vertex.normal,
                to_eye: eye - world,
            };
        }

        let material = triangle[0].material;
        let eye_distance = eye.coords.norm();
        let depth_of = |to_eye: &Vector3<f32>| {
            (to_eye.norm() - eye_distance + DEPTH_HALF_SPAN) / (2.0 * DEPTH_HALF_SPAN)
        };

        let fill = match self.shading {
            ShadingMode::Flat => {
                let to_eye = (corners[0].to_eye + corners[1].to_eye + corners[2].to_eye) / 3.0;
                let normal = normal_matrix * face_normal(triangle);
                Fill::Solid(shade(
                    ShadingMode::Flat,
                    &normal,
                    &to_eye,
                    &material,
                    &self.light,
                    depth_of(&to_eye),
                ))
            }
            ShadingMode::Gouraud => Fill::PerVertex(corners.map(|corner| {
                shade(
                    ShadingMode::Gouraud,
                    &corner.normal,
                    &corner.to_eye,
                    &material,
                    &self.light,
                    depth_of(&corner.to_eye),
                )
            })),
            _ => Fill::PerPixel,
        };

        for (index, [w0, w1, w2], depth) in covered_cells(&corners, self.width, self.height) {
            if depth >= self.depth_buffer[index] {
                continue;
            }
            let color = match &fill {
                Fill::Solid(color) => *color,
                Fill::PerVertex([c0, c1, c2]) => c0 * w0 + c1 * w1 + c2 * w2,
                Fill::PerPixel => {
                    let [a, b, c] = &corners;
                    let normal = a.normal * w0 + b.normal * w1 + c.normal * w2;
                    let to_eye = a.to_eye * w0 + b.to_eye * w1 + c.to_eye * w2;
                    shade(
                        self.shading,
                        &normal,
                        &to_eye,
                        &material,
                        &self.light,
                        depth_of(&to_eye),
                    )
                }
            };
            self.plot(index, depth, &color);
        }
    }

    fn plot(&mut self, index: usize, depth: f32, color: &Vector3<f32>) {
        let luminance = 0.299 * color.x + 0.587 * color.y + 0.114 * color.z;
        // Covered cells never use the blank at the bottom of the ramp
        let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
        let ramp_index = 1 + (luminance.clamp(0.0, 1.0) * steps).round() as usize;

        self.depth_buffer[index] = depth;
        self.char_buffer[index] = LUMINOSITY_RAMP[ramp_index.min(LUMINOSITY_RAMP.len() - 1)];
        self.color_buffer[index] = Color::Rgb {
            r: channel(color.x),
            g: channel(color.y),
            b: channel(color.z),
        };
    }

    /// Queue the frame starting at the top-left cell
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let idx = y * self.width + x;
                writer.queue(SetForegroundColor(self.color_buffer[idx]))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn channel(value: f32) -> u8 {
    // Keep dark surfaces readable against a black terminal
    (48.0 + value.clamp(0.0, 1.0) * 207.0) as u8
}

/// Cells inside a projected triangle as `(buffer index, weights, depth)`
fn covered_cells(
    corners: &[ScreenVertex; 3],
    width: usize,
    height: usize,
) -> Vec<(usize, [f32; 3], f32)> {
    let [v0, v1, v2] = corners;
    let mut cells = Vec::new();
    if width == 0 || height == 0 {
        return cells;
    }

    // Bounding box, clipped to the screen
    let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(0);
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(width as i32 - 1);
    let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(0);
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(height as i32 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let point = (x as f32 + 0.5, y as f32 + 0.5);
            if let Some((w0, w1, w2)) =
                barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), point)
            {
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                    cells.push((y as usize * width + x as usize, [w0, w1, w2], depth));
                }
            }
        }
    }
    cells
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
