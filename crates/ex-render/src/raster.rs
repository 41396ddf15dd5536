use ex_core::color::Rgb;
use ex_core::config::Material;
use ex_core::frame::FrameBuffer;
use glam::{Mat3, Vec2, Vec3};
use rayon::prelude::*;

use crate::camera::{Camera, NEAR};
use crate::scene::{Lights, MeshObject, shade};

/// Triangle projeté, prêt à être rempli.
#[derive(Clone, Copy, Debug)]
struct ScreenTriangle {
    /// Screen-space x, y (pixels, y down) and NDC depth.
    v: [Vec3; 3],
    color: Rgb,
    min_y: u32,
    max_y: u32,
}

/// Rasteriseur logiciel à z-buffer.
///
/// Flat shading per triangle, two-sided (every face is shaded as if it faced
/// the camera), no back-face culling. Triangles with a vertex behind the near
/// plane are skipped. Rows are filled in parallel; each row owns its slice of
/// the color and depth buffers.
///
/// # Example
/// ```
/// use ex_render::raster::Rasterizer;
/// use ex_render::camera::Camera;
/// use ex_render::scene::{Lights, MeshObject};
/// use ex_core::config::Material;
///
/// let mut raster = Rasterizer::new(16, 8);
/// let frame = raster.render(
///     &MeshObject::default(),
///     &Camera::new([0.0; 3]),
///     &Lights::default(),
///     Material::Normal,
///     2.0,
///     (0, 0, 0),
/// );
/// assert_eq!(frame.pixel(3, 3), (0, 0, 0, 255));
/// ```
pub struct Rasterizer {
    color: FrameBuffer,
    depth: Vec<f32>,
    triangles: Vec<ScreenTriangle>,
}

impl Rasterizer {
    /// Pré-alloue les buffers pour `width × height` pixels.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let color = FrameBuffer::new(width, height);
        Self {
            depth: vec![f32::INFINITY; color.pixel_count()],
            color,
            triangles: Vec::new(),
        }
    }

    /// Reallocate the buffers if the size changed.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.color.width == width && self.color.height == height {
            return;
        }
        log::debug!("Raster redimensionné : {width}x{height}");
        self.color = FrameBuffer::new(width, height);
        self.depth = vec![f32::INFINITY; self.color.pixel_count()];
    }

    /// Current color buffer.
    #[must_use]
    pub fn frame(&self) -> &FrameBuffer {
        &self.color
    }

    /// Render `object` as seen from `camera` into the internal buffers.
    ///
    /// `aspect` is the width/height ratio of the viewport the frame will be
    /// displayed in; it may differ from the buffer's own pixel ratio when the
    /// pixels are not square. The frame is cleared to an opaque `bg` first.
    pub fn render(
        &mut self,
        object: &MeshObject,
        camera: &Camera,
        lights: &Lights,
        material: Material,
        aspect: f32,
        bg: Rgb,
    ) -> &FrameBuffer {
        self.color.clear(bg);
        self.depth.fill(f32::INFINITY);
        self.triangles.clear();

        let (width, height) = (self.color.width, self.color.height);
        if width == 0 || height == 0 {
            return &self.color;
        }
        let Some(solid) = object.solid.as_deref() else {
            return &self.color;
        };

        let model = object.model();
        let view = camera.view();
        let view_rot = Mat3::from_mat4(view);
        let mvp = camera.projection(aspect) * view * model;
        let size = Vec2::new(width as f32, height as f32);

        for tri in &solid.triangles {
            let local = tri.map(|i| solid.positions[i as usize]);
            let clip = local.map(|p| mvp * p.extend(1.0));
            // clip.w = distance along the view axis
            if clip.iter().any(|c| c.w < NEAR) {
                continue;
            }
            let screen = clip.map(|c| {
                let ndc = c.truncate() / c.w;
                Vec3::new(
                    (ndc.x * 0.5 + 0.5) * size.x,
                    (0.5 - ndc.y * 0.5) * size.y,
                    ndc.z,
                )
            });

            let world = local.map(|p| model.transform_point3(p));
            let mut normal = (world[1] - world[0]).cross(world[2] - world[0]);
            if normal.length_squared() <= f32::EPSILON {
                continue;
            }
            normal = normal.normalize();
            if normal.dot(camera.position - world[0]) < 0.0 {
                normal = -normal;
            }
            let color = shade(material, lights, normal, (view_rot * normal).normalize());

            let lo = screen[0].y.min(screen[1].y).min(screen[2].y).floor();
            let hi = screen[0].y.max(screen[1].y).max(screen[2].y).ceil();
            if hi < 0.0 || lo >= size.y {
                continue;
            }
            self.triangles.push(ScreenTriangle {
                v: screen,
                color,
                min_y: lo.max(0.0) as u32,
                max_y: (hi as u32).min(height - 1),
            });
        }

        let triangles = &self.triangles;
        let stride = width as usize * 4;
        self.color
            .data
            .par_chunks_exact_mut(stride)
            .zip(self.depth.par_chunks_exact_mut(width as usize))
            .enumerate()
            .for_each(|(y, (row, zrow))| {
                let y = y as u32;
                for tri in triangles.iter().filter(|t| t.min_y <= y && y <= t.max_y) {
                    fill_row(tri, y, width, row, zrow);
                }
            });

        &self.color
    }
}

/// Aire signée (x2) du triangle (a, b, p).
#[inline(always)]
fn edge_function(a: Vec3, b: Vec3, p: Vec2) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

fn fill_row(tri: &ScreenTriangle, y: u32, width: u32, row: &mut [u8], zrow: &mut [f32]) {
    let [v0, v1, v2] = tri.v;
    let area = edge_function(v0, v1, v2.truncate());
    if area.abs() <= f32::EPSILON {
        return;
    }
    let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as u32;
    let max_x = v0.x.max(v1.x).max(v2.x).ceil().min(width as f32 - 1.0);
    if max_x < 0.0 {
        return;
    }
    let max_x = max_x as u32;
    let py = y as f32 + 0.5;

    for x in min_x..=max_x {
        let p = Vec2::new(x as f32 + 0.5, py);
        let w0 = edge_function(v1, v2, p) / area;
        let w1 = edge_function(v2, v0, p) / area;
        let w2 = edge_function(v0, v1, p) / area;
        // Normalized by the signed area: inside means all positive, whatever the winding.
        if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
            continue;
        }
        let z = w0 * v0.z + w1 * v1.z + w2 * v2.z;
        if !(-1.0..=1.0).contains(&z) || z >= zrow[x as usize] {
            continue;
        }
        zrow[x as usize] = z;
        let i = x as usize * 4;
        row[i] = tri.color.0;
        row[i + 1] = tri.color.1;
        row[i + 2] = tri.color.2;
        row[i + 3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ex_mesh::extrude::{Solid, extrude};
    use ex_mesh::svg::parse_svg;
    use std::sync::Arc;

    const BG: Rgb = (1, 2, 3);

    fn object(solid: Solid) -> MeshObject {
        MeshObject {
            solid: Some(Arc::new(solid)),
            rotation_y: 0.0,
        }
    }

    fn square_box() -> Solid {
        let shapes = parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="100" height="100"/></svg>"#,
            12,
        )
        .unwrap();
        extrude(&shapes, 50.0).unwrap()
    }

    fn render(raster: &mut Rasterizer, object: &MeshObject) -> FrameBuffer {
        raster
            .render(
                object,
                &Camera::new([0.0; 3]),
                &Lights::default(),
                Material::Normal,
                1.0,
                BG,
            )
            .clone()
    }

    fn count_bg(frame: &FrameBuffer) -> usize {
        frame
            .data
            .chunks_exact(4)
            .filter(|px| (px[0], px[1], px[2]) == BG)
            .count()
    }

    #[test]
    fn pending_mesh_renders_background_only() {
        let mut raster = Rasterizer::new(32, 32);
        let frame = render(&mut raster, &MeshObject::default());
        assert_eq!(count_bg(&frame), 32 * 32);
        assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn centered_box_covers_the_center_facing_the_camera() {
        let mut raster = Rasterizer::new(64, 64);
        let frame = render(&mut raster, &object(square_box()));
        let (r, g, b, a) = frame.pixel(32, 32);
        assert_ne!((r, g, b), BG);
        assert_eq!(a, 255);
        // View-space normal ≈ +z.
        assert!(b > 200, "bleu attendu, obtenu {:?}", (r, g, b));
        // Corners stay empty.
        assert_eq!(frame.pixel(0, 0), (BG.0, BG.1, BG.2, 255));
        assert!(count_bg(&frame) < 64 * 64);
    }

    #[test]
    fn triangles_behind_the_camera_are_skipped() {
        // Après le flip X, z local -2000 devient z monde +2000 : derrière la caméra.
        let solid = Solid {
            positions: vec![
                Vec3::new(-500.0, -500.0, -2000.0),
                Vec3::new(500.0, -500.0, -2000.0),
                Vec3::new(0.0, 500.0, -2000.0),
            ],
            triangles: vec![[0, 1, 2]],
        };
        let mut raster = Rasterizer::new(32, 32);
        let frame = render(&mut raster, &object(solid));
        assert_eq!(count_bg(&frame), 32 * 32);
    }

    #[test]
    fn nearest_triangle_wins_in_any_order() {
        // Un triangle face caméra (proche) et un incliné (loin) qui se recouvrent.
        let near = [
            Vec3::new(-200.0, -200.0, -100.0),
            Vec3::new(200.0, -200.0, -100.0),
            Vec3::new(0.0, 200.0, -100.0),
        ];
        let far = [
            Vec3::new(-300.0, -300.0, 200.0),
            Vec3::new(300.0, -300.0, 400.0),
            Vec3::new(0.0, 300.0, 300.0),
        ];
        let build = |first: [Vec3; 3], second: [Vec3; 3]| Solid {
            positions: first.into_iter().chain(second).collect(),
            triangles: vec![[0, 1, 2], [3, 4, 5]],
        };
        let mut raster = Rasterizer::new(48, 48);
        let a = render(&mut raster, &object(build(near, far)));
        let b = render(&mut raster, &object(build(far, near)));
        assert_eq!(a.pixel(24, 24), b.pixel(24, 24));
        assert_ne!(a.pixel(24, 24), (BG.0, BG.1, BG.2, 255));
    }

    #[test]
    fn resize_reallocates_once() {
        let mut raster = Rasterizer::new(4, 4);
        raster.resize(10, 6);
        assert_eq!((raster.frame().width, raster.frame().height), (10, 6));
        assert_eq!(raster.depth.len(), 60);
    }
}
