use glam::Vec3;
use lyon_tessellation::math::point;
use lyon_tessellation::path::Path as FillPath;
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};

use crate::error::MeshError;
use crate::svg::{Outline, ShapeSet};

/// Boîte englobante alignée sur les axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Coin minimal.
    pub min: Vec3,
    /// Coin maximal.
    pub max: Vec3,
}

impl Aabb {
    /// Centre de la boîte.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Dimensions de la boîte.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Solide extrudé : un maillage triangulaire indexé.
///
/// Built once per (shape set, depth) pair and shared as `Arc<Solid>`.
///
/// # Example
/// ```
/// use ex_mesh::svg::parse_svg;
/// use ex_mesh::extrude::extrude;
/// let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="100" height="100"/></svg>"#;
/// let solid = extrude(&parse_svg(svg, 12).unwrap(), 50.0).unwrap();
/// let size = solid.bounds().unwrap().size();
/// assert_eq!(size.z, 50.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solid {
    /// Sommets en unités monde.
    pub positions: Vec<Vec3>,
    /// Triangles, indices dans `positions`.
    pub triangles: Vec<[u32; 3]>,
}

impl Solid {
    /// Boîte englobante, `None` pour un solide vide.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        let first = *self.positions.first()?;
        let (min, max) = self
            .positions
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Some(Aabb { min, max })
    }

    /// Translate the solid so that its bounding-box center is the origin.
    pub fn center(&mut self) {
        if let Some(bounds) = self.bounds() {
            let offset = bounds.center();
            for p in &mut self.positions {
                *p -= offset;
            }
        }
    }

    /// Nombre de triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&[a, b, c]);
        self.triangles.push([base, base + 1, base + 2]);
    }
}

/// Extrude every outline of `shapes` by `depth` along +z, with no bevel,
/// merge them into one solid and center it on the origin.
///
/// Caps are triangulated with the non-zero winding rule, so overlapping and
/// self-intersecting contours fill solid and counter-wound contours cut
/// holes.
///
/// # Errors
/// Returns [`MeshError::Tessellation`] if a cap cannot be triangulated.
pub fn extrude(shapes: &ShapeSet, depth: f32) -> Result<Solid, MeshError> {
    let mut solid = Solid::default();
    let mut tessellator = FillTessellator::new();
    let options = FillOptions::default().with_fill_rule(FillRule::NonZero);

    for outline in &shapes.outlines {
        extrude_caps(outline, depth, &mut tessellator, &options, &mut solid)?;
        extrude_walls(outline, depth, &mut solid);
    }

    solid.center();
    log::debug!(
        "Solide extrudé : {} triangle(s), profondeur {depth}",
        solid.triangle_count()
    );
    Ok(solid)
}

fn extrude_caps(
    outline: &Outline,
    depth: f32,
    tessellator: &mut FillTessellator,
    options: &FillOptions,
    solid: &mut Solid,
) -> Result<(), MeshError> {
    let mut builder = FillPath::builder();
    for contour in &outline.contours {
        let Some((first, rest)) = contour.split_first() else {
            continue;
        };
        builder.begin(point(first.x, first.y));
        for p in rest {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(true);
    }
    let path = builder.build();

    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    tessellator
        .tessellate_path(
            &path,
            options,
            &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| v.position().to_array()),
        )
        .map_err(|e| MeshError::Tessellation(format!("{e:?}")))?;

    let at = |i: u32, z: f32| {
        let [x, y] = buffers.vertices[i as usize];
        Vec3::new(x, y, z)
    };
    for tri in buffers.indices.chunks_exact(3) {
        // Back cap faces -z, front cap faces +z.
        solid.push_triangle(at(tri[0], 0.0), at(tri[2], 0.0), at(tri[1], 0.0));
        solid.push_triangle(at(tri[0], depth), at(tri[1], depth), at(tri[2], depth));
    }
    Ok(())
}

fn extrude_walls(outline: &Outline, depth: f32, solid: &mut Solid) {
    for contour in &outline.contours {
        let n = contour.len();
        for i in 0..n {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            let a0 = Vec3::new(a.x, a.y, 0.0);
            let b0 = Vec3::new(b.x, b.y, 0.0);
            let a1 = Vec3::new(a.x, a.y, depth);
            let b1 = Vec3::new(b.x, b.y, depth);
            solid.push_triangle(a0, b0, b1);
            solid.push_triangle(a0, b1, a1);
        }
    }
}
