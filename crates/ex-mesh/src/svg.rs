use std::path::Path;

use glam::Vec2;
use usvg::tiny_skia_path::PathSegment;

use crate::error::MeshError;

/// Contour fermé, en coordonnées utilisateur SVG (y vers le bas).
pub type Contour = Vec<Vec2>;

/// Un chemin SVG aplati : ses contours partagent une règle de remplissage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    /// Closed contours (outer boundaries and holes alike).
    pub contours: Vec<Contour>,
}

/// Every visible outline of one SVG document.
///
/// # Example
/// ```
/// use ex_mesh::svg::parse_svg;
/// let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="10" height="5"/></svg>"#;
/// let shapes = parse_svg(svg, 12).unwrap();
/// assert_eq!(shapes.outlines.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeSet {
    /// One entry per visible path, in document order.
    pub outlines: Vec<Outline>,
}

impl ShapeSet {
    /// Bornes 2D (min, max) de tous les contours, `None` si vide.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut points = self
            .outlines
            .iter()
            .flat_map(|o| o.contours.iter())
            .flat_map(|c| c.iter().copied());
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Total number of contour points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.outlines
            .iter()
            .flat_map(|o| o.contours.iter())
            .map(Vec::len)
            .sum()
    }
}

/// Aire signée d'un contour (formule du lacet). Positive = sens horaire
/// à l'écran, puisque l'axe y pointe vers le bas.
#[must_use]
pub fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    twice * 0.5
}

/// Charge et parse un fichier SVG (ou SVGZ).
///
/// # Errors
/// Returns [`MeshError::Io`] if the file cannot be read and
/// [`MeshError::Svg`] if it is not a valid SVG document.
pub fn load_svg(path: &Path, curve_segments: u32) -> Result<ShapeSet, MeshError> {
    let data = std::fs::read(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| MeshError::Svg(e.to_string()))?;
    let shapes = collect_shapes(&tree, curve_segments);
    log::debug!(
        "{} : {} outline(s), {} point(s)",
        path.display(),
        shapes.outlines.len(),
        shapes.point_count()
    );
    Ok(shapes)
}

/// Parse un document SVG en mémoire.
///
/// # Errors
/// Returns [`MeshError::Svg`] if the text is not a valid SVG document.
pub fn parse_svg(text: &str, curve_segments: u32) -> Result<ShapeSet, MeshError> {
    let tree = usvg::Tree::from_str(text, &usvg::Options::default())
        .map_err(|e| MeshError::Svg(e.to_string()))?;
    Ok(collect_shapes(&tree, curve_segments))
}

fn collect_shapes(tree: &usvg::Tree, curve_segments: u32) -> ShapeSet {
    let mut shapes = ShapeSet::default();
    walk_group(tree.root(), curve_segments.max(1), &mut shapes);
    shapes
}

fn walk_group(group: &usvg::Group, segments: u32, out: &mut ShapeSet) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => walk_group(g, segments, out),
            usvg::Node::Path(p) => {
                if !p.is_visible() {
                    continue;
                }
                let Some(data) = p.data().clone().transform(p.abs_transform()) else {
                    continue;
                };
                let outline = flatten(&data, segments);
                if !outline.contours.is_empty() {
                    out.outlines.push(outline);
                }
            }
            _ => {}
        }
    }
}

/// Aplatit un chemin en contours fermés.
///
/// Quadratic and cubic curves are sampled uniformly with `segments` steps.
/// Contours with fewer than three distinct points enclose no area and are
/// dropped.
fn flatten(path: &usvg::tiny_skia_path::Path, segments: u32) -> Outline {
    let mut outline = Outline::default();
    let mut current: Contour = Vec::new();
    let mut cursor = Vec2::ZERO;

    let push = |contour: &mut Contour, p: Vec2| {
        if contour.last().is_none_or(|last| last.distance_squared(p) > f32::EPSILON) {
            contour.push(p);
        }
    };

    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                finish(&mut outline, &mut current);
                cursor = Vec2::new(p.x, p.y);
                current.push(cursor);
            }
            PathSegment::LineTo(p) => {
                cursor = Vec2::new(p.x, p.y);
                push(&mut current, cursor);
            }
            PathSegment::QuadTo(c, p) => {
                let (p0, p1, p2) = (cursor, Vec2::new(c.x, c.y), Vec2::new(p.x, p.y));
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    push(&mut current, p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t));
                }
                cursor = p2;
            }
            PathSegment::CubicTo(c1, c2, p) => {
                let (p0, p1, p2, p3) = (
                    cursor,
                    Vec2::new(c1.x, c1.y),
                    Vec2::new(c2.x, c2.y),
                    Vec2::new(p.x, p.y),
                );
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    push(
                        &mut current,
                        p0 * (u * u * u)
                            + p1 * (3.0 * u * u * t)
                            + p2 * (3.0 * u * t * t)
                            + p3 * (t * t * t),
                    );
                }
                cursor = p3;
            }
            PathSegment::Close => {
                if let Some(&start) = current.first() {
                    cursor = start;
                }
                finish(&mut outline, &mut current);
            }
        }
    }
    finish(&mut outline, &mut current);
    outline
}

fn finish(outline: &mut Outline, current: &mut Contour) {
    let mut contour = std::mem::take(current);
    // Closing point duplicates the start.
    if contour.len() > 1
        && let (Some(first), Some(last)) = (contour.first(), contour.last())
        && first.distance_squared(*last) <= f32::EPSILON
    {
        contour.pop();
    }
    if contour.len() >= 3 && signed_area(&contour).abs() > f32::EPSILON {
        outline.contours.push(contour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg(body: &str) -> String {
        format!(r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200">{body}</svg>"#)
    }

    #[test]
    fn rect_becomes_one_square_contour() {
        let shapes = parse_svg(&svg(r#"<rect x="10" y="20" width="100" height="100"/>"#), 12)
            .unwrap();
        assert_eq!(shapes.outlines.len(), 1);
        let contour = &shapes.outlines[0].contours[0];
        assert_eq!(contour.len(), 4);
        assert!((signed_area(contour).abs() - 10_000.0).abs() < 1e-2);
        let (lo, hi) = shapes.bounds().unwrap();
        assert_eq!(lo, Vec2::new(10.0, 20.0));
        assert_eq!(hi, Vec2::new(110.0, 120.0));
    }

    #[test]
    fn group_transforms_are_applied() {
        let shapes = parse_svg(
            &svg(r#"<g transform="translate(50 0)"><path d="M0 0 H10 V10 H0 Z"/></g>"#),
            12,
        )
        .unwrap();
        let (lo, hi) = shapes.bounds().unwrap();
        assert_eq!(lo, Vec2::new(50.0, 0.0));
        assert_eq!(hi, Vec2::new(60.0, 10.0));
    }

    #[test]
    fn curves_are_flattened_with_requested_segments() {
        let shapes = parse_svg(&svg(r#"<path d="M0 0 Q50 100 100 0 Z"/>"#), 8).unwrap();
        let contour = &shapes.outlines[0].contours[0];
        // start + 8 curve samples
        assert_eq!(contour.len(), 9);
        assert!(contour.iter().all(|p| p.y >= 0.0 && p.y <= 50.0));
    }

    #[test]
    fn hole_contours_are_kept_in_the_same_outline() {
        let shapes = parse_svg(
            &svg(r#"<path d="M0 0 H100 V100 H0 Z M25 25 V75 H75 V25 Z"/>"#),
            12,
        )
        .unwrap();
        assert_eq!(shapes.outlines.len(), 1);
        assert_eq!(shapes.outlines[0].contours.len(), 2);
    }

    #[test]
    fn open_lines_enclose_nothing() {
        let shapes = parse_svg(
            &svg(r#"<path d="M0 0 L100 100" stroke="black" fill="none"/>"#),
            12,
        )
        .unwrap();
        assert!(shapes.outlines.is_empty());
        assert!(shapes.bounds().is_none());
    }

    #[test]
    fn hidden_paths_are_skipped() {
        let shapes = parse_svg(
            &svg(r#"<rect width="10" height="10" visibility="hidden"/><rect width="5" height="5"/>"#),
            12,
        )
        .unwrap();
        assert_eq!(shapes.outlines.len(), 1);
    }

    #[test]
    fn garbage_is_an_svg_error() {
        assert!(matches!(parse_svg("not svg", 12), Err(MeshError::Svg(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_svg(Path::new("/nonexistent/logo.svg"), 12).unwrap_err();
        assert!(matches!(err, MeshError::Io { .. }));
    }
}
