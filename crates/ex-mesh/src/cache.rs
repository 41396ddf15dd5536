use std::sync::Arc;

use crate::error::MeshError;
use crate::extrude::{Solid, extrude};
use crate::svg::ShapeSet;

/// Cache mémoïsé du solide extrudé, clé = (ressource, profondeur).
///
/// The resource identity is the `Arc<ShapeSet>` produced by one load: a
/// reload of the same file yields a new `Arc` and therefore a rebuild.
/// Nothing else (spin speed, colors, camera) is part of the key.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use ex_mesh::cache::SolidCache;
/// use ex_mesh::svg::ShapeSet;
///
/// let mut cache = SolidCache::new();
/// let shapes = Arc::new(ShapeSet::default());
/// let a = cache.get_or_build(&shapes, 10.0).unwrap();
/// let b = cache.get_or_build(&shapes, 10.0).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(cache.builds(), 1);
/// ```
#[derive(Default)]
pub struct SolidCache {
    entry: Option<Entry>,
    builds: usize,
}

struct Entry {
    shapes: Arc<ShapeSet>,
    depth_bits: u32,
    solid: Arc<Solid>,
}

impl SolidCache {
    /// Cache vide.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retourne le solide en cache, ou le reconstruit si la clé a changé.
    ///
    /// # Errors
    /// Propagates [`MeshError::Tessellation`] from the rebuild. The previous
    /// entry is kept on failure.
    pub fn get_or_build(
        &mut self,
        shapes: &Arc<ShapeSet>,
        depth: f32,
    ) -> Result<Arc<Solid>, MeshError> {
        let depth_bits = depth.to_bits();
        if let Some(entry) = &self.entry
            && Arc::ptr_eq(&entry.shapes, shapes)
            && entry.depth_bits == depth_bits
        {
            return Ok(Arc::clone(&entry.solid));
        }

        let solid = Arc::new(extrude(shapes, depth)?);
        self.builds += 1;
        log::info!(
            "Solide reconstruit (profondeur {depth}, {} triangles)",
            solid.triangle_count()
        );
        self.entry = Some(Entry {
            shapes: Arc::clone(shapes),
            depth_bits,
            solid: Arc::clone(&solid),
        });
        Ok(solid)
    }

    /// Nombre de constructions effectuées depuis la création.
    #[must_use]
    pub fn builds(&self) -> usize {
        self.builds
    }

    /// Oublie l'entrée courante (changement de source).
    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::parse_svg;

    fn square() -> Arc<ShapeSet> {
        Arc::new(
            parse_svg(
                r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="20" height="20"/></svg>"#,
                12,
            )
            .unwrap(),
        )
    }

    #[test]
    fn same_key_returns_same_solid() {
        let mut cache = SolidCache::new();
        let shapes = square();
        let a = cache.get_or_build(&shapes, 10.0).unwrap();
        // Les autres paramètres (spin, couleurs) ne passent même pas par le cache.
        let b = cache.get_or_build(&shapes, 10.0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.builds(), 1);
    }

    #[test]
    fn depth_change_rebuilds() {
        let mut cache = SolidCache::new();
        let shapes = square();
        let a = cache.get_or_build(&shapes, 10.0).unwrap();
        let b = cache.get_or_build(&shapes, 50.0).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.bounds().unwrap().size().z, 50.0);
        assert_eq!(cache.builds(), 2);
    }

    #[test]
    fn new_resource_rebuilds_even_if_equal() {
        let mut cache = SolidCache::new();
        let a = cache.get_or_build(&square(), 10.0).unwrap();
        let b = cache.get_or_build(&square(), 10.0).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }

    #[test]
    fn clear_forgets_entry() {
        let mut cache = SolidCache::new();
        let shapes = square();
        cache.get_or_build(&shapes, 10.0).unwrap();
        cache.clear();
        cache.get_or_build(&shapes, 10.0).unwrap();
        assert_eq!(cache.builds(), 2);
    }
}
