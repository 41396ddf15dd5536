/// Shape building for extrudascii: SVG outlines, extrusion, caching, loading.

pub mod cache;
pub mod error;
pub mod extrude;
pub mod loader;
pub mod svg;

pub use cache::SolidCache;
pub use error::MeshError;
pub use extrude::{Aabb, Solid};
pub use loader::{LoadState, ShapeLoader};
pub use svg::ShapeSet;
