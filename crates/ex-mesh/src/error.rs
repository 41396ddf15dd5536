use std::path::PathBuf;

use thiserror::Error;

/// Errors originating from the mesh module (load, parse, build).
#[derive(Error, Debug)]
pub enum MeshError {
    /// The SVG file could not be read.
    #[error("Impossible de lire {path} : {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The SVG document could not be parsed.
    #[error("SVG invalide : {0}")]
    Svg(String),

    /// The fill of an outline could not be triangulated.
    #[error("Erreur de tessellation : {0}")]
    Tessellation(String),

    /// The loader thread went away without reporting a result.
    #[error("Le thread de chargement s'est arrêté sans résultat")]
    LoaderDisconnected,
}
