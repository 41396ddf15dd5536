use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// A color string that is neither a CSS name, a hex triplet nor `rgb()`.
    #[error("Couleur invalide : {value}")]
    InvalidColor {
        /// The rejected color string.
        value: String,
    },
}
