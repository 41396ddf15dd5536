/// Configuration, types, and shared structures for extrudascii.
///
/// This crate contains all shared types, traits, and configuration logic
/// used across the extrudascii workspace.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::LuminanceLut;
pub use config::SceneConfig;
pub use error::CoreError;
pub use frame::{AsciiCell, AsciiGrid, FrameBuffer};
