/// ASCII post-processing for extrudascii.
///
/// Converts rendered pixel frames into character grids.
pub mod pass;

pub use pass::AsciiPass;
