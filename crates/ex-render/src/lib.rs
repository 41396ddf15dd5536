/// Scene host for extrudascii.
///
/// Camera, lights and the spinning mesh object, a software rasterizer, the
/// supersample downsampler, and the terminal canvas/HUD.
pub mod camera;
pub mod canvas;
pub mod fps;
pub mod raster;
pub mod resize;
pub mod scene;
pub mod ui;
