use anyhow::{Context, Result};
use ex_ascii::AsciiPass;
use ex_core::config::SceneConfig;
use ex_core::frame::{AsciiGrid, FrameBuffer};
use ex_core::traits::PostProcess;
use ex_mesh::cache::SolidCache;
use ex_mesh::loader::ShapeLoader;
use ex_render::camera::Camera;
use ex_render::canvas;
use ex_render::raster::Rasterizer;
use ex_render::resize::Downsampler;
use ex_render::scene::{Lights, MeshObject};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

/// Chaîne de rendu d'une frame : raster sur-échantillonné → réduction →
/// passe ASCII. Les buffers sont réutilisés tant que la taille ne change pas.
pub struct Pipeline {
    raster: Rasterizer,
    downsampler: Downsampler,
    small: FrameBuffer,
    pass: AsciiPass,
    grid: AsciiGrid,
    lights: Lights,
}

impl Pipeline {
    /// Create a pipeline for the given configuration. Buffers are sized on
    /// the first frame.
    #[must_use]
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            raster: Rasterizer::new(1, 1),
            downsampler: Downsampler::new(),
            small: FrameBuffer::new(1, 1),
            pass: AsciiPass::new(config),
            grid: AsciiGrid::new(1, 1),
            lights: Lights::default(),
        }
    }

    /// Render one frame for a `cols × rows` terminal viewport.
    ///
    /// # Errors
    /// Returns an error if the downsampling step fails.
    pub fn render_frame(
        &mut self,
        object: &MeshObject,
        camera: &Camera,
        config: &SceneConfig,
        cols: u16,
        rows: u16,
    ) -> Result<&AsciiGrid> {
        let (gw, gh) = config.grid_size(cols, rows);
        if (gw, gh) != (self.grid.width, self.grid.height) {
            log::debug!("Grille ASCII : {gw}x{gh} pour {cols}x{rows}");
            self.grid = AsciiGrid::new(gw, gh);
            self.small = FrameBuffer::new(u32::from(gw), u32::from(gh));
        }
        let ss = config.supersample.max(1);
        self.raster.resize(u32::from(gw) * ss, u32::from(gh) * ss);

        self.pass.configure(config);
        let aspect = (f32::from(cols) * f32::from(config.cell_width))
            / (f32::from(rows.max(1)) * f32::from(config.cell_height));

        let hi = self.raster.render(
            object,
            camera,
            &self.lights,
            config.material,
            aspect,
            self.pass.background(),
        );
        self.downsampler
            .resize_into(hi, &mut self.small)
            .context("Réduction du raster")?;
        self.pass.process(&self.small, &mut self.grid);
        Ok(&self.grid)
    }
}

/// Rend une frame hors terminal et retourne `rows` lignes de `cols` caractères.
///
/// The SVG is loaded synchronously, the rotation is `spin_speed × at`, and the
/// grid is stretched and offset exactly as on screen.
///
/// # Errors
/// Returns an error if no source is configured or the SVG fails to load.
pub fn snapshot(config: &SceneConfig, cols: u16, rows: u16, at: f32) -> Result<Vec<String>> {
    let src = config
        .src
        .as_deref()
        .context("Aucun fichier SVG : passez SRC ou définissez [scene].src")?;
    let shapes = ShapeLoader::spawn(src, config.curve_segments)?.wait()?;
    let solid = SolidCache::new().get_or_build(&shapes, config.depth)?;

    let mut object = MeshObject {
        solid: Some(solid),
        rotation_y: 0.0,
    };
    object.advance(config.spin_speed, at);
    let camera = Camera::new(config.camera_nudge);

    let mut pipeline = Pipeline::new(config);
    let grid = pipeline.render_frame(&object, &camera, config, cols, rows)?;

    let area = Rect::new(0, 0, cols, rows);
    let mut buf = Buffer::empty(area);
    let (_, bg) = config.palette()?;
    canvas::render_grid(
        &mut buf,
        area,
        grid,
        config.y_offset.rows(rows, config.cell_height),
        bg,
    );
    Ok((0..rows)
        .map(|y| (0..cols).map(|x| buf[(x, y)].symbol()).collect())
        .collect())
}
