use ex_core::charset::{LuminanceLut, brightness};
use ex_core::color::Rgb;
use ex_core::config::SceneConfig;
use ex_core::frame::{AsciiCell, AsciiGrid, FrameBuffer};
use ex_core::traits::PostProcess;
use rayon::prelude::*;

/// Passe ASCII : chaque cellule de la grille reçoit un caractère de la rampe
/// choisi d'après la luminosité moyenne du bloc de pixels qu'elle couvre.
///
/// Brightness is `(0.3r + 0.59g + 0.11b) / 255`; a fully transparent pixel
/// counts as brightness 1. Every character is drawn in `fg_color` on
/// `bg_color`, unless `colored` is set, in which case the character takes
/// the averaged source color.
///
/// # Example
/// ```
/// use ex_ascii::pass::AsciiPass;
/// use ex_core::config::SceneConfig;
/// use ex_core::frame::{AsciiGrid, FrameBuffer};
/// use ex_core::traits::PostProcess;
///
/// let mut pass = AsciiPass::new(&SceneConfig::default());
/// let mut frame = FrameBuffer::new(4, 2);
/// frame.clear((255, 255, 255));
/// let mut grid = AsciiGrid::new(4, 2);
/// pass.process(&frame, &mut grid);
/// assert_eq!(grid.row_string(0), "@@@@");
/// ```
pub struct AsciiPass {
    lut: LuminanceLut,
    characters: String,
    invert: bool,
    fg: Rgb,
    bg: Rgb,
    colored: bool,
}

impl AsciiPass {
    /// Build the pass from the current configuration.
    #[must_use]
    pub fn new(config: &SceneConfig) -> Self {
        let mut pass = Self {
            lut: LuminanceLut::new(&config.characters, config.invert),
            characters: config.characters.clone(),
            invert: config.invert,
            fg: (255, 255, 255),
            bg: (0, 0, 0),
            colored: config.colored,
        };
        pass.configure(config);
        pass
    }

    /// Background color, also used to clear the pixel frame.
    #[must_use]
    pub fn background(&self) -> Rgb {
        self.bg
    }
}

impl PostProcess for AsciiPass {
    fn configure(&mut self, config: &SceneConfig) {
        if self.characters != config.characters || self.invert != config.invert {
            self.lut = LuminanceLut::new(&config.characters, config.invert);
            self.characters.clone_from(&config.characters);
            self.invert = config.invert;
            log::debug!("Rampe ASCII : {:?} (invert={})", self.characters, self.invert);
        }
        match config.palette() {
            Ok((fg, bg)) => {
                self.fg = fg;
                self.bg = bg;
            }
            Err(e) => log::warn!("Palette ignorée : {e}"),
        }
        self.colored = config.colored;
    }

    fn process(&self, input: &FrameBuffer, output: &mut AsciiGrid) {
        if output.width == 0 || output.height == 0 {
            return;
        }
        let gw = u32::from(output.width);
        let gh = u32::from(output.height);

        output
            .cells
            .par_chunks_mut(output.width as usize)
            .enumerate()
            .for_each(|(cy, row)| {
                let (y0, y1) = span(cy as u32, gh, input.height);
                for (cx, cell) in row.iter_mut().enumerate() {
                    let (x0, x1) = span(cx as u32, gw, input.width);
                    let (lum, color) = sample_block(input, x0, x1, y0, y1);
                    *cell = AsciiCell {
                        ch: self.lut.map(lum),
                        fg: if self.colored { color } else { self.fg },
                        bg: self.bg,
                    };
                }
            });
    }

    fn name(&self) -> &'static str {
        "ascii"
    }
}

/// Pixel range `[start, end)` covered by cell `i` of `cells` over `len` pixels.
/// Never empty while `len > 0`.
#[inline(always)]
fn span(i: u32, cells: u32, len: u32) -> (u32, u32) {
    let start = i * len / cells;
    let end = ((i + 1) * len / cells).max(start + 1).min(len);
    (start.min(len.saturating_sub(1)), end)
}

/// Luminosité et couleur moyennes d'un bloc.
fn sample_block(frame: &FrameBuffer, x0: u32, x1: u32, y0: u32, y1: u32) -> (u8, Rgb) {
    let (mut lum, mut r, mut g, mut b, mut n) = (0u32, 0u32, 0u32, 0u32, 0u32);
    for y in y0..y1 {
        for x in x0..x1 {
            let (pr, pg, pb, pa) = frame.pixel(x, y);
            lum += if pa == 0 {
                255
            } else {
                u32::from(brightness(pr, pg, pb))
            };
            r += u32::from(pr);
            g += u32::from(pg);
            b += u32::from(pb);
            n += 1;
        }
    }
    if n == 0 {
        return (255, (0, 0, 0));
    }
    (
        (lum / n) as u8,
        ((r / n) as u8, (g / n) as u8, (b / n) as u8),
    )
}
