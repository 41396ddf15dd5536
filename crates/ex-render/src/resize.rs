use anyhow::{Context, Result};
use ex_core::frame::FrameBuffer;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};

/// Réduit le raster sur-échantillonné à la taille de la grille ASCII.
///
/// Box filter: each output pixel is the plain average of the source pixels it
/// covers, which is what the ASCII pass expects from a supersampled frame.
/// The resizer and its scratch buffer are reused between frames.
///
/// # Example
/// ```
/// use ex_render::resize::Downsampler;
/// use ex_core::frame::FrameBuffer;
/// let mut down = Downsampler::new();
/// let mut src = FrameBuffer::new(8, 8);
/// src.clear((200, 100, 50));
/// let mut dst = FrameBuffer::new(4, 4);
/// down.resize_into(&src, &mut dst).unwrap();
/// assert_eq!(dst.pixel(1, 1), (200, 100, 50, 255));
/// ```
pub struct Downsampler {
    inner: Resizer,
    options: ResizeOptions,
    /// Copie de la source : fast_image_resize exige un `&mut` sur l'image source.
    src_buf: Vec<u8>,
}

impl Downsampler {
    /// Create a box-filter downsampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`. Dimensions of `dst` determine output size.
    ///
    /// # Errors
    /// Returns an error if either buffer has zero or inconsistent dimensions.
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .context("Dimensions source invalides")?;
        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Dimensions destination invalides")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Échec du redimensionnement")?;
        Ok(())
    }
}

impl Default for Downsampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_size_is_a_copy() {
        let mut down = Downsampler::new();
        let mut src = FrameBuffer::new(3, 2);
        src.set_pixel(2, 1, (1, 2, 3));
        let mut dst = FrameBuffer::new(3, 2);
        down.resize_into(&src, &mut dst).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn halving_averages_a_checkerboard() {
        let mut down = Downsampler::new();
        let mut src = FrameBuffer::new(4, 4);
        src.clear((0, 0, 0));
        for y in 0..4 {
            for x in 0..4 {
                if (x + y) % 2 == 0 {
                    src.set_pixel(x, y, (255, 255, 255));
                }
            }
        }
        let mut dst = FrameBuffer::new(2, 2);
        down.resize_into(&src, &mut dst).unwrap();
        let (r, _, _, a) = dst.pixel(0, 0);
        assert!((120..=135).contains(&r), "moyenne attendue ~127, obtenu {r}");
        assert_eq!(a, 255);
    }
}
