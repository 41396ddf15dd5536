/// 10 caractères : la rampe par défaut, du sombre au clair.
pub const CHARSET_DEFAULT: &str = " .:-=+*#%@";

/// 70 caractères, Paul Bourke extended, bon équilibre.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode, pseudo-pixels.
pub const CHARSET_BLOCKS: &str = " ░▒▓█";

/// Minimal, haut contraste.
pub const CHARSET_MINIMAL: &str = " .:░▒▓█";

/// Built-in ramps, cycled at runtime with `c`.
pub const PRESETS: [&str; 4] = [
    CHARSET_DEFAULT,
    CHARSET_STANDARD,
    CHARSET_BLOCKS,
    CHARSET_MINIMAL,
];

/// Luminance 8 bits d'un pixel, pondération (0.30, 0.59, 0.11).
///
/// # Example
/// ```
/// use ex_core::charset::brightness;
/// assert_eq!(brightness(255, 255, 255), 255);
/// assert_eq!(brightness(0, 0, 0), 0);
/// ```
#[inline(always)]
#[must_use]
pub fn brightness(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 30 + u32::from(g) * 59 + u32::from(b) * 11) / 100) as u8
}

/// Lookup table mapping brightness [0..255] → character.
///
/// The ramp is ordered dark→light. Without inversion the brightest pixel
/// maps to the first character (`idx = floor((1 - b) * (n - 1))`); with
/// inversion the index is mirrored, so bright surfaces get the dense end of
/// the ramp on a dark background.
///
/// # Example
/// ```
/// use ex_core::charset::LuminanceLut;
/// let lut = LuminanceLut::new(" .:#@", true);
/// assert_eq!(lut.map(0), ' ');
/// assert_eq!(lut.map(255), '@');
/// ```
pub struct LuminanceLut {
    lut: [char; 256],
}

impl LuminanceLut {
    /// Build a LUT from a ramp ordered dark→light.
    ///
    /// An empty ramp falls back to a single space.
    #[must_use]
    pub fn new(charset: &str, invert: bool) -> Self {
        let chars: Vec<char> = charset.chars().collect();
        if chars.is_empty() {
            return Self::new(" ", invert);
        }
        let last = chars.len() - 1;
        let mut lut = [' '; 256];
        for (lum, slot) in lut.iter_mut().enumerate() {
            // (1 - lum/255) * last, computed in integers to stay exact.
            let mut idx = (255 - lum) * last / 255;
            if invert {
                idx = last - idx;
            }
            *slot = chars[idx];
        }
        Self { lut }
    }

    /// Map a brightness value [0..255] to a character.
    ///
    /// # Example
    /// ```
    /// use ex_core::charset::LuminanceLut;
    /// let lut = LuminanceLut::new(" .:#@", false);
    /// assert_eq!(lut.map(255), ' ');
    /// assert_eq!(lut.map(0), '@');
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn map(&self, brightness: u8) -> char {
        self.lut[brightness as usize]
    }
}
