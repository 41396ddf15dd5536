use std::str::FromStr;

use crate::error::CoreError;

/// Couleur RGB 8 bits, même convention que `AsciiCell::fg`.
pub type Rgb = (u8, u8, u8);

/// Parse une couleur CSS : nom (`white`, `tomato`), `#rgb`, `#rrggbb`,
/// `rgb(r, g, b)` ou `hsl(...)`. L'alpha éventuel est ignoré.
///
/// # Errors
/// Returns [`CoreError::InvalidColor`] if the string is not a CSS color.
///
/// # Example
/// ```
/// use ex_core::color::parse_color;
/// assert_eq!(parse_color("white").unwrap(), (255, 255, 255));
/// assert_eq!(parse_color("#c87b36").unwrap(), (200, 123, 54));
/// ```
pub fn parse_color(value: &str) -> Result<Rgb, CoreError> {
    let c = svgtypes::Color::from_str(value.trim()).map_err(|_| CoreError::InvalidColor {
        value: value.to_string(),
    })?;
    Ok((c.red, c.green, c.blue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_hex() {
        assert_eq!(parse_color("black").unwrap(), (0, 0, 0));
        assert_eq!(parse_color("#fff").unwrap(), (255, 255, 255));
        assert_eq!(parse_color(" #C87B36 ").unwrap(), (200, 123, 54));
    }

    #[test]
    fn parses_functional_notation() {
        assert_eq!(parse_color("rgb(10, 20, 30)").unwrap(), (10, 20, 30));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_color("not-a-color").unwrap_err();
        assert!(matches!(err, CoreError::InvalidColor { .. }));
    }
}
