use ex_core::color::Rgb;
use ex_core::frame::AsciiGrid;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Écrit une `AsciiGrid` dans un `ratatui::Buffer`, étirée sur toute la zone.
///
/// Each terminal cell takes the nearest grid cell. `y_offset` moves the
/// picture down by that many rows (up if negative); rows that have no source
/// are filled with `bg`. Direct buffer writes, no widget.
///
/// # Example
/// ```
/// use ex_core::frame::{AsciiCell, AsciiGrid};
/// use ex_render::canvas::render_grid;
/// use ratatui::buffer::Buffer;
/// use ratatui::layout::Rect;
///
/// let mut grid = AsciiGrid::new(2, 1);
/// grid.set(1, 0, AsciiCell { ch: '#', ..AsciiCell::default() });
/// let area = Rect::new(0, 0, 4, 2);
/// let mut buf = Buffer::empty(area);
/// render_grid(&mut buf, area, &grid, 0, (0, 0, 0));
/// assert_eq!(buf[(3, 1)].symbol(), "#");
/// assert_eq!(buf[(0, 0)].symbol(), " ");
/// ```
pub fn render_grid(buf: &mut Buffer, area: Rect, grid: &AsciiGrid, y_offset: i32, bg: Rgb) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let bg = Color::Rgb(bg.0, bg.1, bg.2);
    let has_grid = grid.width > 0 && grid.height > 0;

    for ty in 0..area.height {
        let sy = i32::from(ty) - y_offset;
        let source_row = (has_grid && (0..i32::from(area.height)).contains(&sy))
            .then(|| (sy as u32 * u32::from(grid.height) / u32::from(area.height)) as u16);

        for tx in 0..area.width {
            let Some(buf_cell) = buf.cell_mut((area.x + tx, area.y + ty)) else {
                continue;
            };
            match source_row {
                Some(gy) => {
                    let gx = (u32::from(tx) * u32::from(grid.width) / u32::from(area.width)) as u16;
                    let cell = grid.get(gx, gy);
                    buf_cell
                        .set_char(cell.ch)
                        .set_fg(Color::Rgb(cell.fg.0, cell.fg.1, cell.fg.2))
                        .set_bg(Color::Rgb(cell.bg.0, cell.bg.1, cell.bg.2));
                }
                None => {
                    buf_cell.set_char(' ').set_bg(bg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ex_core::frame::AsciiCell;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol().to_string()).collect()
    }

    fn striped() -> AsciiGrid {
        let mut grid = AsciiGrid::new(2, 2);
        for x in 0..2 {
            grid.set(x, 0, AsciiCell { ch: 'a', ..AsciiCell::default() });
            grid.set(x, 1, AsciiCell { ch: 'b', ..AsciiCell::default() });
        }
        grid
    }

    #[test]
    fn grid_is_stretched_to_the_area() {
        let area = Rect::new(0, 0, 6, 4);
        let mut buf = Buffer::empty(area);
        render_grid(&mut buf, area, &striped(), 0, (0, 0, 0));
        assert_eq!(row(&buf, 0), "aaaaaa");
        assert_eq!(row(&buf, 1), "aaaaaa");
        assert_eq!(row(&buf, 2), "bbbbbb");
        assert_eq!(row(&buf, 3), "bbbbbb");
    }

    #[test]
    fn positive_offset_moves_down_and_fills_with_bg() {
        let area = Rect::new(0, 0, 2, 4);
        let mut buf = Buffer::empty(area);
        render_grid(&mut buf, area, &striped(), 1, (9, 8, 7));
        assert_eq!(row(&buf, 0), "  ");
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(9, 8, 7));
        assert_eq!(row(&buf, 1), "aa");
        assert_eq!(row(&buf, 3), "bb");
    }

    #[test]
    fn negative_offset_moves_up() {
        let area = Rect::new(0, 0, 2, 4);
        let mut buf = Buffer::empty(area);
        render_grid(&mut buf, area, &striped(), -2, (0, 0, 0));
        assert_eq!(row(&buf, 0), "bb");
        assert_eq!(row(&buf, 2), "  ");
        assert_eq!(row(&buf, 3), "  ");
    }

    #[test]
    fn cell_colors_are_written() {
        let mut grid = AsciiGrid::new(1, 1);
        grid.set(0, 0, AsciiCell { ch: '@', fg: (200, 123, 54), bg: (1, 1, 1) });
        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        render_grid(&mut buf, area, &grid, 0, (0, 0, 0));
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(200, 123, 54));
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(1, 1, 1));
    }
}
