use ex_core::config::SceneConfig;
use ex_core::frame::AsciiGrid;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::canvas;
use crate::fps::FrameClock;

/// Ce que l'UI doit afficher en plus de la grille.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    /// Rotation figée.
    pub paused: bool,
    /// Aide affichée.
    pub help: bool,
    /// Le SVG n'est pas encore chargé.
    pub loading: bool,
    /// Current Y rotation, radians.
    pub rotation_y: f32,
}

/// Draw the full UI: the stretched grid, then the optional HUD and help.
pub fn draw(
    frame: &mut Frame,
    grid: &AsciiGrid,
    config: &SceneConfig,
    y_offset: i32,
    clock: &FrameClock,
    overlay: &Overlay,
) {
    let area = frame.area();
    let bg = config.palette().map_or((0, 0, 0), |(_, bg)| bg);
    canvas::render_grid(frame.buffer_mut(), area, grid, y_offset, bg);

    if config.show_hud && area.height > 0 {
        let hud_area = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
        frame.render_widget(Paragraph::new(hud_line(config, grid, clock, overlay)), hud_area);
    }
    if overlay.help {
        draw_help_overlay(frame, area, config.orbit_controls);
    }
}

/// Ligne d'état : FPS, angle, profondeur, taille de grille.
fn hud_line(
    config: &SceneConfig,
    grid: &AsciiGrid,
    clock: &FrameClock,
    overlay: &Overlay,
) -> Line<'static> {
    let state = if overlay.loading {
        "… LOAD"
    } else if overlay.paused {
        "⏸ PAUSE"
    } else {
        "▶ SPIN"
    };
    let dim = Style::default().fg(Color::DarkGray);
    Line::from(vec![
        Span::styled(format!(" {state} "), Style::default().fg(Color::Green)),
        Span::styled(
            format!(
                "{:.0} FPS ({:.1}ms) │ θ {:.2} │ depth {} │ {}x{} │ ? = help",
                clock.fps(),
                clock.frame_time_ms,
                overlay.rotation_y.rem_euclid(std::f32::consts::TAU),
                config.depth,
                grid.width,
                grid.height,
            ),
            dim,
        ),
    ])
    .style(Style::default().bg(Color::Black))
}

/// Aide centrée, sur fond opaque.
fn draw_help_overlay(frame: &mut Frame, area: Rect, orbit: bool) {
    let mut help_text = vec![
        Line::from(Span::styled(
            " extrudascii — Controls ",
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(" q/Esc    Quit"),
        Line::from(" Space    Pause spin"),
        Line::from(" c        Cycle charset"),
        Line::from(" h        Toggle HUD"),
        Line::from(" ?        Toggle help"),
    ];
    if orbit {
        help_text.push(Line::from(" ←↑↓→     Orbit"));
        help_text.push(Line::from(" drag     Orbit"));
    }
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(
        " Press ? or Esc to close ",
        Style::default().fg(Color::DarkGray),
    )));

    let help_width = 30u16.min(area.width);
    let help_height = (help_text.len() as u16 + 2).min(area.height);
    let x = area.x + area.width.saturating_sub(help_width) / 2;
    let y = area.y + area.height.saturating_sub(help_height) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    let help = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::default().bg(Color::Black).fg(Color::White)),
    );
    frame.render_widget(Clear, help_area);
    frame.render_widget(help, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(config: &SceneConfig, overlay: &Overlay) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();
        let grid = AsciiGrid::new(10, 5);
        let clock = FrameClock::new(10);
        terminal
            .draw(|f| draw(f, &grid, config, 0, &clock, overlay))
            .unwrap();
        screen(&terminal)
    }

    #[test]
    fn hud_is_hidden_by_default() {
        let text = render(&SceneConfig::default(), &Overlay::default());
        assert!(!text.contains("FPS"));
    }

    #[test]
    fn hud_shows_state_and_grid_size() {
        let config = SceneConfig {
            show_hud: true,
            ..SceneConfig::default()
        };
        let text = render(
            &config,
            &Overlay {
                paused: true,
                ..Overlay::default()
            },
        );
        assert!(text.contains("PAUSE"));
        assert!(text.contains("10x5"));
    }

    #[test]
    fn help_lists_orbit_keys_only_when_enabled() {
        let overlay = Overlay {
            help: true,
            ..Overlay::default()
        };
        let plain = render(&SceneConfig::default(), &overlay);
        assert!(plain.contains("Cycle charset"));
        assert!(!plain.contains("Orbit"));
        let orbit = render(
            &SceneConfig {
                orbit_controls: true,
                ..SceneConfig::default()
            },
            &overlay,
        );
        assert!(orbit.contains("Orbit"));
    }
}
