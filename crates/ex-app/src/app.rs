use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use ex_core::charset;
use ex_core::config::SceneConfig;
use ex_mesh::cache::SolidCache;
use ex_mesh::loader::{LoadState, ShapeLoader};
use ex_render::camera::{Camera, OrbitControls};
use ex_render::fps::FrameClock;
use ex_render::scene::MeshObject;
use ex_render::ui::{self, Overlay};
use ratatui::DefaultTerminal;

use crate::pipeline::Pipeline;

/// État de la boucle principale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    /// La rotation avance.
    Running,
    /// Rotation figée, l'affichage continue.
    Paused,
    /// Sortie demandée.
    Quitting,
}

/// Application interactive : charge le SVG, fait tourner le solide, affiche.
pub struct App {
    /// Configuration partagée avec le watcher de hot-reload.
    pub config: Arc<ArcSwap<SceneConfig>>,
    /// Dernière configuration prise en compte par `sync_config`.
    applied: Arc<SceneConfig>,
    /// État courant.
    pub state: AppState,
    /// Aide affichée.
    pub show_help: bool,
    loader: ShapeLoader,
    cache: SolidCache,
    /// Objet maillé et sa rotation.
    pub object: MeshObject,
    /// Caméra courante.
    pub camera: Camera,
    orbit: OrbitControls,
    drag_from: Option<(u16, u16)>,
    pipeline: Pipeline,
    clock: FrameClock,
    terminal_size: (u16, u16),
    mouse_captured: bool,
}

fn spawn_loader(config: &SceneConfig) -> Result<ShapeLoader> {
    let src = config
        .src
        .as_deref()
        .context("Aucun fichier SVG : passez SRC ou définissez [scene].src")?;
    Ok(ShapeLoader::spawn(src, config.curve_segments)?)
}

impl App {
    /// Create the app and start loading the configured SVG.
    ///
    /// # Errors
    /// Returns an error if no source is configured or the loader cannot start.
    pub fn new(config: Arc<ArcSwap<SceneConfig>>) -> Result<Self> {
        let applied = config.load_full();
        Ok(Self {
            loader: spawn_loader(&applied)?,
            cache: SolidCache::new(),
            object: MeshObject::default(),
            camera: Camera::new(applied.camera_nudge),
            orbit: OrbitControls::default(),
            drag_from: None,
            pipeline: Pipeline::new(&applied),
            clock: FrameClock::new(60),
            terminal_size: (0, 0), // Force initial resize trigger
            mouse_captured: false,
            state: AppState::Running,
            show_help: false,
            applied,
            config,
        })
    }

    /// Main event loop.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail or the SVG fails to load.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.set_mouse_capture(self.applied.orbit_controls)?;
        let result = self.run_loop(&mut terminal);
        self.set_mouse_capture(false)?;
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let mut last_frame = Instant::now();

        loop {
            if self.state == AppState::Quitting {
                break;
            }

            // === Calcul du frame timing ===
            let frame_duration =
                Duration::from_secs_f64(1.0 / f64::from(self.config.load().target_fps));
            let elapsed = last_frame.elapsed();
            if elapsed < frame_duration {
                // Dormir le temps restant, mais rester réactif aux événements
                if event::poll(frame_duration.saturating_sub(elapsed))? {
                    self.handle_event(&event::read()?);
                }
                continue;
            }
            last_frame = Instant::now();

            while event::poll(Duration::ZERO)? {
                self.handle_event(&event::read()?);
            }
            self.check_resize()?;

            let dt = self.clock.tick();
            self.update(dt)?;

            let config = Arc::clone(&self.applied);
            let (cols, rows) = self.terminal_size;
            let overlay = self.overlay();
            let y_offset = config.y_offset.rows(rows, config.cell_height);
            let grid = self
                .pipeline
                .render_frame(&self.object, &self.camera, &config, cols, rows)?;
            let clock = &self.clock;
            terminal.draw(|f| ui::draw(f, grid, &config, y_offset, clock, &overlay))?;
        }
        Ok(())
    }

    /// One simulation step: pick up config changes, poll the loader, spin.
    ///
    /// # Errors
    /// Returns the load error if the SVG could not be read or parsed.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        self.sync_config()?;

        if let LoadState::Ready(shapes) = self.loader.poll()? {
            let solid = self.cache.get_or_build(&shapes, self.applied.depth)?;
            self.object.solid = Some(solid);
        }
        if self.state == AppState::Running {
            self.object.advance(self.applied.spin_speed, dt);
        }
        Ok(())
    }

    /// Apply a newly published configuration: new source → reload,
    /// nudge/orbit changes → camera. Depth changes go through the cache key.
    /// A source that cannot be loaded is logged and the current one stays.
    fn sync_config(&mut self) -> Result<()> {
        let config = self.config.load_full();
        if Arc::ptr_eq(&config, &self.applied) {
            return Ok(());
        }
        let old = Arc::clone(&self.applied);

        if config.src != old.src || config.curve_segments != old.curve_segments {
            match spawn_loader(&config) {
                Ok(loader) => {
                    log::info!(
                        "Source modifiée ({} → {}), rechargement",
                        self.loader.src().display(),
                        loader.src().display()
                    );
                    self.loader = loader;
                    self.cache.clear();
                    self.object.solid = None;
                }
                Err(e) => {
                    log::warn!("Rechargement ignoré, source conservée : {e:#}");
                }
            }
        }
        if config.orbit_controls != old.orbit_controls {
            if !config.orbit_controls {
                self.camera = Camera::new(config.camera_nudge);
                self.drag_from = None;
            }
            self.set_mouse_capture(config.orbit_controls)?;
        }
        if config.camera_nudge != old.camera_nudge {
            self.camera.set_nudge(config.camera_nudge);
        }
        self.applied = config;
        Ok(())
    }

    fn overlay(&self) -> Overlay {
        Overlay {
            paused: self.state == AppState::Paused,
            help: self.show_help,
            loading: self.object.solid.is_none(),
            rotation_y: self.object.rotation_y,
        }
    }

    /// Handle a terminal event.
    pub fn handle_event(&mut self, event: &Event) {
        match *event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code),
            Event::Mouse(mouse) if self.applied.orbit_controls => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.state = AppState::Quitting,
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.state = AppState::Quitting;
                }
            }
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Char(' ') => {
                self.state = match self.state {
                    AppState::Paused => AppState::Running,
                    AppState::Running => AppState::Paused,
                    AppState::Quitting => AppState::Quitting,
                };
            }
            KeyCode::Char('h') => self.toggle_config(|c| c.show_hud = !c.show_hud),
            KeyCode::Char('c') => self.toggle_config(|c| {
                let next = charset::PRESETS
                    .iter()
                    .position(|p| *p == c.characters)
                    .map_or(0, |i| (i + 1) % charset::PRESETS.len());
                c.characters = charset::PRESETS[next].to_string();
            }),
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down
                if self.applied.orbit_controls =>
            {
                let (left, up) = match code {
                    KeyCode::Left => (1.0, 0.0),
                    KeyCode::Right => (-1.0, 0.0),
                    KeyCode::Up => (0.0, 1.0),
                    _ => (0.0, -1.0),
                };
                self.orbit.step(&mut self.camera, left, up);
            }
            _ => {}
        }
    }

    /// Left drag orbits. Scroll (zoom) and right/middle drag (pan) are ignored.
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let at = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.drag_from = Some(at),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(from) = self.drag_from {
                    let dx = f32::from(at.0) - f32::from(from.0);
                    let dy = f32::from(at.1) - f32::from(from.1);
                    let height = f32::from(self.terminal_size.1.max(1));
                    self.orbit.drag(&mut self.camera, dx, dy, height);
                }
                self.drag_from = Some(at);
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag_from = None,
            _ => {}
        }
    }

    /// Helper to atomically update config.
    fn toggle_config(&mut self, mutate: impl FnOnce(&mut SceneConfig)) {
        let config = self.config.load();
        let mut new = (**config).clone();
        mutate(&mut new);
        self.config.store(Arc::new(new));
    }

    fn set_mouse_capture(&mut self, on: bool) -> Result<()> {
        if on == self.mouse_captured {
            return Ok(());
        }
        if on {
            crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
        } else {
            crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
        }
        self.mouse_captured = on;
        Ok(())
    }

    /// Check if the terminal has been resized.
    fn check_resize(&mut self) -> Result<()> {
        let new_size = crossterm::terminal::size()?;
        if new_size != self.terminal_size {
            self.terminal_size = new_size;
            log::debug!("Terminal resized to {}×{}", new_size.0, new_size.1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use std::io::Write;

    fn svg_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".svg").tempfile().unwrap();
        write!(
            file,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="100" height="100"/></svg>"#
        )
        .unwrap();
        file
    }

    fn app_for(file: &tempfile::NamedTempFile, tweak: impl FnOnce(&mut SceneConfig)) -> App {
        let mut config = SceneConfig {
            src: Some(file.path().to_path_buf()),
            ..SceneConfig::default()
        };
        tweak(&mut config);
        App::new(Arc::new(ArcSwap::from_pointee(config))).unwrap()
    }

    fn wait_loaded(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.object.solid.is_none() {
            assert!(Instant::now() < deadline, "chargement bloqué");
            app.update(0.0).unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn missing_source_is_an_error() {
        let config = Arc::new(ArcSwap::from_pointee(SceneConfig::default()));
        assert!(App::new(config).is_err());
    }

    #[test]
    fn loads_then_spins() {
        let file = svg_file();
        let mut app = app_for(&file, |c| c.spin_speed = 2.0);
        wait_loaded(&mut app);
        let start = app.object.rotation_y;
        app.update(0.5).unwrap();
        assert!((app.object.rotation_y - start - 1.0).abs() < 1e-5);
    }

    #[test]
    fn load_failure_propagates() {
        let config = SceneConfig {
            src: Some("/nonexistent/logo.svg".into()),
            ..SceneConfig::default()
        };
        let mut app = App::new(Arc::new(ArcSwap::from_pointee(config))).unwrap();
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match app.update(0.0) {
                Err(_) => break,
                Ok(()) => {
                    assert!(Instant::now() < deadline, "erreur jamais remontée");
                    std::thread::sleep(Duration::from_millis(5));
                }
            }
        }
    }

    #[test]
    fn config_without_source_keeps_the_current_solid() {
        let file = svg_file();
        let mut app = app_for(&file, |_| {});
        wait_loaded(&mut app);
        let solid = app.object.solid.clone().unwrap();

        app.toggle_config(|c| {
            c.src = None;
            c.spin_speed = 1.0;
        });
        app.update(0.1).unwrap();
        app.update(0.1).unwrap();
        assert!(Arc::ptr_eq(&solid, app.object.solid.as_ref().unwrap()));
        assert_eq!(app.loader.src(), file.path());
        assert_eq!(app.applied.spin_speed, 1.0);
    }

    #[test]
    fn space_pauses_the_spin() {
        let file = svg_file();
        let mut app = app_for(&file, |_| {});
        wait_loaded(&mut app);
        app.handle_event(&key(KeyCode::Char(' ')));
        assert_eq!(app.state, AppState::Paused);
        let before = app.object.rotation_y;
        app.update(1.0).unwrap();
        assert_eq!(app.object.rotation_y, before);
        app.handle_event(&key(KeyCode::Char(' ')));
        assert_eq!(app.state, AppState::Running);
    }

    #[test]
    fn depth_change_rebuilds_but_spin_change_does_not() {
        let file = svg_file();
        let mut app = app_for(&file, |_| {});
        wait_loaded(&mut app);
        let first = app.object.solid.clone().unwrap();

        app.toggle_config(|c| c.spin_speed = 3.0);
        app.update(0.1).unwrap();
        assert!(Arc::ptr_eq(&first, app.object.solid.as_ref().unwrap()));

        app.toggle_config(|c| c.depth = 40.0);
        app.update(0.1).unwrap();
        let rebuilt = app.object.solid.clone().unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.bounds().unwrap().size().z, 40.0);
    }

    #[test]
    fn quit_and_help_keys() {
        let file = svg_file();
        let mut app = app_for(&file, |_| {});
        app.handle_event(&key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_event(&key(KeyCode::Esc));
        assert!(!app.show_help);
        assert_eq!(app.state, AppState::Running);
        app.handle_event(&key(KeyCode::Char('q')));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[test]
    fn c_cycles_builtin_ramps() {
        let file = svg_file();
        let mut app = app_for(&file, |_| {});
        for expected in charset::PRESETS.iter().skip(1).chain(charset::PRESETS.iter().take(1)) {
            app.handle_event(&key(KeyCode::Char('c')));
            assert_eq!(app.config.load().characters, *expected);
        }
    }

    #[test]
    fn drag_orbits_only_when_enabled() {
        let file = svg_file();
        let mut app = app_for(&file, |_| {});
        let home = app.camera;
        app.handle_event(&mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        app.handle_event(&mouse(MouseEventKind::Drag(MouseButton::Left), 20, 5));
        app.handle_event(&key(KeyCode::Left));
        assert_eq!(app.camera, home);

        let mut app = app_for(&file, |c| c.orbit_controls = true);
        assert_eq!(app.camera, home);
        app.terminal_size = (80, 24);
        app.handle_event(&mouse(MouseEventKind::Down(MouseButton::Left), 10, 5));
        app.handle_event(&mouse(MouseEventKind::Drag(MouseButton::Left), 20, 5));
        assert_ne!(app.camera.position, home.position);
        assert_eq!(app.camera.target, home.target);
    }

    #[test]
    fn scroll_does_not_zoom() {
        let file = svg_file();
        let mut app = app_for(&file, |c| c.orbit_controls = true);
        let home = app.camera;
        app.handle_event(&mouse(MouseEventKind::ScrollUp, 0, 0));
        app.handle_event(&mouse(MouseEventKind::Down(MouseButton::Right), 0, 0));
        app.handle_event(&mouse(MouseEventKind::Drag(MouseButton::Right), 9, 9));
        assert_eq!(app.camera, home);
    }
}
