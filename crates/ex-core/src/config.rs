use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::CHARSET_DEFAULT;
use crate::color::{Rgb, parse_color};
use crate::error::CoreError;

/// Configuration complète de la scène, hot-rechargeable.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut documentée ;
/// seul `src` doit être fourni (CLI ou fichier).
///
/// # Example
/// ```
/// use ex_core::config::SceneConfig;
/// let config = SceneConfig::default();
/// assert_eq!(config.depth, 10.0);
/// assert_eq!(config.resolution, 0.14);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SceneConfig {
    // === Scène ===
    /// Fichier SVG à extruder.
    pub src: Option<PathBuf>,
    /// Profondeur d'extrusion en unités monde.
    pub depth: f32,
    /// Vitesse de rotation autour de Y, en radians par seconde.
    pub spin_speed: f32,
    /// Décalage fixe de la caméra (compense le recadrage de la passe ASCII).
    pub camera_nudge: [f32; 3],
    /// Orbite à la souris (zoom et pan désactivés).
    pub orbit_controls: bool,
    /// Segments par courbe lors de l'aplatissement des chemins SVG.
    pub curve_segments: u32,
    /// Matériau du maillage.
    pub material: Material,

    // === Passe ASCII ===
    /// Résolution de la passe ASCII (plus petit = plus grossier).
    pub resolution: f32,
    /// Rampe de caractères, du sombre au clair.
    pub characters: String,
    /// Couleur CSS des caractères.
    pub fg_color: String,
    /// Couleur CSS du fond.
    pub bg_color: String,
    /// Inverser la rampe (surfaces claires → caractères denses).
    pub invert: bool,
    /// Teinter chaque caractère avec la couleur du pixel source.
    pub colored: bool,
    /// Décalage vertical de toute la sortie.
    pub y_offset: YOffset,
    /// Taille nominale d'une cellule terminal en pixels (largeur).
    pub cell_width: u16,
    /// Taille nominale d'une cellule terminal en pixels (hauteur).
    pub cell_height: u16,
    /// Sur-échantillonnage du raster avant la passe ASCII.
    pub supersample: u32,

    // === Affichage ===
    /// FPS cible.
    pub target_fps: u32,
    /// Afficher la ligne d'état (FPS, angle, profondeur).
    pub show_hud: bool,
}

/// Surface shading model.
///
/// # Example
/// ```
/// use ex_core::config::Material;
/// assert!(matches!(Material::default(), Material::Normal));
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Material {
    /// Couleur = normale en espace vue (n * 0.5 + 0.5). Ignore les lumières.
    #[default]
    Normal,
    /// Lambert : lumière ambiante + directionnelle.
    Lambert,
}

/// Vertical screen offset: pixels, or a percentage of the viewport height.
///
/// Accepts a bare number (pixels) or a sized string: `"50px"`, `"-10vh"`,
/// `"5%"`.
///
/// # Example
/// ```
/// use ex_core::config::YOffset;
/// let off: YOffset = "-10vh".parse().unwrap();
/// assert_eq!(off, YOffset::Viewport(-10.0));
/// assert_eq!(off.rows(40, 14), -4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "YOffsetRepr", into = "YOffsetRepr")]
pub enum YOffset {
    /// Pixels, convertis en lignes via `cell_height`.
    Px(f32),
    /// Pourcentage de la hauteur du viewport (`vh` ou `%`).
    Viewport(f32),
}

impl Default for YOffset {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl YOffset {
    /// Offset in terminal rows for a viewport of `viewport_rows` rows.
    ///
    /// Positive values move the output down.
    #[must_use]
    pub fn rows(&self, viewport_rows: u16, cell_height: u16) -> i32 {
        match *self {
            Self::Px(px) => (px / f32::from(cell_height.max(1))).round() as i32,
            Self::Viewport(pct) => (pct / 100.0 * f32::from(viewport_rows)).round() as i32,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            Self::Px(v) | Self::Viewport(v) => v,
        }
    }
}

impl FromStr for YOffset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || CoreError::Config(format!("y_offset invalide : {s:?}"));
        let (num, ctor): (&str, fn(f32) -> Self) = if let Some(n) = s.strip_suffix("px") {
            (n, Self::Px)
        } else if let Some(n) = s.strip_suffix("vh") {
            (n, Self::Viewport)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, Self::Viewport)
        } else {
            (s, Self::Px)
        };
        let v: f32 = num.trim().parse().map_err(|_| invalid())?;
        if !v.is_finite() {
            return Err(invalid());
        }
        Ok(ctor(v))
    }
}

impl fmt::Display for YOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Viewport(v) => write!(f, "{v}vh"),
        }
    }
}

/// Forme TOML de `YOffset` : nombre ou chaîne dimensionnée.
#[derive(Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum YOffsetRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<YOffsetRepr> for YOffset {
    type Error = CoreError;

    fn try_from(repr: YOffsetRepr) -> Result<Self, Self::Error> {
        match repr {
            YOffsetRepr::Number(v) => Ok(Self::Px(v as f32)),
            YOffsetRepr::Text(s) => s.parse(),
        }
    }
}

impl From<YOffset> for YOffsetRepr {
    fn from(off: YOffset) -> Self {
        match off {
            YOffset::Px(v) => Self::Number(f64::from(v)),
            YOffset::Viewport(_) => Self::Text(off.to_string()),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            src: None,
            depth: 10.0,
            spin_speed: 0.2,
            camera_nudge: [0.0, 0.0, 0.0],
            orbit_controls: false,
            curve_segments: 12,
            material: Material::Normal,
            resolution: 0.14,
            characters: CHARSET_DEFAULT.to_string(),
            fg_color: "white".to_string(),
            bg_color: "black".to_string(),
            invert: true,
            colored: false,
            y_offset: YOffset::default(),
            cell_width: 7,
            cell_height: 14,
            supersample: 2,
            target_fps: 30,
            show_hud: false,
        }
    }
}

impl SceneConfig {
    /// Clamp the numeric fields that size buffers or drive the frame clock.
    /// Called after TOML deserialization and CLI overrides.
    pub fn clamp_all(&mut self) {
        self.target_fps = self.target_fps.clamp(1, 240);
        self.supersample = self.supersample.clamp(1, 4);
        self.curve_segments = self.curve_segments.clamp(1, 64);
        self.cell_width = self.cell_width.max(1);
        self.cell_height = self.cell_height.max(1);
    }

    /// Reject values that cannot be rendered at all.
    ///
    /// Anything renderable is accepted as-is (a negative depth simply
    /// extrudes the other way).
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] or [`CoreError::InvalidColor`].
    pub fn validate(&self) -> Result<(), CoreError> {
        let finite = [
            ("depth", self.depth),
            ("spin_speed", self.spin_speed),
            ("resolution", self.resolution),
            ("camera_nudge.x", self.camera_nudge[0]),
            ("camera_nudge.y", self.camera_nudge[1]),
            ("camera_nudge.z", self.camera_nudge[2]),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(CoreError::Config(format!("{name} doit être fini ({v})")));
            }
        }
        if self.resolution <= 0.0 {
            return Err(CoreError::Config(format!(
                "resolution doit être > 0 ({})",
                self.resolution
            )));
        }
        if self.characters.is_empty() {
            return Err(CoreError::Config("rampe de caractères vide".into()));
        }
        parse_color(&self.fg_color)?;
        parse_color(&self.bg_color)?;
        Ok(())
    }

    /// Foreground and background colors, parsed.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidColor`] if either color is not CSS.
    pub fn palette(&self) -> Result<(Rgb, Rgb), CoreError> {
        Ok((parse_color(&self.fg_color)?, parse_color(&self.bg_color)?))
    }

    /// Taille du raster ASCII pour un viewport de `cols × rows` cellules.
    ///
    /// The viewport is treated as a canvas of `cols·cell_width ×
    /// rows·cell_height` pixels; one character covers `1/resolution` pixels
    /// horizontally and keeps the cell aspect vertically. The grid never
    /// exceeds one character per terminal cell, since it is stretched to the
    /// terminal anyway.
    ///
    /// # Example
    /// ```
    /// use ex_core::config::SceneConfig;
    /// let config = SceneConfig::default();
    /// assert_eq!(config.grid_size(80, 24), (78, 23));
    /// ```
    #[must_use]
    pub fn grid_size(&self, cols: u16, rows: u16) -> (u16, u16) {
        let px_w = f32::from(cols) * f32::from(self.cell_width);
        let px_h = f32::from(rows) * f32::from(self.cell_height);
        let aspect = f32::from(self.cell_width) / f32::from(self.cell_height);
        let gw = (px_w * self.resolution).floor();
        let gh = (px_h * self.resolution * aspect).floor();
        (
            gw.clamp(1.0, f32::from(cols.max(1))) as u16,
            gh.clamp(1.0, f32::from(rows.max(1))) as u16,
        )
    }

    /// `true` si le solide extrudé doit être reconstruit entre `self` et `other`.
    ///
    /// Only the source and the depth key the geometry; everything else
    /// (spin, colors, ramp, camera) is applied per frame.
    #[must_use]
    pub fn geometry_changed(&self, other: &Self) -> bool {
        self.src != other.src
            || self.depth.to_bits() != other.depth.to_bits()
            || self.curve_segments != other.curve_segments
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    scene: Option<SceneSection>,
    ascii: Option<AsciiSection>,
    display: Option<DisplaySection>,
}

/// `[scene]` section, all fields optional for partial override.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneSection {
    src: Option<PathBuf>,
    depth: Option<f32>,
    spin_speed: Option<f32>,
    camera_nudge: Option<[f32; 3]>,
    orbit_controls: Option<bool>,
    curve_segments: Option<u32>,
    material: Option<Material>,
}

/// `[ascii]` section, all fields optional.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AsciiSection {
    resolution: Option<f32>,
    characters: Option<String>,
    fg_color: Option<String>,
    bg_color: Option<String>,
    invert: Option<bool>,
    colored: Option<bool>,
    y_offset: Option<YOffset>,
    cell_width: Option<u16>,
    cell_height: Option<u16>,
    supersample: Option<u32>,
}

/// `[display]` section, all fields optional.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DisplaySection {
    target_fps: Option<u32>,
    show_hud: Option<bool>,
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the TOML is malformed or a value fails validation.
///
/// # Example
/// ```
/// use ex_core::config::parse_config;
/// let config = parse_config("[scene]\ndepth = 50.0\n").unwrap();
/// assert_eq!(config.depth, 50.0);
/// assert_eq!(config.spin_speed, 0.2);
/// ```
pub fn parse_config(content: &str) -> Result<SceneConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = SceneConfig::default();

    if let Some(s) = file.scene {
        if let Some(v) = s.src {
            config.src = Some(v);
        }
        if let Some(v) = s.depth {
            config.depth = v;
        }
        if let Some(v) = s.spin_speed {
            config.spin_speed = v;
        }
        if let Some(v) = s.camera_nudge {
            config.camera_nudge = v;
        }
        if let Some(v) = s.orbit_controls {
            config.orbit_controls = v;
        }
        if let Some(v) = s.curve_segments {
            config.curve_segments = v;
        }
        if let Some(v) = s.material {
            config.material = v;
        }
    }

    if let Some(a) = file.ascii {
        if let Some(v) = a.resolution {
            config.resolution = v;
        }
        if let Some(v) = a.characters {
            config.characters = v;
        }
        if let Some(v) = a.fg_color {
            config.fg_color = v;
        }
        if let Some(v) = a.bg_color {
            config.bg_color = v;
        }
        if let Some(v) = a.invert {
            config.invert = v;
        }
        if let Some(v) = a.colored {
            config.colored = v;
        }
        if let Some(v) = a.y_offset {
            config.y_offset = v;
        }
        if let Some(v) = a.cell_width {
            config.cell_width = v;
        }
        if let Some(v) = a.cell_height {
            config.cell_height = v;
        }
        if let Some(v) = a.supersample {
            config.supersample = v;
        }
    }

    if let Some(d) = file.display {
        if let Some(v) = d.target_fps {
            config.target_fps = v;
        }
        if let Some(v) = d.show_hud {
            config.show_hud = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
/// ```no_run
/// use ex_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<SceneConfig> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Config invalide dans {}", path.display()))?;
    log::debug!("Config chargée : {}", path.display());
    Ok(config)
}
