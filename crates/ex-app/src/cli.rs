use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ex_core::config::{Material, SceneConfig, YOffset};

/// extrudascii: spinning extruded SVG rendered as ASCII art.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier SVG à extruder (remplace `[scene].src`).
    pub src: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Charger un preset nommé (ignore --config) : logo, orbit.
    #[arg(long)]
    pub preset: Option<String>,

    /// Profondeur d'extrusion.
    #[arg(long, allow_negative_numbers = true)]
    pub depth: Option<f32>,

    /// Résolution de la passe ASCII.
    #[arg(long)]
    pub resolution: Option<f32>,

    /// Couleur CSS des caractères.
    #[arg(long)]
    pub fg_color: Option<String>,

    /// Couleur CSS du fond.
    #[arg(long)]
    pub bg_color: Option<String>,

    /// Rampe de caractères, du sombre au clair.
    #[arg(long)]
    pub characters: Option<String>,

    /// Vitesse de rotation (rad/s).
    #[arg(long, allow_negative_numbers = true)]
    pub spin_speed: Option<f32>,

    /// Décalage vertical : nombre (px), "<n>px", "<n>vh" ou "<n>%".
    #[arg(long, allow_hyphen_values = true)]
    pub y_offset: Option<YOffset>,

    /// Décalage de la caméra "X,Y,Z".
    #[arg(long, value_parser = parse_nudge, allow_hyphen_values = true)]
    pub camera_nudge: Option<[f32; 3]>,

    /// Activer l'orbite à la souris et aux flèches.
    #[arg(long, default_value_t = false)]
    pub orbit: bool,

    /// Matériau du maillage.
    #[arg(long, value_enum)]
    pub material: Option<MaterialArg>,

    /// Teinter chaque caractère avec la couleur source.
    #[arg(long, default_value_t = false)]
    pub colored: bool,

    /// FPS cible.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Désactiver l'inversion de la rampe.
    #[arg(long, default_value_t = false)]
    pub no_invert: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Rendre une seule frame sur stdout puis quitter.
    #[arg(long, default_value_t = false)]
    pub snapshot: bool,

    /// Largeur du snapshot en colonnes.
    #[arg(long, default_value_t = 80)]
    pub cols: u16,

    /// Hauteur du snapshot en lignes.
    #[arg(long, default_value_t = 24)]
    pub rows: u16,

    /// Instant du snapshot en secondes (rotation = spin_speed × at).
    #[arg(long, default_value_t = 0.0)]
    pub at: f32,
}

/// Matériau, côté ligne de commande.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialArg {
    /// Normal-colored surfaces.
    Normal,
    /// Ambient + directional lighting.
    Lambert,
}

impl From<MaterialArg> for Material {
    fn from(arg: MaterialArg) -> Self {
        match arg {
            MaterialArg::Normal => Self::Normal,
            MaterialArg::Lambert => Self::Lambert,
        }
    }
}

impl Cli {
    /// Apply the command-line overrides on top of a file configuration.
    ///
    /// Called once at startup and again after every hot reload, so flags
    /// always win over the file.
    pub fn apply_overrides(&self, config: &mut SceneConfig) {
        if let Some(ref src) = self.src {
            config.src = Some(src.clone());
        }
        if let Some(v) = self.depth {
            config.depth = v;
        }
        if let Some(v) = self.resolution {
            config.resolution = v;
        }
        if let Some(ref v) = self.fg_color {
            config.fg_color.clone_from(v);
        }
        if let Some(ref v) = self.bg_color {
            config.bg_color.clone_from(v);
        }
        if let Some(ref v) = self.characters {
            config.characters.clone_from(v);
        }
        if let Some(v) = self.spin_speed {
            config.spin_speed = v;
        }
        if let Some(v) = self.y_offset {
            config.y_offset = v;
        }
        if let Some(v) = self.camera_nudge {
            config.camera_nudge = v;
        }
        if self.orbit {
            config.orbit_controls = true;
        }
        if let Some(v) = self.material {
            config.material = v.into();
        }
        if self.colored {
            config.colored = true;
        }
        if let Some(v) = self.fps {
            config.target_fps = v;
        }
        if self.no_invert {
            config.invert = false;
        }
        config.clamp_all();
    }
}

/// Parse "X,Y,Z" en trois flottants.
fn parse_nudge(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("attendu X,Y,Z, obtenu {s:?}"));
    };
    let parse = |v: &str| v.parse::<f32>().map_err(|e| format!("{v:?} : {e}"));
    Ok([parse(x)?, parse(y)?, parse(z)?])
}
