use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use clap::Parser;
use ex_core::config::SceneConfig;

pub mod app;
pub mod cli;
pub mod hotreload;
pub mod pipeline;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config (fichier/preset + overrides CLI)
    let (config, config_path) = resolve_config(&cli)?;

    // Snapshot : une frame sur stdout, pas de terminal
    if cli.snapshot {
        let lines = pipeline::snapshot(&config, cli.cols.max(1), cli.rows.max(1), cli.at)?;
        let mut out = std::io::stdout().lock();
        for line in lines {
            writeln!(out, "{line}")?;
        }
        return Ok(());
    }

    let config = Arc::new(ArcSwap::from_pointee(config));

    // 4. Hot-reload config ; les overrides CLI sont réappliqués à chaque rechargement
    let _watcher = match config_path {
        Some(ref path) => {
            let overrides = cli.clone();
            Some(hotreload::spawn_config_watcher(path, &config, move |c| {
                overrides.apply_overrides(c);
            })?)
        }
        None => None,
    };

    // 5. Construire l'App (lance le chargement du SVG en arrière-plan)
    let mut app_instance = app::App::new(Arc::clone(&config))?;

    // 6. Boucle principale
    let terminal = ratatui::init();
    let result = app_instance.run(terminal);

    // 7. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    ratatui::restore();

    result
}

/// Resolve config: preset takes priority over --config, then CLI overrides.
///
/// Returns the configuration and the file it came from, if any.
fn resolve_config(cli: &cli::Cli) -> Result<(SceneConfig, Option<PathBuf>)> {
    let (mut config, path) = if let Some(ref name) = cli.preset {
        let path = PathBuf::from(format!("config/presets/{name}.toml"));
        if !path.exists() {
            anyhow::bail!("Preset inconnu : {name}. Voir config/presets/ (ex: logo, orbit)");
        }
        (ex_core::config::load_config(&path)?, Some(path))
    } else if cli.config.exists() {
        (
            ex_core::config::load_config(&cli.config)?,
            Some(cli.config.clone()),
        )
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        (SceneConfig::default(), None)
    };

    cli.apply_overrides(&mut config);
    config.validate().context("Configuration invalide")?;
    if config.src.is_none() {
        anyhow::bail!("Aucun fichier SVG : passez SRC ou définissez [scene].src");
    }
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{body}").unwrap();
        file
    }

    #[test]
    fn file_then_flags() {
        let file = config_file("[scene]\nsrc = \"a.svg\"\ndepth = 20.0\n");
        let path = file.path().to_str().unwrap();
        let cli = cli::Cli::parse_from(["extrudascii", "--config", path, "--depth", "5"]);
        let (config, from) = resolve_config(&cli).unwrap();
        assert_eq!(config.src, Some(PathBuf::from("a.svg")));
        assert_eq!(config.depth, 5.0);
        assert_eq!(from.as_deref(), Some(file.path()));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let cli = cli::Cli::parse_from(["extrudascii", "b.svg", "--config", "/nonexistent/x.toml"]);
        let (config, from) = resolve_config(&cli).unwrap();
        assert_eq!(config.src, Some(PathBuf::from("b.svg")));
        assert_eq!(config.depth, SceneConfig::default().depth);
        assert!(from.is_none());
    }

    #[test]
    fn source_is_required() {
        let cli = cli::Cli::parse_from(["extrudascii", "--config", "/nonexistent/x.toml"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let cli = cli::Cli::parse_from(["extrudascii", "x.svg", "--preset", "does-not-exist"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn invalid_flag_values_are_rejected_once() {
        let cli = cli::Cli::parse_from([
            "extrudascii",
            "x.svg",
            "--config",
            "/nonexistent/x.toml",
            "--resolution",
            "0",
        ]);
        assert!(resolve_config(&cli).is_err());
    }
}
