use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use ex_core::config::SceneConfig;
use notify::{Event, EventKind, RecursiveMode, Watcher};

/// Lance un thread qui surveille le fichier config et met à jour l'ArcSwap.
///
/// `overrides` is applied to every reloaded configuration before it is
/// published, so command-line flags keep winning over the file. A reload that
/// fails to parse or validate is logged and the previous configuration stays.
///
/// Retourne le Watcher (doit rester vivant tant que l'app tourne).
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher<F>(
    config_path: &Path,
    config: &Arc<ArcSwap<SceneConfig>>,
    overrides: F,
) -> Result<impl Watcher + use<F>>
where
    F: Fn(&mut SceneConfig) + Send + 'static,
{
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_))
        {
            match reload(&path, &overrides) {
                Ok(new_config) => {
                    config.store(Arc::new(new_config));
                    log::info!("Config rechargée depuis {}", path.display());
                }
                Err(e) => {
                    log::warn!("Erreur de rechargement config : {e:#}");
                }
            }
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Relit le fichier et réapplique les overrides.
///
/// # Errors
/// Returns an error if the file cannot be loaded, the result is invalid, or
/// it no longer names an SVG source.
pub fn reload(path: &Path, overrides: &impl Fn(&mut SceneConfig)) -> Result<SceneConfig> {
    let mut config = ex_core::config::load_config(path)?;
    overrides(&mut config);
    config.validate()?;
    anyhow::ensure!(
        config.src.is_some(),
        "Aucun fichier SVG : [scene].src absent de {}",
        path.display()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reload_reapplies_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[scene]\nsrc = \"a.svg\"\ndepth = 30.0\nspin_speed = 1.0\n").unwrap();
        let config = reload(file.path(), &|c: &mut SceneConfig| c.depth = 5.0).unwrap();
        assert_eq!(config.depth, 5.0);
        assert_eq!(config.spin_speed, 1.0);
    }

    #[test]
    fn invalid_override_result_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[scene]\nsrc = \"a.svg\"\n[ascii]\nresolution = 0.2\n").unwrap();
        let err = reload(file.path(), &|c: &mut SceneConfig| c.fg_color = "nope".into());
        assert!(err.is_err());
    }

    #[test]
    fn reload_without_source_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[scene]\ndepth = 30.0\n").unwrap();
        assert!(reload(file.path(), &|_: &mut SceneConfig| {}).is_err());
        // Un SRC passé en ligne de commande suffit.
        let config = reload(file.path(), &|c: &mut SceneConfig| {
            c.src = Some("cli.svg".into());
        })
        .unwrap();
        assert_eq!(config.src.as_deref(), Some(Path::new("cli.svg")));
    }

    #[test]
    fn watcher_keeps_previous_config_when_source_disappears() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[scene]\nsrc = \"a.svg\"\n").unwrap();
        let shared = Arc::new(ArcSwap::from_pointee(SceneConfig {
            src: Some("a.svg".into()),
            ..SceneConfig::default()
        }));
        let _watcher = spawn_config_watcher(file.path(), &shared, |_| {}).unwrap();

        std::fs::write(file.path(), "[scene]\ndepth = 42.0\n").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(500));
        assert_eq!(shared.load().src.as_deref(), Some(Path::new("a.svg")));
        assert_eq!(shared.load().depth, SceneConfig::default().depth);
    }

    #[test]
    fn watcher_publishes_modified_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[scene]\nsrc = \"a.svg\"\ndepth = 10.0\n").unwrap();
        let shared = Arc::new(ArcSwap::from_pointee(SceneConfig::default()));
        let _watcher = spawn_config_watcher(file.path(), &shared, |_| {}).unwrap();

        std::fs::write(file.path(), "[scene]\nsrc = \"a.svg\"\ndepth = 42.0\n").unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while shared.load().depth != 42.0 && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(shared.load().depth, 42.0);
    }
}
