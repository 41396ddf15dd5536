use std::path::{Path, PathBuf};
use std::sync::Arc;

use flume::TryRecvError;

use crate::error::MeshError;
use crate::svg::{ShapeSet, load_svg};

/// Résultat d'un chargement : en attente ou prêt.
#[derive(Clone, Debug)]
pub enum LoadState {
    /// Le thread de chargement n'a pas encore répondu.
    Pending,
    /// Formes prêtes.
    Ready(Arc<ShapeSet>),
}

/// Charge et parse un SVG sur un thread dédié.
///
/// One load per instance, no retry. The render loop polls it every frame and
/// draws nothing while it is pending.
///
/// # Example
/// ```no_run
/// use ex_mesh::loader::{LoadState, ShapeLoader};
/// use std::path::Path;
///
/// let mut loader = ShapeLoader::spawn(Path::new("assets/logo.svg"), 12).unwrap();
/// match loader.poll().unwrap() {
///     LoadState::Pending => {}
///     LoadState::Ready(shapes) => println!("{} outlines", shapes.outlines.len()),
/// }
/// ```
pub struct ShapeLoader {
    src: PathBuf,
    rx: flume::Receiver<Result<ShapeSet, MeshError>>,
    ready: Option<Arc<ShapeSet>>,
    failed: bool,
}

impl ShapeLoader {
    /// Lance le chargement de `src` en arrière-plan.
    ///
    /// # Errors
    /// Returns [`MeshError::Io`] if the thread cannot be spawned.
    pub fn spawn(src: &Path, curve_segments: u32) -> Result<Self, MeshError> {
        let (tx, rx) = flume::bounded(1);
        let path = src.to_path_buf();
        log::info!("Chargement de {}", path.display());
        std::thread::Builder::new()
            .name("svg-loader".into())
            .spawn(move || {
                let result = load_svg(&path, curve_segments);
                // Receiver dropped = the app moved on to another source.
                let _ = tx.send(result);
            })
            .map_err(|source| MeshError::Io {
                path: src.to_path_buf(),
                source,
            })?;
        Ok(Self {
            src: src.to_path_buf(),
            rx,
            ready: None,
            failed: false,
        })
    }

    /// Non-blocking check of the load.
    ///
    /// # Errors
    /// Returns the load or parse error once, then
    /// [`MeshError::LoaderDisconnected`] on later polls.
    pub fn poll(&mut self) -> Result<LoadState, MeshError> {
        if let Some(shapes) = &self.ready {
            return Ok(LoadState::Ready(Arc::clone(shapes)));
        }
        // Le thread peut ne pas avoir encore lâché `tx` après l'envoi.
        if self.failed {
            return Err(MeshError::LoaderDisconnected);
        }
        match self.rx.try_recv() {
            Ok(result) => self.accept(result),
            Err(TryRecvError::Empty) => Ok(LoadState::Pending),
            Err(TryRecvError::Disconnected) => Err(MeshError::LoaderDisconnected),
        }
    }

    /// Bloque jusqu'à la fin du chargement (mode snapshot).
    ///
    /// # Errors
    /// Returns the load or parse error once, then
    /// [`MeshError::LoaderDisconnected`].
    pub fn wait(&mut self) -> Result<Arc<ShapeSet>, MeshError> {
        if let Some(shapes) = &self.ready {
            return Ok(Arc::clone(shapes));
        }
        if self.failed {
            return Err(MeshError::LoaderDisconnected);
        }
        let result = self.rx.recv().map_err(|_| MeshError::LoaderDisconnected)?;
        match self.accept(result)? {
            LoadState::Ready(shapes) => Ok(shapes),
            LoadState::Pending => Err(MeshError::LoaderDisconnected),
        }
    }

    /// Chemin en cours de chargement.
    #[must_use]
    pub fn src(&self) -> &Path {
        &self.src
    }

    fn accept(&mut self, result: Result<ShapeSet, MeshError>) -> Result<LoadState, MeshError> {
        let shapes = match result {
            Ok(shapes) => Arc::new(shapes),
            Err(e) => {
                self.failed = true;
                return Err(e);
            }
        };
        log::info!(
            "{} chargé : {} outline(s)",
            self.src.display(),
            shapes.outlines.len()
        );
        self.ready = Some(Arc::clone(&shapes));
        Ok(LoadState::Ready(shapes))
    }
}
