use crate::config::SceneConfig;
use crate::frame::{AsciiGrid, FrameBuffer};

/// Passe de post-traitement : transforme une frame pixel rendue en une
/// grille de caractères qui remplace la sortie pixel.
///
/// # Example
/// ```
/// use ex_core::traits::PostProcess;
/// use ex_core::frame::{FrameBuffer, AsciiGrid};
/// use ex_core::config::SceneConfig;
///
/// struct Blank;
/// impl PostProcess for Blank {
///     fn configure(&mut self, _config: &SceneConfig) {}
///     fn process(&self, _input: &FrameBuffer, output: &mut AsciiGrid) {
///         output.cells.fill(Default::default());
///     }
///     fn name(&self) -> &'static str { "blank" }
/// }
/// ```
pub trait PostProcess: Send + Sync {
    /// Rafraîchit les tables internes (rampe, couleurs) depuis la config.
    ///
    /// Appelé avant chaque frame ; doit être bon marché si rien n'a changé.
    fn configure(&mut self, config: &SceneConfig);

    /// Traite une frame et écrit le résultat dans `output`.
    ///
    /// CONTRAT : ne doit PAS allouer. `output` est pré-alloué et réutilisé.
    fn process(&self, input: &FrameBuffer, output: &mut AsciiGrid);

    /// Nom lisible pour le debug/UI.
    fn name(&self) -> &'static str;
}
