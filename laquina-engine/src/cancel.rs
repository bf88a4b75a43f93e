use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Jeton d'annulation coopératif, partageable entre threads.
///
/// Le moteur l'interroge une fois par candidat brut et entre chaque étape ;
/// une annulation fait échouer l'appel sans résultat partiel.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
