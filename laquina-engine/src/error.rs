use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Le jeton d'annulation a été déclenché pendant la génération.
    #[error("génération annulée")]
    Cancelled,

    #[error("configuration invalide : {0}")]
    InvalidConfiguration(String),

    /// Un tirage de l'historique ne respecte pas le domaine du jeu.
    #[error("tirage {index} invalide : {reason}")]
    InvalidDraw { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub(crate) fn invalid(msg: impl Into<String>) -> EngineError {
    EngineError::InvalidConfiguration(msg.into())
}
