//! Types d'erreurs pour le crate collectifs
//!
//! Le chemin de parsing lui-même ne produit jamais d'erreur : les données de
//! recensement sont trop hétérogènes pour qu'un schéma soit "invalide". Seule
//! la couche cache/persistance peut échouer.

use thiserror::Error;

/// Erreurs pouvant survenir autour du cache persistant
#[derive(Debug, Error)]
pub enum CollectifError {
    /// Erreur d'I/O lors de la lecture/écriture du store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sérialisation/désérialisation JSON du cache
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Erreur générique du store
    #[error("Cache store error: {0}")]
    Store(String),
}

impl CollectifError {
    /// Crée une erreur de store avec contexte
    pub fn store(reason: impl Into<String>) -> Self {
        Self::Store(reason.into())
    }
}
