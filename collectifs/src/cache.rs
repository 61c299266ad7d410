//! Cache mémoire des parcelles collectives calculées
//!
//! Une parcelle fusionnée ne change pas entre deux passes sur le même jeu
//! de données: la première écriture sous une clé fait foi et les suivantes
//! sont ignorées. La persistance éventuelle (voir [`crate::store`]) se
//! fait en arrière-plan et ne bloque jamais le chemin de parsing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::CollectifError;
use crate::store::CacheStore;
use crate::types::ParcelleCollective;

#[derive(Default)]
pub struct CollectivesCache {
    entries: RwLock<HashMap<String, Arc<ParcelleCollective>>>,
    store: Option<Arc<dyn CacheStore>>,
}

impl CollectivesCache {
    /// Cache purement mémoire, sans persistance
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache adossé à un support durable
    pub fn with_store(store: impl CacheStore + 'static) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store: Some(Arc::new(store)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<ParcelleCollective>> {
        self.entries.read().ok()?.get(key).cloned()
    }

    /// Insère une parcelle sous une clé si elle n'y est pas déjà, et
    /// retourne l'entrée effectivement en cache (l'existante en cas de
    /// doublon). L'écriture durable part en tâche de fond.
    pub fn set(&self, key: &str, value: ParcelleCollective) -> Arc<ParcelleCollective> {
        let arc = {
            let mut entries = match self.entries.write() {
                Ok(e) => e,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(existing) = entries.get(key) {
                return existing.clone();
            }
            let arc = Arc::new(value);
            entries.insert(key.to_string(), arc.clone());
            arc
        };
        if let Some(store) = &self.store {
            persist_background(store.clone(), key.to_string(), arc.clone());
        }
        arc
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recharge le cache depuis son support durable.
    ///
    /// Les entrées déjà en mémoire priment sur celles du fichier. Les
    /// valeurs sont assainies au passage ("N/A" devient vide, comme pour
    /// les caches historiques).
    pub async fn load_all(&self) -> Result<usize, CollectifError> {
        let Some(store) = self.store.clone() else {
            return Ok(0);
        };
        let loaded = tokio::task::spawn_blocking(move || store.load_all())
            .await
            .map_err(|e| CollectifError::store(e.to_string()))??;

        let mut count = 0;
        let mut entries = match self.entries.write() {
            Ok(e) => e,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (key, mut value) in loaded {
            if entries.contains_key(&key) {
                continue;
            }
            value.sanitize();
            entries.insert(key, Arc::new(value));
            count += 1;
        }
        debug!(entrees = count, "cache rechargé depuis le support durable");
        Ok(count)
    }
}

/// Écrit une entrée sur le support sans bloquer l'appelant: déléguée à
/// `spawn_blocking` quand un runtime tokio est présent, exécutée en place
/// sinon. Un échec d'écriture est journalisé et n'interrompt rien.
fn persist_background(store: Arc<dyn CacheStore>, key: String, value: Arc<ParcelleCollective>) {
    let ecrire = move || {
        if let Err(e) = store.persist(&key, &value) {
            warn!(parcelle = %key, erreur = %e, "échec de persistance du cache");
        }
    };
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(ecrire);
        }
        Err(_) => ecrire(),
    }
}
