//! Persistance du cache des parcelles collectives
//!
//! Le cache mémoire peut être adossé à un support durable via le trait
//! [`CacheStore`]. L'implémentation fournie, [`JsonlStore`], écrit une
//! ligne JSON par entrée dans un fichier en mode ajout: au rechargement
//! la dernière ligne d'une clé l'emporte, ce qui rend les écritures
//! triviales (pas de réécriture du fichier, pas de verrou applicatif).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CollectifError;
use crate::types::ParcelleCollective;

/// Support de persistance d'un cache de parcelles collectives.
///
/// Les deux opérations sont bloquantes: l'appelant décide du contexte
/// d'exécution (le cache les délègue à `spawn_blocking` quand un runtime
/// tokio est disponible).
pub trait CacheStore: Send + Sync {
    /// Charge toutes les entrées connues du support
    fn load_all(&self) -> Result<Vec<(String, ParcelleCollective)>, CollectifError>;

    /// Persiste une entrée; les écritures suivantes sur la même clé
    /// remplacent la valeur au prochain chargement
    fn persist(&self, key: &str, value: &ParcelleCollective) -> Result<(), CollectifError>;
}

/// Une entrée du fichier, une par ligne
#[derive(Serialize, Deserialize)]
struct LigneCache {
    key: String,
    value: ParcelleCollective,
    /// horodatage d'écriture en millisecondes epoch
    updated: i64,
}

/// Store fichier au format JSON-lines, en ajout seul
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for JsonlStore {
    fn load_all(&self) -> Result<Vec<(String, ParcelleCollective)>, CollectifError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries: Vec<(String, ParcelleCollective)> = Vec::new();
        for (no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // une ligne corrompue (écriture interrompue) est ignorée
            let ligne: LigneCache = match serde_json::from_str(&line) {
                Ok(l) => l,
                Err(e) => {
                    debug!(ligne = no + 1, erreur = %e, "entrée de cache illisible, ignorée");
                    continue;
                }
            };
            // la dernière occurrence d'une clé l'emporte
            if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == ligne.key) {
                slot.1 = ligne.value;
            } else {
                entries.push((ligne.key, ligne.value));
            }
        }
        Ok(entries)
    }

    fn persist(&self, key: &str, value: &ParcelleCollective) -> Result<(), CollectifError> {
        let ligne = LigneCache {
            key: key.to_string(),
            value: value.clone(),
            updated: Utc::now().timestamp_millis(),
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut buf = serde_json::to_vec(&ligne)?;
        buf.push(b'\n');
        file.write_all(&buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetaParcelle;

    fn parcelle(prenoms: &str) -> ParcelleCollective {
        ParcelleCollective {
            prenoms: prenoms.into(),
            noms: "A\nB".into(),
            sexes: "-\n-".into(),
            numeros_piece: "-\n-".into(),
            telephones: "-\n-".into(),
            dates_naissance: "-\n-".into(),
            residences: "-\n-".into(),
            meta: MetaParcelle::default(),
        }
    }

    #[test]
    fn test_persist_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path().join("cache.jsonl"));
        store.persist("P-1", &parcelle("Ali\nMoussa")).unwrap();
        store.persist("P-2", &parcelle("Fatou\nAwa")).unwrap();

        let entries = store.load_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "P-1");
        assert_eq!(entries[1].1.prenoms, "Fatou\nAwa");
    }

    #[test]
    fn test_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path().join("cache.jsonl"));
        store.persist("P-1", &parcelle("Ancien\nJeu")).unwrap();
        store.persist("P-1", &parcelle("Nouveau\nJeu")).unwrap();

        let entries = store.load_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.prenoms, "Nouveau\nJeu");
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path().join("inexistant.jsonl"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_line_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.jsonl");
        let store = JsonlStore::new(&path);
        store.persist("P-1", &parcelle("Ali\nMoussa")).unwrap();
        std::fs::write(&path, {
            let mut contenu = std::fs::read(&path).unwrap();
            contenu.extend_from_slice(b"{pas du json\n");
            contenu
        })
        .unwrap();
        store.persist("P-2", &parcelle("Fatou\nAwa")).unwrap();

        let entries = store.load_all().unwrap();
        assert_eq!(entries.len(), 2);
    }
}
