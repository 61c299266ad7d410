//! Rapport de génération d'index
//!
//! Résumé affiché en fin de commande `index`: volumétrie d'entrée,
//! parcelles retenues et durée de traitement.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use collectifs::ParcelleCollective;

#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    /// Horodatage de génération
    pub generated_at: DateTime<Utc>,
    /// Nombre d'enregistrements lus
    pub records: usize,
    /// Nombre de parcelles collectives retenues
    pub parcelles: usize,
    /// Nombre total d'affectataires dans l'index
    pub affectataires: usize,
    /// Durée de traitement en millisecondes
    pub duration_ms: u128,
}

impl IndexReport {
    pub fn new(records: usize, parcelles: &[ParcelleCollective], duration: Duration) -> Self {
        Self {
            generated_at: Utc::now(),
            records,
            parcelles: parcelles.len(),
            affectataires: parcelles.iter().map(|p| p.nb_affectataires()).sum(),
            duration_ms: duration.as_millis(),
        }
    }

    pub fn print(&self) {
        println!();
        println!("═══════════════════════════════════════");
        println!("  Index des parcelles collectives");
        println!("═══════════════════════════════════════");
        println!("  Enregistrements lus : {}", self.records);
        println!("  Parcelles retenues  : {}", self.parcelles);
        println!("  Affectataires       : {}", self.affectataires);
        println!("  Durée               : {} ms", self.duration_ms);
        println!("═══════════════════════════════════════");
    }
}
