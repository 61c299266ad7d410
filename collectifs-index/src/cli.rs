//! Définition et implémentation des commandes CLI
//!
//! - `index`: recensement GeoJSON → index JSON des parcelles collectives
//! - `inspect`: affiche le mandataire et les affectataires d'une parcelle

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use geojson::{GeoJson, JsonObject};
use serde_json::Value;
use tracing::{info, warn};

use collectifs::{
    compute_mandataire, display_name_for_parcel, parse_collectives_props, CollectivesCache,
    JsonlStore, ParcelleCollective,
};

use crate::report::IndexReport;

#[derive(Subcommand)]
pub enum Commands {
    /// Générer l'index des parcelles collectives
    Index {
        /// Recensement source (FeatureCollection GeoJSON ou tableau JSON de propriétés)
        #[arg(short, long)]
        input: PathBuf,

        /// Fichier de sortie (index JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Cache persistant (JSON-lines), réutilisé entre deux exécutions
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Sortie JSON indentée
        #[arg(long)]
        pretty: bool,
    },

    /// Inspecter une parcelle du recensement
    Inspect {
        /// Recensement source
        #[arg(short, long)]
        input: PathBuf,

        /// Clé de la parcelle (Num_parcel)
        #[arg(short, long)]
        parcel: String,
    },
}

/// Charge un recensement: FeatureCollection GeoJSON ou tableau brut
/// d'objets de propriétés
pub fn load_records(path: &Path) -> Result<Vec<JsonObject>> {
    let contenu = std::fs::read_to_string(path)
        .with_context(|| format!("lecture de {}", path.display()))?;
    let value: Value = serde_json::from_str(&contenu)
        .with_context(|| format!("JSON invalide dans {}", path.display()))?;

    if value.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
        let geojson: GeoJson = value
            .to_string()
            .parse()
            .with_context(|| format!("GeoJSON invalide dans {}", path.display()))?;
        let GeoJson::FeatureCollection(fc) = geojson else {
            bail!("FeatureCollection attendue dans {}", path.display());
        };
        return Ok(fc
            .features
            .into_iter()
            .map(|f| f.properties.unwrap_or_default())
            .collect());
    }

    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(o) => Some(o),
                autre => {
                    warn!(valeur = %autre, "entrée non-objet ignorée");
                    None
                }
            })
            .collect()),
        _ => bail!(
            "format non reconnu dans {} (FeatureCollection ou tableau attendu)",
            path.display()
        ),
    }
}

async fn build_cache(chemin: Option<&Path>) -> Result<CollectivesCache> {
    let Some(chemin) = chemin else {
        return Ok(CollectivesCache::new());
    };
    let cache = CollectivesCache::with_store(JsonlStore::new(chemin));
    let charges = cache
        .load_all()
        .await
        .with_context(|| format!("chargement du cache {}", chemin.display()))?;
    info!(entrees = charges, cache = %chemin.display(), "cache chargé");
    Ok(cache)
}

pub async fn cmd_index(
    input: &Path,
    output: &Path,
    cache_path: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let debut = Instant::now();
    let records = load_records(input)?;
    let cache = build_cache(cache_path).await?;

    let parcelles = parse_collectives_props(&records, &cache);

    let json = if pretty {
        serde_json::to_vec_pretty(&parcelles)?
    } else {
        serde_json::to_vec(&parcelles)?
    };
    std::fs::write(output, json).with_context(|| format!("écriture de {}", output.display()))?;

    let report = IndexReport::new(records.len(), &parcelles, debut.elapsed());
    report.print();
    info!(sortie = %output.display(), "index écrit");
    Ok(())
}

pub async fn cmd_inspect(input: &Path, parcel: &str) -> Result<()> {
    let records = load_records(input)?;
    let cache = CollectivesCache::new();
    parse_collectives_props(&records, &cache);

    // premier enregistrement du groupe: il porte les clés brutes du
    // mandataire que la fusion ne conserve pas
    let premier = records.iter().find(|props| {
        collectifs::keys::pick_first_present(props, collectifs::keys::PARCEL_KEY_VARIANTS)
            .is_some_and(|k| k == parcel)
    });

    let Some(parcelle) = cache.get(parcel) else {
        // la clé peut exister sans être collective: on le signale
        if premier.is_some() {
            println!("Parcelle {parcel}: présente mais non collective (moins de 2 affectataires)");
        } else {
            println!("Parcelle {parcel}: introuvable dans le recensement");
        }
        return Ok(());
    };

    let vide = JsonObject::new();
    print_parcelle(parcel, premier.unwrap_or(&vide), &parcelle);
    Ok(())
}

fn print_parcelle(key: &str, props: &JsonObject, parcelle: &ParcelleCollective) {
    let mandataire = compute_mandataire(props, Some(parcelle));
    println!(
        "Parcelle {key} — {}",
        display_name_for_parcel(Some(parcelle), &Value::Object(props.clone()))
    );
    if !parcelle.meta.village.is_empty() {
        println!("  Village: {}", parcelle.meta.village);
    }
    println!("  Mandataire: {} {}", mandataire.prenom, mandataire.nom);
    println!("    Téléphone: {}", mandataire.telephone);
    println!("    Naissance: {}", mandataire.date_naissance);
    println!("  Affectataires ({}):", parcelle.nb_affectataires());
    let noms: Vec<&str> = parcelle.noms.split('\n').collect();
    for (i, prenom) in parcelle.prenoms.split('\n').enumerate() {
        println!("    {} {}", prenom, noms.get(i).copied().unwrap_or("-"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ecrire(contenu: &Value) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let chemin = dir.path().join("recensement.json");
        std::fs::write(&chemin, serde_json::to_vec(contenu).unwrap()).unwrap();
        (dir, chemin)
    }

    #[test]
    fn test_load_feature_collection() {
        let (_dir, chemin) = ecrire(&json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null,
                  "properties": { "Num_parcel": "P-1", "Prenom": "Ali\nMoussa", "Nom": "Ba\nSow" } }
            ]
        }));
        let records = load_records(&chemin).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Num_parcel"], "P-1");
    }

    #[test]
    fn test_load_bare_array() {
        let (_dir, chemin) = ecrire(&json!([
            { "Num_parcel": "P-1" },
            42,
            { "Num_parcel": "P-2" }
        ]));
        let records = load_records(&chemin).unwrap();
        // l'entrée non-objet est ignorée
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_rejects_unknown_format() {
        let (_dir, chemin) = ecrire(&json!({ "pas": "un recensement" }));
        assert!(load_records(&chemin).is_err());
    }

    #[tokio::test]
    async fn test_cmd_index_writes_output() {
        let (_dir, chemin) = ecrire(&json!([
            { "Num_parcel": "P-1", "Prenom": "Ali\nMoussa", "Nom": "Ba\nSow" },
            { "Num_parcel": "P-2", "Prenom": "Solo" }
        ]));
        let sortie = chemin.parent().unwrap().join("index.json");

        cmd_index(&chemin, &sortie, None, false).await.unwrap();

        let index: Vec<ParcelleCollective> =
            serde_json::from_slice(&std::fs::read(&sortie).unwrap()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].meta.num_parcel, "P-1");
    }
}
