//! Normalisation d'un enregistrement brut vers une vue exploitable par
//! les écrans de détail
//!
//! L'entrée est tolérante: objet JSON, chaîne JSON (colonne `properties`
//! d'une ligne SQLite), ou n'importe quoi d'autre. Rien ne lève jamais:
//! une entrée inexploitable produit simplement un résultat vide.

use geojson::JsonObject;
use serde_json::Value;

use crate::keys::{strip_col_suffix, FoldedKeys, COUNT_VARIANTS};
use crate::parser::classify::Collecte;
use crate::types::{Localisation, NormalizedProperties};

/// Fragments de clés repliées pour la localisation administrative
const REGION: &[&str] = &["region"];
const DEPARTEMENT: &[&str] = &["depart"];
const COMMUNE: &[&str] = &["commune"];
const ARRONDISSEMENT: &[&str] = &["arrond"];
const GRAPPE: &[&str] = &["grappe"];

/// Interprète l'entrée brute comme un objet de propriétés.
/// Chaîne JSON illisible ou type inattendu -> objet vide.
pub(crate) fn as_props(raw: &Value) -> JsonObject {
    match raw {
        Value::Object(map) => map.clone(),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default(),
        _ => JsonObject::new(),
    }
}

/// Normalise les propriétés d'une parcelle: reconstruit le mandataire, la
/// liste ordonnée d'affectataires et la localisation administrative à
/// partir de clés aux noms instables.
pub fn normalize_properties(raw: &Value) -> NormalizedProperties {
    let props = as_props(raw);

    // Vue nettoyée: suffixes _col supprimés, première écriture gagnante
    // pour ne pas écraser une variante plus spécifique
    let mut cleaned = JsonObject::new();
    for (key, value) in &props {
        let ck = strip_col_suffix(key);
        if !cleaned.contains_key(&ck) {
            cleaned.insert(ck, value.clone());
        }
    }

    let mut collecte = Collecte::default();
    for (key, value) in &cleaned {
        if value.is_null() {
            continue;
        }
        collecte.ingest(key, value);
    }

    let folded = FoldedKeys::new(&cleaned);
    let localisation = Localisation {
        region: folded.pick_substring(REGION),
        departement: folded.pick_substring(DEPARTEMENT),
        commune: folded.pick_substring(COMMUNE),
        arrondissement: folded.pick_substring(ARRONDISSEMENT),
        grappe: folded.pick_substring(GRAPPE),
    };

    // Champ "nombre d'affectataires" déclaré, quand il est exploitable;
    // la vue nettoyée d'abord, puis les propriétés d'origine
    let declare = folded
        .pick(COUNT_VARIANTS)
        .or_else(|| FoldedKeys::new(&props).pick(COUNT_VARIANTS))
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n as usize);

    let mandataire = std::mem::take(&mut collecte.mandataire);
    let affectataires = collecte.affectataires();
    let affectataires_count = declare.unwrap_or(affectataires.len());

    NormalizedProperties {
        original: props,
        mandataire,
        affectataires,
        affectataires_count,
        localisation,
    }
}
