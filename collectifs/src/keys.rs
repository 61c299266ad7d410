//! Repliage des clés et résolution de variantes
//!
//! Les propriétés d'une même parcelle peuvent arriver sous `Prenom`,
//! `Prenom_M`, `Prenom_001`, `prenom_01_COL`, `Prénom`... Toute comparaison
//! passe par une forme "repliée" : NFD, diacritiques supprimés, minuscules,
//! seuls `[a-z0-9_]` conservés. La forme repliée ne sert qu'au matching,
//! jamais comme clé canonique.

use std::sync::OnceLock;

use geojson::JsonObject;
use regex::Regex;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::value::value_to_string;

/// Variantes connues de la clé de parcelle, par ordre de priorité
pub const PARCEL_KEY_VARIANTS: &[&str] = &[
    "Num_parcel",
    "Num_parcel_2",
    "Num_parcelle",
    "Num_parc",
    "num_parcel",
    "num_parcelle",
    "id",
    "fid",
];

/// Variantes du champ "nombre d'affectataires" déclaré
pub const COUNT_VARIANTS: &[&str] = &[
    "Quel_est_le_nombre_d_affectata",
    "Quel_est_le_nombre_d_affectata_001",
    "nombre_affectataires",
];

/// Variantes des champs annexes du mandataire, par ordre de priorité
pub(crate) const SEXE_MANDATAIRE: &[&str] = &["Sexe_Mndt", "Sexe_M"];
pub(crate) const PIECE_MANDATAIRE: &[&str] = &["Num_piec", "Num_piece"];
pub(crate) const TELEPHONE_MANDATAIRE: &[&str] = &["Telephon1", "Telephon2"];
pub(crate) const DATE_MANDATAIRE: &[&str] = &["Date_nai"];
pub(crate) const RESIDENCE_MANDATAIRE: &[&str] = &["Residence_M", "Residence"];
pub(crate) const PRENOM_MANDATAIRE: &[&str] = &["Prenom_M", "Prenom_Mandataire"];
pub(crate) const NOM_MANDATAIRE: &[&str] = &["Nom_M", "Nom_Mandataire"];

/// Replie une clé pour le matching insensible à la casse, aux accents et à
/// la ponctuation. Déterministe, totale: toute chaîne produit une chaîne
/// (éventuellement vide).
pub fn fold(key: &str) -> String {
    key.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .flat_map(char::to_lowercase)
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
        .collect()
}

fn trailing_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Ancré en fin de chaîne: seuls les chiffres terminaux sont un index,
    // jamais des chiffres apparus ailleurs dans la clé
    RE.get_or_init(|| Regex::new(r"(\d{1,3})$").unwrap())
}

/// Extrait l'index d'affectataire d'une clé indexée (`Prenom_001` -> 1,
/// `Nom_2` -> 2). Les zéros de tête sont ignorés.
pub fn trailing_index(key: &str) -> Option<u32> {
    trailing_index_re()
        .captures(key)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Supprime un suffixe `_col` terminal (insensible à la casse) et trim
pub fn strip_col_suffix(key: &str) -> String {
    let key = key.trim();
    if key.len() >= 4 && key[key.len() - 4..].eq_ignore_ascii_case("_col") {
        key[..key.len() - 4].trim().to_string()
    } else {
        key.to_string()
    }
}

/// Vue des propriétés où toute clé `X_IND` alimente aussi `X` si `X` est
/// absent ou nul. La clé explicite garde la priorité sur la variante
/// suffixée.
pub fn with_ind_aliases(props: &JsonObject) -> JsonObject {
    let mut out = props.clone();
    for (key, value) in props {
        if let Some(base) = key.strip_suffix("_IND") {
            let present = matches!(out.get(base), Some(v) if !v.is_null());
            if !present {
                out.insert(base.to_string(), value.clone());
            }
        }
    }
    out
}

/// Index des clés repliées d'un enregistrement, construit une fois par
/// enregistrement pour éviter de re-replier à chaque lookup.
pub struct FoldedKeys<'a> {
    // (forme repliée, valeur) dans l'ordre du document source
    entries: Vec<(String, &'a Value)>,
}

impl<'a> FoldedKeys<'a> {
    pub fn new(props: &'a JsonObject) -> Self {
        let entries = props
            .iter()
            .map(|(k, v)| (fold(k), v))
            .collect();
        Self { entries }
    }

    /// Première valeur non nulle dont la clé repliée égale celle de `variant`
    pub fn get(&self, variant: &str) -> Option<&'a Value> {
        let folded = fold(variant);
        self.entries
            .iter()
            .find(|(k, v)| *k == folded && !v.is_null())
            .map(|(_, v)| *v)
    }

    /// Itère les variantes par ordre de priorité et retourne la première
    /// valeur présente, non nulle et non vide (après trim)
    pub fn pick(&self, variants: &[&str]) -> Option<String> {
        for variant in variants {
            if let Some(value) = self.get(variant) {
                if let Some(s) = value_to_string(value) {
                    let s = s.trim();
                    if !s.is_empty() {
                        return Some(s.to_string());
                    }
                }
            }
        }
        None
    }

    /// Heuristique de repli: première valeur dont la clé repliée contient
    /// l'un des fragments donnés (`region`, `commune`, `arrond`, ...)
    pub fn pick_substring(&self, needles: &[&str]) -> Option<String> {
        for (folded, value) in &self.entries {
            if needles.iter().any(|n| folded.contains(n)) {
                if let Some(s) = value_to_string(value) {
                    let s = s.trim();
                    if !s.is_empty() {
                        return Some(s.to_string());
                    }
                }
            }
        }
        None
    }
}

/// Compare une clé à une liste de variantes par formes repliées
pub fn matches_any(key: &str, variants: &[&str]) -> bool {
    let folded = fold(key);
    variants.iter().any(|v| fold(v) == folded)
}

/// Raccourci: construit l'index replié et résout une liste de variantes
pub fn pick_first_present(props: &JsonObject, variants: &[&str]) -> Option<String> {
    FoldedKeys::new(props).pick(variants)
}
