//! Résolution d'affichage: mandataire d'une parcelle et libellés dérivés
//!
//! Chaque champ du mandataire est résolu en cascade sur trois portées:
//! le mandataire normalisé de l'enregistrement, les clés brutes marquées
//! (`Prenom_M`, `Sexe_Mndt`, `Num_piec`, `Telephon2`, `Date_nai`), puis
//! la première ligne du résultat fusionné. Les dates de naissance arrivent
//! sous une demi-douzaine de formats selon l'outil de collecte, on les
//! tente dans l'ordre.

use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate, TimeZone, Utc};
use geojson::JsonObject;
use regex::Regex;
use serde_json::Value;

use crate::keys::{
    pick_first_present, FoldedKeys, DATE_MANDATAIRE, NOM_MANDATAIRE, PARCEL_KEY_VARIANTS,
    PIECE_MANDATAIRE, PRENOM_MANDATAIRE, RESIDENCE_MANDATAIRE, SEXE_MANDATAIRE,
    TELEPHONE_MANDATAIRE,
};
use crate::parser::normalize::normalize_properties;
use crate::types::ParcelleCollective;
use crate::value::{clean_str, PLACEHOLDER};

/// Mandataire prêt à l'affichage, tous champs renseignés ou sentinelles
#[derive(Debug, Clone, PartialEq)]
pub struct FicheMandataire {
    pub prenom: String,
    pub nom: String,
    pub sexe: String,
    pub numero_piece: String,
    pub telephone: String,
    /// "JJ/MM/AAAA (N ans)" ou la sentinelle "Non renseignée"
    pub date_naissance: String,
    pub residence: String,
}

/// Sentinelle affichée quand une date de naissance est absente ou illisible
pub const DATE_NON_RENSEIGNEE: &str = "Non renseignée";

/// Première ligne non vide d'un champ multi-lignes, hors tiret sentinelle
pub fn premiere_ligne(champ: &str) -> Option<String> {
    let ligne = champ.split('\n').next()?.trim();
    if ligne.is_empty() || ligne == PLACEHOLDER {
        None
    } else {
        Some(ligne.to_string())
    }
}

fn est_indisponible(v: &str) -> bool {
    let v = v.trim();
    v.is_empty() || v == PLACEHOLDER || v.eq_ignore_ascii_case("n/a") || v.eq_ignore_ascii_case("null")
}

/// Première valeur réellement renseignée parmi des candidates
pub fn meilleure_valeur<'a, I>(candidats: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidats
        .into_iter()
        .map(str::trim)
        .find(|v| !est_indisponible(v))
        .map(str::to_string)
}

/// Cascade sur les trois portées; les valeurs sont nettoyées avant le
/// choix pour qu'un `NaN` ou un `.0` parasite ne masque pas la suivante
fn resoudre(candidats: [Option<String>; 3]) -> String {
    let nettoyes: Vec<String> = candidats
        .into_iter()
        .flatten()
        .map(|s| clean_str(&s))
        .collect();
    meilleure_valeur(nettoyes.iter().map(String::as_str))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Résout le mandataire affiché d'une parcelle à partir de l'enregistrement
/// brut et, quand elle existe, de la parcelle fusionnée.
pub fn compute_mandataire(
    props: &JsonObject,
    fusion: Option<&ParcelleCollective>,
) -> FicheMandataire {
    compute_mandataire_at(props, fusion, Local::now().date_naive())
}

/// Variante de [`compute_mandataire`] à date de référence fixée
pub fn compute_mandataire_at(
    props: &JsonObject,
    fusion: Option<&ParcelleCollective>,
    aujourd_hui: NaiveDate,
) -> FicheMandataire {
    let raw = Value::Object(props.clone());
    let normalized = normalize_properties(&raw);
    let m = &normalized.mandataire;
    let folded = FoldedKeys::new(props);

    let date_brute = [
        m.date_naiss.clone(),
        folded.pick(DATE_MANDATAIRE),
        fusion.and_then(|p| premiere_ligne(&p.dates_naissance)),
    ]
    .into_iter()
    .flatten()
    .map(|s| clean_str(&s))
    .find(|s| !est_indisponible(s))
    .unwrap_or_default();

    FicheMandataire {
        prenom: resoudre([
            m.prenom.clone(),
            folded.pick(PRENOM_MANDATAIRE),
            fusion.and_then(|p| premiere_ligne(&p.prenoms)),
        ]),
        nom: resoudre([
            m.nom.clone(),
            folded.pick(NOM_MANDATAIRE),
            fusion.and_then(|p| premiere_ligne(&p.noms)),
        ]),
        // pas de sexe ni de numéro de pièce dans le mandataire normalisé:
        // seules les clés brutes marquées et la fusion en fournissent
        sexe: resoudre([
            None,
            folded.pick(SEXE_MANDATAIRE),
            fusion.and_then(|p| premiere_ligne(&p.sexes)),
        ]),
        numero_piece: resoudre([
            None,
            folded.pick(PIECE_MANDATAIRE),
            fusion.and_then(|p| premiere_ligne(&p.numeros_piece)),
        ]),
        telephone: resoudre([
            m.telephone.clone(),
            folded.pick(TELEPHONE_MANDATAIRE),
            fusion.and_then(|p| premiere_ligne(&p.telephones)),
        ]),
        date_naissance: format_date_naissance(&date_brute, aujourd_hui),
        residence: resoudre([
            None,
            folded.pick(RESIDENCE_MANDATAIRE),
            fusion.and_then(|p| premiere_ligne(&p.residences)),
        ]),
    }
}

fn re_jour_mois_annee() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").unwrap())
}

/// Tente de lire une date de naissance dans les formats rencontrés sur le
/// terrain: epoch (ms ou s), JJ/MM/AAAA, JJ-MM-AAAA, AAAA-MM-JJ, RFC 3339,
/// ou une année seule (ramenée au 1er janvier).
pub fn parse_date_naissance(brut: &str, aujourd_hui: NaiveDate) -> Option<NaiveDate> {
    let brut = brut.trim();
    if est_indisponible(brut) {
        return None;
    }

    let candidate = if brut.chars().all(|c| c.is_ascii_digit()) {
        match brut.len() {
            // epoch millisecondes
            12..=14 => brut
                .parse::<i64>()
                .ok()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .map(|dt| dt.date_naive()),
            // epoch secondes
            9..=11 => brut
                .parse::<i64>()
                .ok()
                .and_then(|s| Utc.timestamp_opt(s, 0).single())
                .map(|dt| dt.date_naive()),
            // année seule
            4 => brut
                .parse::<i32>()
                .ok()
                .and_then(|annee| NaiveDate::from_ymd_opt(annee, 1, 1)),
            _ => None,
        }
    } else if let Some(caps) = re_jour_mois_annee().captures(brut) {
        let jour: u32 = caps[1].parse().ok()?;
        let mois: u32 = caps[2].parse().ok()?;
        let annee: i32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(annee, mois, jour)
    } else if let Ok(date) = NaiveDate::parse_from_str(brut, "%Y-%m-%d") {
        Some(date)
    } else {
        chrono::DateTime::parse_from_rfc3339(brut)
            .ok()
            .map(|dt| dt.date_naive())
    };

    // garde-fou contre les epochs absurdes et les fautes de frappe
    candidate.filter(|d| d.year() >= 1900 && d.year() <= aujourd_hui.year())
}

/// Années révolues entre la naissance et la date de référence
pub fn age_en_annees(naissance: NaiveDate, aujourd_hui: NaiveDate) -> i32 {
    let mut age = aujourd_hui.year() - naissance.year();
    if (aujourd_hui.month(), aujourd_hui.day()) < (naissance.month(), naissance.day()) {
        age -= 1;
    }
    age
}

/// "JJ/MM/AAAA (N ans)" si la date est lisible, la sentinelle sinon
pub fn format_date_naissance(brut: &str, aujourd_hui: NaiveDate) -> String {
    match parse_date_naissance(brut, aujourd_hui) {
        Some(date) => format!(
            "{:02}/{:02}/{} ({} ans)",
            date.day(),
            date.month(),
            date.year(),
            age_en_annees(date, aujourd_hui)
        ),
        None => DATE_NON_RENSEIGNEE.to_string(),
    }
}

/// Nom à afficher pour une parcelle: mandataire si présent, sinon les
/// champs les plus parlants de l'enregistrement, sinon un libellé
/// générique.
///
/// Une ligne stockée peut porter son objet réel dans un membre
/// `properties`, éventuellement sérialisé en chaîne JSON: il est
/// normalisé avant toute résolution.
pub fn display_name_for_parcel(parcelle: Option<&ParcelleCollective>, row: &Value) -> String {
    if let Some(p) = parcelle {
        if let Some(prenom) = premiere_ligne(&p.prenoms) {
            return match premiere_ligne(&p.noms) {
                Some(nom) => format!("{prenom} {nom}"),
                None => prenom,
            };
        }
    }

    let source = match row.get("properties") {
        Some(v) if !v.is_null() => v,
        _ => row,
    };
    let normalized = normalize_properties(source);

    let prenom = normalized
        .mandataire
        .prenom
        .as_deref()
        .map(clean_str)
        .filter(|s| !est_indisponible(s));
    let nom = normalized
        .mandataire
        .nom
        .as_deref()
        .map(clean_str)
        .filter(|s| !est_indisponible(s));
    match (prenom, nom) {
        (Some(p), Some(n)) => return format!("{p} {n}"),
        (Some(p), None) => return p,
        (None, Some(n)) => return n,
        (None, None) => {}
    }

    if let Some(denomination) = normalized
        .mandataire
        .denominat
        .as_deref()
        .map(clean_str)
        .filter(|s| !est_indisponible(s))
    {
        return denomination;
    }

    // le numéro de parcelle nu, sans habillage
    if let Some(id) = pick_first_present(&normalized.original, PARCEL_KEY_VARIANTS) {
        let id = clean_str(&id);
        if !est_indisponible(&id) {
            return id;
        }
    }

    "Parcelle collective".to_string()
}
