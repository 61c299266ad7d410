//! Assemblage d'une fiche collective à partir d'UN enregistrement source
//!
//! Produit les sept colonnes alignées (une ligne par affectataire) ou rien
//! du tout: un enregistrement qui ne livre pas au moins deux noms n'est pas
//! une vraie parcelle collective — c'est le cas le plus fréquent, pas une
//! erreur.

use geojson::JsonObject;

use crate::keys::{
    with_ind_aliases, FoldedKeys, DATE_MANDATAIRE, PIECE_MANDATAIRE, RESIDENCE_MANDATAIRE,
    SEXE_MANDATAIRE, TELEPHONE_MANDATAIRE,
};
use crate::parser::classify::Collecte;
use crate::types::{FicheCollective, MetaParcelle};
use crate::value::{clean_str, ligne_vide, PLACEHOLDER};

/// Nombre minimal d'affectataires pour qu'un enregistrement soit retenu
/// comme collectif. Les écrans aval (badges, classement collectif /
/// individuel) dépendent de ce seuil exact.
pub const SEUIL_COLLECTIF: usize = 2;

/// Variantes des métadonnées de parcelle
const NICAD: &[&str] = &["nicad", "nicad_parc"];
const NUM_PARCEL: &[&str] = &["Num_parcel"];
const NUM_PARCEL_2: &[&str] = &["Num_parcel_2"];
const SUPERFICIE: &[&str] = &["superficie"];
const VILLAGE: &[&str] = &["Village"];
const VOCATION: &[&str] = &["Vocation_1"];
const TYPE_USA: &[&str] = &["type_usa"];

impl MetaParcelle {
    /// Métadonnées transmises telles quelles depuis un enregistrement brut
    pub(crate) fn from_props(folded: &FoldedKeys<'_>) -> Self {
        Self {
            nicad: folded.pick(NICAD).unwrap_or_default(),
            num_parcel_2: folded.pick(NUM_PARCEL_2).unwrap_or_default(),
            num_parcel: folded.pick(NUM_PARCEL).unwrap_or_default(),
            superficie: folded.pick(SUPERFICIE).unwrap_or_default(),
            village: folded.pick(VILLAGE).unwrap_or_default(),
            vocation_1: folded.pick(VOCATION).unwrap_or_default(),
            type_usa: folded.pick(TYPE_USA).unwrap_or_default(),
        }
    }
}

/// Les sept colonnes en cours de construction, alignées ligne à ligne
#[derive(Default)]
struct Colonnes {
    prenoms: Vec<String>,
    noms: Vec<String>,
    sexes: Vec<String>,
    pieces: Vec<String>,
    telephones: Vec<String>,
    dates: Vec<String>,
    residences: Vec<String>,
}

impl Colonnes {
    fn push(
        &mut self,
        prenom: String,
        nom: String,
        sexe: String,
        piece: String,
        telephone: String,
        date: String,
        residence: String,
    ) {
        self.prenoms.push(prenom);
        self.noms.push(nom);
        self.sexes.push(sexe);
        self.pieces.push(piece);
        self.telephones.push(telephone);
        self.dates.push(date);
        self.residences.push(residence);
    }
}

fn ou_placeholder(valeur: Option<&String>) -> String {
    match valeur {
        Some(s) => {
            let s = clean_str(s);
            if s.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                s
            }
        }
        None => PLACEHOLDER.to_string(),
    }
}

/// Assemble la fiche collective d'un enregistrement: mandataire en première
/// ligne quand il est complet, puis les slots d'affectataires en ordre
/// d'index, le tout aligné positionnellement avec `-` comme sentinelle.
///
/// Retourne `None` quand moins de [`SEUIL_COLLECTIF`] lignes de noms sont
/// reconstituées — issue normale et fréquente pour les enregistrements
/// individuels mélangés au recensement.
pub fn assemble(props: &JsonObject) -> Option<FicheCollective> {
    // Les variantes suffixées _IND alimentent la clé de base quand elle
    // est absente; la clé explicite garde la priorité.
    let normalized = with_ind_aliases(props);

    let mut collecte = Collecte::default();
    for (key, value) in &normalized {
        if value.is_null() {
            continue;
        }
        collecte.ingest(key, value);
    }

    let folded = FoldedKeys::new(&normalized);
    let mut colonnes = Colonnes::default();

    // Mandataire complet -> première ligne, champs annexes résolus par les
    // tables de variantes
    let mand_prenom = collecte.mandataire.prenom.as_deref().map(clean_str);
    let mand_nom = collecte.mandataire.nom.as_deref().map(clean_str);
    let mandataire_complet = matches!((&mand_prenom, &mand_nom), (Some(p), Some(n)) if !p.is_empty() && !n.is_empty());
    if mandataire_complet {
        let telephone = collecte
            .mandataire
            .telephone
            .as_deref()
            .map(clean_str)
            .or_else(|| folded.pick(TELEPHONE_MANDATAIRE).map(|s| clean_str(&s)))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let date = collecte
            .mandataire
            .date_naiss
            .as_deref()
            .map(clean_str)
            .or_else(|| folded.pick(DATE_MANDATAIRE).map(|s| clean_str(&s)))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        colonnes.push(
            mand_prenom.clone().unwrap_or_default(),
            mand_nom.clone().unwrap_or_default(),
            ou_placeholder(folded.pick(SEXE_MANDATAIRE).as_ref()),
            ou_placeholder(folded.pick(PIECE_MANDATAIRE).as_ref()),
            telephone,
            date,
            ou_placeholder(folded.pick(RESIDENCE_MANDATAIRE).as_ref()),
        );
    }

    // Slots d'affectataires en ordre d'index. Une ligne sans prénom ni nom
    // est abandonnée; une ligne identique au mandataire (paires nettoyées)
    // est exclue pour ne pas compter deux fois le représentant.
    for slot in collecte.slots.values() {
        let prenom = ou_placeholder(slot.prenom.as_ref());
        let nom = ou_placeholder(slot.nom.as_ref());
        if ligne_vide(&prenom, &nom) {
            continue;
        }
        if mandataire_complet
            && mand_prenom.as_deref() == Some(prenom.as_str())
            && mand_nom.as_deref() == Some(nom.as_str())
        {
            continue;
        }
        colonnes.push(
            prenom,
            nom,
            ou_placeholder(slot.sexe.as_ref()),
            ou_placeholder(slot.numero_piece.as_ref()),
            ou_placeholder(slot.telephone.as_ref()),
            ou_placeholder(slot.date_naiss.as_ref()),
            ou_placeholder(slot.residence.as_ref()),
        );
    }

    if colonnes.prenoms.len() < SEUIL_COLLECTIF {
        return None;
    }

    Some(FicheCollective {
        prenoms: colonnes.prenoms.join("\n"),
        noms: colonnes.noms.join("\n"),
        sexes: colonnes.sexes.join("\n"),
        numeros_piece: colonnes.pieces.join("\n"),
        telephones: colonnes.telephones.join("\n"),
        dates_naissance: colonnes.dates.join("\n"),
        residences: colonnes.residences.join("\n"),
        meta: MetaParcelle::from_props(&folded),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(v: serde_json::Value) -> JsonObject {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_assemble_aggregated_record() {
        let p = props(json!({
            "Num_parcel": "P-123",
            "Prenom": "Ali\nMoussa",
            "Nom": "Diallo\nSow",
            "Num_piece": "ID1\nID2",
            "Telephone": "700000001\n700000002"
        }));
        let fiche = assemble(&p).expect("deux affectataires");
        assert_eq!(fiche.prenoms, "Ali\nMoussa");
        assert_eq!(fiche.noms, "Diallo\nSow");
        assert_eq!(fiche.numeros_piece, "ID1\nID2");
        assert_eq!(fiche.meta.num_parcel, "P-123");
    }

    #[test]
    fn test_assemble_alignment_property() {
        // les sept champs ont le même nombre de lignes
        let p = props(json!({
            "Prenom_M": "WALY",
            "Nom_M": "CAMARA",
            "Prenom_001": "X",
            "Nom_001": "Y",
            "Prenom_2": "A",
            "Nom_2": "B",
            "Telephone_2": "770000000"
        }));
        let fiche = assemble(&p).unwrap();
        let longueurs: Vec<usize> = fiche
            .champs()
            .iter()
            .map(|c| c.split('\n').count())
            .collect();
        assert!(longueurs.iter().all(|l| *l == longueurs[0]));
        assert_eq!(longueurs[0], 3);
    }

    #[test]
    fn test_assemble_idempotent() {
        let p = props(json!({
            "Prenom": "Ali\nMoussa",
            "Nom": "Diallo\nSow",
            "Superficie": 1200.0
        }));
        assert_eq!(assemble(&p), assemble(&p));
    }

    #[test]
    fn test_assemble_below_threshold() {
        // un seul nom -> pas une parcelle collective
        let p = props(json!({ "Num_parcel": "P-200", "Prenom": "Solo" }));
        assert!(assemble(&p).is_none());

        let p = props(json!({ "Prenom_M": "WALY", "Nom_M": "CAMARA" }));
        assert!(assemble(&p).is_none());
    }

    #[test]
    fn test_assemble_mandataire_first_with_aux_fields() {
        let p = props(json!({
            "Prenom_M": "WALY",
            "Nom_M": "CAMARA",
            "Sexe_Mndt": "Homme",
            "Num_piec": "1369201300074.0",
            "Telephon2": "+221700000000",
            "Date_nai": "1980-05-01",
            "Residence_M": "Kédougou",
            "Prenom": "Ali\nMoussa",
            "Nom": "Diallo\nSow"
        }));
        let fiche = assemble(&p).unwrap();
        let prenoms: Vec<&str> = fiche.prenoms.split('\n').collect();
        assert_eq!(prenoms, vec!["WALY", "Ali", "Moussa"]);
        assert!(fiche.numeros_piece.starts_with("1369201300074\n"));
        assert!(fiche.telephones.starts_with("+221700000000\n"));
        assert!(fiche.residences.starts_with("Kédougou\n"));
    }

    #[test]
    fn test_assemble_excludes_mandataire_duplicate() {
        // le mandataire apparaît aussi en tête de la liste agrégée:
        // une seule occurrence dans la fiche
        let p = props(json!({
            "Prenom_M": "WALY",
            "Nom_M": "CAMARA",
            "Prenom": "WALY\nAli",
            "Nom": "CAMARA\nDiallo"
        }));
        let fiche = assemble(&p).unwrap();
        assert_eq!(fiche.prenoms, "WALY\nAli");
        assert_eq!(fiche.noms, "CAMARA\nDiallo");
    }

    #[test]
    fn test_assemble_ind_suffix_alias() {
        let p = props(json!({
            "Prenom_IND": "Ali\nMoussa",
            "Nom_IND": "Diallo\nSow"
        }));
        let fiche = assemble(&p).expect("les variantes _IND alimentent les clés de base");
        assert_eq!(fiche.prenoms, "Ali\nMoussa");
    }

    #[test]
    fn test_assemble_drops_all_placeholder_rows() {
        // la troisième position n'a ni prénom ni nom: abandonnée
        let p = props(json!({
            "Prenom": "Ali\nMoussa",
            "Nom": "Diallo\nSow",
            "Telephone": "111\n222\n333"
        }));
        let fiche = assemble(&p).unwrap();
        assert_eq!(fiche.prenoms.split('\n').count(), 2);
        assert_eq!(fiche.telephones, "111\n222");
    }

    #[test]
    fn test_assemble_cleans_values() {
        let p = props(json!({
            "Prenom": " Ali \nNaN",
            "Nom": "Diallo\nSow"
        }));
        let fiche = assemble(&p).unwrap();
        // "NaN" devient '-', la ligne survit car le nom est présent
        assert_eq!(fiche.prenoms, "Ali\n-");
        assert_eq!(fiche.noms, "Diallo\nSow");
    }
}
