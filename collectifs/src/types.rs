//! Types de données pour le crate collectifs

use geojson::JsonObject;
use serde::{Deserialize, Serialize};

use crate::value::PLACEHOLDER;

/// Un ayant droit (bénéficiaire) d'une parcelle collective.
///
/// Rempli champ par champ par le classifieur; un slot n'est conservé que si
/// au moins un champ est renseigné.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Affectataire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sexe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_piece: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_naiss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residence: Option<String>,
}

impl Affectataire {
    /// Vrai si aucun champ n'est renseigné
    pub fn is_empty(&self) -> bool {
        self.prenom.is_none()
            && self.nom.is_none()
            && self.sexe.is_none()
            && self.numero_piece.is_none()
            && self.telephone.is_none()
            && self.date_naiss.is_none()
            && self.residence.is_none()
    }
}

/// Le représentant désigné d'une parcelle collective.
///
/// Construit indépendamment des affectataires, à partir des variantes de
/// clés explicitement marquées (`_M`, `mandat`, `mndt`) et des replis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mandataire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_naiss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lieu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denominat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cas_de_personne: Option<String>,
}

/// Localisation administrative résolue par heuristique de sous-chaîne.
///
/// Les alias sérialisés (`regionSenegal`, ...) sont les noms canoniques
/// attendus par les écrans de détail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Localisation {
    #[serde(rename = "regionSenegal", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "departmentSenegal", skip_serializing_if = "Option::is_none")]
    pub departement: Option<String>,
    #[serde(rename = "communeSenegal", skip_serializing_if = "Option::is_none")]
    pub commune: Option<String>,
    #[serde(
        rename = "arrondissementSenegal",
        skip_serializing_if = "Option::is_none"
    )]
    pub arrondissement: Option<String>,
    #[serde(rename = "grappeSenegal", skip_serializing_if = "Option::is_none")]
    pub grappe: Option<String>,
}

/// Résultat de la normalisation d'un enregistrement brut
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedProperties {
    /// Propriétés d'origine, intactes
    pub original: JsonObject,

    /// Mandataire reconstruit
    pub mandataire: Mandataire,

    /// Affectataires ordonnés par index de slot
    pub affectataires: Vec<Affectataire>,

    /// Nombre d'affectataires: champ déclaré quand il est exploitable,
    /// sinon le nombre de slots reconstruits
    #[serde(rename = "affectatairesCount")]
    pub affectataires_count: usize,

    /// Localisation administrative
    #[serde(flatten)]
    pub localisation: Localisation,
}

/// Métadonnées de parcelle transmises telles quelles vers l'affichage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaParcelle {
    #[serde(default)]
    pub nicad: String,
    #[serde(rename = "Num_parcel_2", default)]
    pub num_parcel_2: String,
    #[serde(rename = "Num_parcel", default)]
    pub num_parcel: String,
    #[serde(default)]
    pub superficie: String,
    #[serde(rename = "Village", default)]
    pub village: String,
    #[serde(rename = "Vocation_1", default)]
    pub vocation_1: String,
    #[serde(default)]
    pub type_usa: String,
}

/// Fiche produite par l'assembleur pour UN enregistrement source.
///
/// Chacun des sept champs est une liste jointe par `\n`, alignée
/// positionnellement: la ligne i de chaque champ décrit le même affectataire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FicheCollective {
    pub prenoms: String,
    pub noms: String,
    pub sexes: String,
    pub numeros_piece: String,
    pub telephones: String,
    pub dates_naissance: String,
    pub residences: String,
    pub meta: MetaParcelle,
}

impl FicheCollective {
    /// Les sept champs alignés, dans l'ordre canonique
    pub fn champs(&self) -> [&str; 7] {
        [
            &self.prenoms,
            &self.noms,
            &self.sexes,
            &self.numeros_piece,
            &self.telephones,
            &self.dates_naissance,
            &self.residences,
        ]
    }
}

/// Résultat final par clé de parcelle, après fusion inter-enregistrements.
///
/// Les noms de champs sérialisés sont ceux du cache historique
/// (`Prenom`, `Nom`, ... `Num_parcel`), ce qui permet de relire les entrées
/// déjà persistées.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelleCollective {
    #[serde(rename = "Prenom", default)]
    pub prenoms: String,
    #[serde(rename = "Nom", default)]
    pub noms: String,
    #[serde(rename = "Sexe", default)]
    pub sexes: String,
    #[serde(rename = "Numero_piece", default)]
    pub numeros_piece: String,
    #[serde(rename = "Telephone", default)]
    pub telephones: String,
    #[serde(rename = "Date_naissance", default)]
    pub dates_naissance: String,
    #[serde(rename = "Residence", default)]
    pub residences: String,
    #[serde(flatten)]
    pub meta: MetaParcelle,
}

impl ParcelleCollective {
    /// Remplace les valeurs `N/A` héritées d'anciens caches par des chaînes
    /// vides, pour ne jamais afficher le littéral
    pub fn sanitize(&mut self) {
        for champ in [
            &mut self.prenoms,
            &mut self.noms,
            &mut self.sexes,
            &mut self.numeros_piece,
            &mut self.telephones,
            &mut self.dates_naissance,
            &mut self.residences,
            &mut self.meta.nicad,
            &mut self.meta.num_parcel_2,
            &mut self.meta.num_parcel,
            &mut self.meta.superficie,
            &mut self.meta.village,
            &mut self.meta.vocation_1,
            &mut self.meta.type_usa,
        ] {
            if champ == "N/A" {
                champ.clear();
            }
        }
    }

    /// Nombre de noms effectifs (lignes non vides et non `-`)
    pub fn nb_affectataires(&self) -> usize {
        crate::value::split_lines(&self.prenoms).len()
    }
}

/// Vrai si la chaîne est la sentinelle d'absence
pub fn est_placeholder(s: &str) -> bool {
    s == PLACEHOLDER
}
