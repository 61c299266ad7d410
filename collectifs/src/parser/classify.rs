//! Classification des champs d'un enregistrement de recensement
//!
//! Chaque paire (clé, valeur) est visitée exactement une fois et tombe dans
//! une seule catégorie; la première règle qui matche consomme la paire. Les
//! règles reproduisent le vocabulaire de clés observé dans les données du
//! recensement (variantes `_M`, `mandat`, `mndt`, suffixes indexés,
//! champs agrégés multi-lignes).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::keys::{fold, matches_any, trailing_index, COUNT_VARIANTS};
use crate::types::{Affectataire, Mandataire};
use crate::value::value_to_string;

/// Champ logique d'un affectataire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffectField {
    Prenom,
    Nom,
    DateNaiss,
    Sexe,
    NumeroPiece,
    Telephone,
    Residence,
}

/// Catégorie d'une paire (clé, valeur)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Prénom du mandataire (clé explicitement marquée)
    MandatairePrenom,
    /// Nom du mandataire
    MandataireNom,
    /// Date de naissance du mandataire
    MandataireDateNaiss,
    /// Lieu de naissance (rattaché au mandataire)
    MandataireLieu,
    /// Téléphone du mandataire
    MandataireTelephone,
    /// Champ d'affectataire porté par un suffixe numérique terminal.
    /// `field` est `None` quand le suffixe est reconnu mais pas le champ:
    /// la paire est consommée quand même.
    Indexed { index: u32, field: Option<AffectField> },
    /// Liste agrégée multi-lignes, une entrée par affectataire en ordre
    /// positionnel
    Aggregated(AffectField),
    /// Clé nue `prenom`: repli vers le mandataire si non renseigné
    PrenomSimple,
    /// Clé nue `nom`
    NomSimple,
    /// Dénomination / raison sociale
    Denomination,
    /// Indicateur "cas de personne" (collectif / individuel)
    CasDePersonne,
    /// Clé non reconnue, ignorée
    Autre,
}

/// Classifie une paire (clé, valeur) selon l'ordre de précédence des règles.
///
/// `telephone_deja_pris` indique si un téléphone mandataire a déjà été
/// retenu: une valeur mono-ligne non marquée n'est un téléphone mandataire
/// que tant qu'aucun n'est connu.
pub fn classify(key: &str, value: &str, telephone_deja_pris: bool) -> FieldClass {
    let k = fold(key);

    // 1-2. Nom/prénom du mandataire. L'ordre compte: `prenom_m` replié
    // matcherait aussi la règle du nom.
    if k.contains("prenomm")
        || k == "prenom_m"
        || k == "prenommandat"
        || (k.contains("mandataire") && k.contains("prenom"))
    {
        return FieldClass::MandatairePrenom;
    }
    if k.contains("nomm")
        || k == "nom_m"
        || k == "nommandat"
        || (k.contains("mandataire") && k.contains("nom"))
    {
        return FieldClass::MandataireNom;
    }

    // 3. Date de naissance du mandataire
    if k.contains("date")
        && k.contains("nais")
        && (k.contains('m') || k.contains("mandat") || k.contains("mand"))
    {
        return FieldClass::MandataireDateNaiss;
    }

    // 4. Lieu de naissance
    if (k.contains("lieu") || k.contains("lieux"))
        && (k.contains("nai") || k.contains("naiss") || k.contains("nais") || k.contains("naissance"))
    {
        return FieldClass::MandataireLieu;
    }

    // 5. Téléphone: marqué mandataire, ou valeur simple tant qu'aucun
    // téléphone mandataire n'est retenu. Une liste agrégée tombe plus bas.
    if k.contains("telephon") {
        let marque = k.contains("_m")
            || k.ends_with('m')
            || k.contains("mandat")
            || k.contains("mndt")
            || k == "telephon2"
            || k == "telephone_m"
            || k == "telephon_m";
        if marque {
            return FieldClass::MandataireTelephone;
        }
        if !value.contains('\n') && !telephone_deja_pris {
            return FieldClass::MandataireTelephone;
        }
    }

    // 6. Champ indexé: suffixe numérique terminal (1 à 3 chiffres)
    if let Some(index) = trailing_index(key) {
        // le compte déclaré d'affectataires porte parfois un suffixe
        // indexé ("nombre" contient "nom"): ce n'est jamais un champ de
        // slot, la paire est consommée sans rien alimenter
        if matches_any(key, COUNT_VARIANTS) {
            return FieldClass::Indexed { index, field: None };
        }
        let field = if k.contains("prenom") {
            Some(AffectField::Prenom)
        } else if k.contains("nom") {
            Some(AffectField::Nom)
        } else if (k.contains("date") || k.contains("dat"))
            && (k.contains("nai") || k.contains("nais") || k.contains("naiss"))
        {
            Some(AffectField::DateNaiss)
        } else if k.contains("sex") {
            Some(AffectField::Sexe)
        } else if k.contains("num") && (k.contains("piec") || k.contains("piece")) {
            Some(AffectField::NumeroPiece)
        } else if k.contains("telephon") {
            Some(AffectField::Telephone)
        } else if k.contains("resid") {
            Some(AffectField::Residence)
        } else {
            None
        };
        return FieldClass::Indexed { index, field };
    }

    // 7. Listes agrégées non indexées (valeur multi-lignes)
    if value.contains('\n') {
        if k.starts_with("prenom") {
            return FieldClass::Aggregated(AffectField::Prenom);
        }
        if k.starts_with("nom") {
            return FieldClass::Aggregated(AffectField::Nom);
        }
        if k.starts_with("telephone") || k.contains("telephon") {
            return FieldClass::Aggregated(AffectField::Telephone);
        }
        if k.contains("num") && (k.contains("piec") || k.contains("piece")) {
            return FieldClass::Aggregated(AffectField::NumeroPiece);
        }
        if (k.contains("date") || k.contains("dat"))
            && (k.contains("nai") || k.contains("naiss") || k.contains("nais"))
        {
            return FieldClass::Aggregated(AffectField::DateNaiss);
        }
        if k.contains("resid") {
            return FieldClass::Aggregated(AffectField::Residence);
        }
        if k.contains("sex") {
            return FieldClass::Aggregated(AffectField::Sexe);
        }
    }

    // 8. Replis
    if k == "prenom" {
        return FieldClass::PrenomSimple;
    }
    if k == "nom" {
        return FieldClass::NomSimple;
    }
    if k.contains("denominat") || k.contains("denomin") {
        return FieldClass::Denomination;
    }
    if k.contains("cas_de_personne") || k.contains("casdepersonne") || k.contains("casde") {
        return FieldClass::CasDePersonne;
    }

    FieldClass::Autre
}

/// Accumulateur du parcours d'un enregistrement: slots d'affectataires
/// indexés (1-based) et mandataire.
#[derive(Debug, Default)]
pub struct Collecte {
    pub slots: BTreeMap<u32, Affectataire>,
    pub mandataire: Mandataire,
}

fn set_if_absent(champ: &mut Option<String>, valeur: String) {
    if champ.is_none() {
        *champ = Some(valeur);
    }
}

impl Collecte {
    /// Applique la classification d'une paire (clé, valeur) à l'accumulateur.
    /// Les valeurs nulles sont ignorées avant classification.
    pub fn ingest(&mut self, key: &str, value: &Value) {
        let Some(s) = value_to_string(value) else {
            return;
        };
        match classify(key, &s, self.mandataire.telephone.is_some()) {
            FieldClass::MandatairePrenom => self.mandataire.prenom = Some(s),
            FieldClass::MandataireNom => self.mandataire.nom = Some(s),
            FieldClass::MandataireDateNaiss => self.mandataire.date_naiss = Some(s),
            FieldClass::MandataireLieu => set_if_absent(&mut self.mandataire.lieu, s),
            FieldClass::MandataireTelephone => set_if_absent(&mut self.mandataire.telephone, s),
            FieldClass::Indexed { index, field } => {
                if let Some(field) = field {
                    self.set_slot(index, field, s);
                }
            }
            FieldClass::Aggregated(field) => {
                for (i, part) in s
                    .split('\n')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .enumerate()
                {
                    self.set_slot_if_absent(i as u32 + 1, field, part.to_string());
                }
            }
            FieldClass::PrenomSimple => set_if_absent(&mut self.mandataire.prenom, s),
            FieldClass::NomSimple => set_if_absent(&mut self.mandataire.nom, s),
            FieldClass::Denomination => set_if_absent(&mut self.mandataire.denominat, s),
            FieldClass::CasDePersonne => set_if_absent(&mut self.mandataire.cas_de_personne, s),
            FieldClass::Autre => {}
        }
    }

    /// Affectataires non vides, ordonnés par index de slot
    pub fn affectataires(self) -> Vec<Affectataire> {
        self.slots
            .into_values()
            .filter(|a| !a.is_empty())
            .collect()
    }

    fn champ_mut(slot: &mut Affectataire, field: AffectField) -> &mut Option<String> {
        match field {
            AffectField::Prenom => &mut slot.prenom,
            AffectField::Nom => &mut slot.nom,
            AffectField::DateNaiss => &mut slot.date_naiss,
            AffectField::Sexe => &mut slot.sexe,
            AffectField::NumeroPiece => &mut slot.numero_piece,
            AffectField::Telephone => &mut slot.telephone,
            AffectField::Residence => &mut slot.residence,
        }
    }

    // Un champ indexé explicite écrase; une liste agrégée ne comble que
    // les positions encore vides.
    fn set_slot(&mut self, index: u32, field: AffectField, valeur: String) {
        let slot = self.slots.entry(index).or_default();
        *Self::champ_mut(slot, field) = Some(valeur);
    }

    fn set_slot_if_absent(&mut self, index: u32, field: AffectField, valeur: String) {
        let slot = self.slots.entry(index).or_default();
        set_if_absent(Self::champ_mut(slot, field), valeur);
    }
}
