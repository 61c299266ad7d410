//! Fusion inter-enregistrements des parcelles collectives
//!
//! Un recensement peut produire plusieurs lignes pour une même parcelle.
//! Les fiches assemblées par enregistrement sont regroupées par clé de
//! parcelle puis fusionnées: paires (prénom, nom) dédoublonnées en
//! préservant l'ordre de rencontre, champs secondaires réalignés sur la
//! liste de noms finale.

use std::collections::HashMap;

use geojson::{Feature, JsonObject};
use tracing::debug;

use crate::cache::CollectivesCache;
use crate::keys::{pick_first_present, FoldedKeys, PARCEL_KEY_VARIANTS};
use crate::parser::assemble::{assemble, SEUIL_COLLECTIF};
use crate::types::{FicheCollective, MetaParcelle, ParcelleCollective};
use crate::value::{split_lines, PLACEHOLDER};

/// Parse une liste de features GeoJSON du recensement et retourne les
/// parcelles collectives fusionnées, une par clé de parcelle.
///
/// Le cache injecté court-circuite les clés déjà calculées; les nouvelles
/// entrées y sont écrites au fil de l'eau (persistance en arrière-plan,
/// jamais bloquante). Ne lève jamais: une feature sans propriétés compte
/// comme un enregistrement vide.
pub fn parse_collectives(features: &[Feature], cache: &CollectivesCache) -> Vec<ParcelleCollective> {
    let records: Vec<JsonObject> = features
        .iter()
        .map(|f| f.properties.clone().unwrap_or_default())
        .collect();
    parse_collectives_props(&records, cache)
}

/// Variante de [`parse_collectives`] sur des objets de propriétés bruts
pub fn parse_collectives_props(
    records: &[JsonObject],
    cache: &CollectivesCache,
) -> Vec<ParcelleCollective> {
    // Groupement par clé de parcelle, ordre de première rencontre préservé.
    // Une clé introuvable envoie l'enregistrement dans le seau "": ces
    // enregistrements inadressables passeront très probablement sous le
    // seuil et seront écartés.
    let mut ordre: Vec<String> = Vec::new();
    let mut groupes: HashMap<String, Vec<&JsonObject>> = HashMap::new();
    for props in records {
        let key = pick_first_present(props, PARCEL_KEY_VARIANTS).unwrap_or_default();
        if !groupes.contains_key(&key) {
            ordre.push(key.clone());
        }
        groupes.entry(key).or_default().push(props);
    }

    let mut results = Vec::new();
    for key in &ordre {
        if let Some(cached) = cache.get(key) {
            debug!(parcelle = %key, "groupe servi depuis le cache");
            results.push((*cached).clone());
            continue;
        }

        let groupe = &groupes[key];
        let fiches: Vec<FicheCollective> = groupe.iter().filter_map(|p| assemble(p)).collect();
        if fiches.is_empty() {
            continue;
        }

        let combined = combine_fiches(&fiches, groupe[0]);
        // le seuil est réappliqué après fusion: la déduplication peut faire
        // tomber un groupe sous les deux noms
        if combined.nb_affectataires() >= SEUIL_COLLECTIF {
            let stored = cache.set(key, combined);
            results.push((*stored).clone());
        }
    }

    results
}

/// Fusionne les fiches d'un groupe de parcelle en un seul résultat
fn combine_fiches(fiches: &[FicheCollective], premier: &JsonObject) -> ParcelleCollective {
    // Concaténation des lignes non-sentinelles de chaque champ, dans
    // l'ordre des enregistrements du groupe
    let mut listes: [Vec<String>; 7] = Default::default();
    for fiche in fiches {
        for (liste, champ) in listes.iter_mut().zip(fiche.champs()) {
            liste.extend(split_lines(champ));
        }
    }

    // Dédoublonnage par paire (prénom, nom) à la même position; la
    // première occurrence gagne
    let max_len = listes[0].len().max(listes[1].len());
    let mut vues: Vec<(String, String)> = Vec::new();
    let mut prenoms: Vec<String> = Vec::new();
    let mut noms: Vec<String> = Vec::new();
    for i in 0..max_len {
        let prenom = listes[0]
            .get(i)
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let nom = listes[1]
            .get(i)
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let paire = (prenom.clone(), nom.clone());
        if vues.contains(&paire) {
            continue;
        }
        vues.push(paire);
        prenoms.push(prenom);
        noms.push(nom);
    }

    // Champs secondaires: valeurs distinctes en ordre de rencontre,
    // complétées par `-` puis tronquées à la longueur de la liste de noms
    let mut secondaires = listes[2..].iter().map(|liste| {
        let mut uniq: Vec<String> = Vec::new();
        for v in liste {
            if !uniq.contains(v) {
                uniq.push(v.clone());
            }
        }
        uniq.resize(prenoms.len(), PLACEHOLDER.to_string());
        uniq.join("\n")
    });

    ParcelleCollective {
        prenoms: prenoms.join("\n"),
        noms: noms.join("\n"),
        sexes: secondaires.next().unwrap_or_default(),
        numeros_piece: secondaires.next().unwrap_or_default(),
        telephones: secondaires.next().unwrap_or_default(),
        dates_naissance: secondaires.next().unwrap_or_default(),
        residences: secondaires.next().unwrap_or_default(),
        // métadonnées du premier enregistrement du groupe uniquement
        meta: MetaParcelle::from_props(&FoldedKeys::new(premier)),
    }
}
