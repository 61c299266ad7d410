//! Tests d'intégration sur un recensement complet (GeoJSON en mémoire)

use collectifs::{
    compute_mandataire_at, display_name_for_parcel, parse_collectives, CollectivesCache,
    JsonlStore,
};
use geojson::GeoJson;
use serde_json::json;

fn recensement() -> Vec<geojson::Feature> {
    // trois enregistrements: deux pour la parcelle P-001 (format indexé
    // puis format agrégé), un individuel sous le seuil
    let doc = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": null,
                "properties": {
                    "Num_parcel": "P-001",
                    "Village": "Bandafassi",
                    "Prénom_Mandataire": "Awa",
                    "Nom_Mandataire": "Ndiaye",
                    "Telephon2": "770000001",
                    "Prenom_001": "Moussa",
                    "Nom_001": "Sow",
                    "Prenom_002": "Fatou",
                    "Nom_002": "Ba"
                }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {
                    "Num_parcel": "P-001",
                    "Prenom": "Moussa\nIbrahima",
                    "Nom": "Sow\nDiallo",
                    "Telephone": "770000002\n770000003"
                }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {
                    "Num_parcel": "P-002",
                    "Prenom": "Solo",
                    "Nom": "Camara"
                }
            }
        ]
    });
    match doc.to_string().parse::<GeoJson>().unwrap() {
        GeoJson::FeatureCollection(fc) => fc.features,
        _ => unreachable!(),
    }
}

#[test]
fn test_parse_recensement_complet() {
    let cache = CollectivesCache::new();
    let parcelles = parse_collectives(&recensement(), &cache);

    // P-002 est individuelle et disparaît
    assert_eq!(parcelles.len(), 1);
    let p = &parcelles[0];
    assert_eq!(p.meta.num_parcel, "P-001");
    assert_eq!(p.meta.village, "Bandafassi");

    // mandataire en tête, puis affectataires dédupliqués entre les deux
    // enregistrements (Moussa Sow n'apparaît qu'une fois)
    let prenoms: Vec<&str> = p.prenoms.split('\n').collect();
    let noms: Vec<&str> = p.noms.split('\n').collect();
    assert_eq!(prenoms, vec!["Awa", "Moussa", "Fatou", "Ibrahima"]);
    assert_eq!(noms, vec!["Ndiaye", "Sow", "Ba", "Diallo"]);
    assert_eq!(p.nb_affectataires(), 4);

    // tous les champs restent alignés sur la liste de noms
    for champ in [&p.sexes, &p.numeros_piece, &p.telephones, &p.dates_naissance, &p.residences] {
        assert_eq!(champ.split('\n').count(), 4);
    }
}

#[test]
fn test_resolution_affichage() {
    let features = recensement();
    let cache = CollectivesCache::new();
    let parcelles = parse_collectives(&features, &cache);
    let p = &parcelles[0];

    let aujourd_hui = chrono::NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    let premier = features[0].properties.as_ref().unwrap();
    let mandataire = compute_mandataire_at(premier, Some(p), aujourd_hui);
    assert_eq!(mandataire.prenom, "Awa");
    assert_eq!(mandataire.nom, "Ndiaye");
    assert_eq!(mandataire.telephone, "770000001");

    assert_eq!(display_name_for_parcel(Some(p), &json!({})), "Awa Ndiaye");
    // sans parcelle fusionnée, repli sur le numéro nu
    assert_eq!(
        display_name_for_parcel(None, &json!({ "Num_parcel": "P-002" })),
        "P-002"
    );
}

#[test]
fn test_mandataire_enregistrement_individuel() {
    // enregistrement sous le seuil: le mandataire reste résoluble depuis
    // les clés brutes, sans parcelle fusionnée
    let props = json!({
        "Num_parcel": "P-010",
        "Prenom_M": "FILY",
        "Nom_M": "BAMBARA",
        "Date_nai": "01/06/1980",
        "Telephon2": "772223344"
    })
    .as_object()
    .unwrap()
    .clone();
    let aujourd_hui = chrono::NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    let mandataire = compute_mandataire_at(&props, None, aujourd_hui);
    assert_eq!(mandataire.prenom, "FILY");
    assert_eq!(mandataire.date_naissance, "01/06/1980 (45 ans)");

    // et le nom d'affichage suit, y compris quand l'objet réel est
    // sérialisé dans un membre `properties`
    let row = json!({ "properties": serde_json::Value::Object(props).to_string() });
    assert_eq!(display_name_for_parcel(None, &row), "FILY BAMBARA");
}

#[test]
fn test_rejeu_stable() {
    // rejouer le même recensement avec le même cache redonne le même
    // résultat sans recalcul
    let cache = CollectivesCache::new();
    let premier = parse_collectives(&recensement(), &cache);
    let second = parse_collectives(&recensement(), &cache);
    assert_eq!(premier, second);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_cache_persistant_entre_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let chemin = dir.path().join("collectives.jsonl");

    let attendu = {
        let cache = CollectivesCache::with_store(JsonlStore::new(&chemin));
        cache.load_all().await.unwrap();
        let parcelles = parse_collectives(&recensement(), &cache);
        // laisser l'écriture de fond aboutir
        for _ in 0..50 {
            if chemin.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        parcelles
    };
    assert!(chemin.exists());

    // nouvelle session: la parcelle est servie depuis le fichier
    let cache = CollectivesCache::with_store(JsonlStore::new(&chemin));
    let charges = cache.load_all().await.unwrap();
    assert_eq!(charges, 1);
    let parcelles = parse_collectives(&recensement(), &cache);
    assert_eq!(parcelles, attendu);
}
