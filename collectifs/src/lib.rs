//! # collectifs
//!
//! Normalisation des parcelles collectives d'un recensement foncier:
//! extraction des affectataires et du mandataire depuis des propriétés
//! GeoJSON hétérogènes, fusion inter-enregistrements par parcelle et
//! résolution des libellés d'affichage.
//!
//! ## Features
//!
//! - Classification tolérante des clés de propriétés (accents, casse,
//!   suffixes d'index, alias d'outils de collecte)
//! - Assemblage des fiches collectives avec mandataire en première ligne
//! - Fusion des enregistrements d'une même parcelle avec déduplication
//!   des paires (prénom, nom)
//! - Cache mémoire optionnellement adossé à un fichier JSON-lines
//!
//! ## Usage
//!
//! ```rust,ignore
//! use collectifs::{parse_collectives, CollectivesCache, JsonlStore};
//!
//! let cache = CollectivesCache::with_store(JsonlStore::new("cache.jsonl"));
//! cache.load_all().await?;
//!
//! let parcelles = parse_collectives(&features, &cache);
//! for parcelle in &parcelles {
//!     let mandataire = collectifs::compute_mandataire(&geojson::JsonObject::new(), Some(parcelle));
//!     println!("{} {}: {} affectataires",
//!         mandataire.prenom, mandataire.nom, parcelle.nb_affectataires());
//! }
//! ```

pub mod cache;
pub mod combine;
pub mod display;
pub mod error;
pub mod keys;
pub mod parser;
pub mod store;
pub mod types;
pub mod value;

pub use cache::CollectivesCache;
pub use combine::{parse_collectives, parse_collectives_props};
pub use display::{compute_mandataire, compute_mandataire_at, display_name_for_parcel, FicheMandataire};
pub use error::CollectifError;
pub use parser::{assemble, normalize_properties, SEUIL_COLLECTIF};
pub use store::{CacheStore, JsonlStore};
pub use types::{
    Affectataire, FicheCollective, Localisation, Mandataire, MetaParcelle, NormalizedProperties,
    ParcelleCollective,
};
