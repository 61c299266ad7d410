//! Parsing des propriétés d'enregistrement: classification des clés,
//! normalisation par enregistrement et assemblage des fiches collectives

pub mod assemble;
pub mod classify;
pub mod normalize;

pub use assemble::{assemble, SEUIL_COLLECTIF};
pub use classify::{classify, AffectField, Collecte, FieldClass};
pub use normalize::normalize_properties;
