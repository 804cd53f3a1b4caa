//! Shared utility modules used across Vellum components.

pub mod levenshtein;
pub mod normalize;
