//! Product resolution and safety evaluation pipeline.
//!
//! A scanned barcode flows through the [`resolver`] (cache read, ordered
//! external catalog fallback, name-search repair, cache write-back) and the
//! resulting ingredient list through the [`evaluation`] engine (deterministic
//! rules, heuristic family markers, optional semantic enhancement). Every
//! upstream failure short of a store outage degrades content, never shape.

pub mod catalog;
pub mod domain;
pub mod enhancer;
pub mod evaluation;
pub mod normalize;
pub mod resolver;
pub mod router;
pub mod service;
pub mod store;

pub use domain::{
    Alternative, CatalogId, Concern, IngredientRule, ProductAnalysis, ProductRecord, SafetyLevel,
    Severity, UserProfile,
};
pub use router::scan_router;
pub use service::{ScanOutcome, ScanService, ScanServiceError};

#[cfg(test)]
mod tests;
