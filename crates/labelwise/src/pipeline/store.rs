use super::domain::{IngredientRule, ProductAnalysis, ProductRecord, UserProfile};

/// Keyed product/analysis store. Implementations must provide merge
/// semantics on upsert: fields absent in the incoming record never clear
/// previously stored data.
pub trait ProductStore: Send + Sync {
    fn fetch(&self, barcode: &str) -> Result<Option<ProductRecord>, StoreError>;
    fn upsert(&self, record: ProductRecord) -> Result<ProductRecord, StoreError>;
    fn fetch_analysis(&self, barcode: &str) -> Result<Option<ProductAnalysis>, StoreError>;
    fn store_analysis(&self, barcode: &str, analysis: ProductAnalysis) -> Result<(), StoreError>;
}

/// Read-only lookup of avoid/caution rules by canonical ingredient name.
pub trait RuleStore: Send + Sync {
    /// Returns the rules whose `ingredient_name` exactly matches one of the
    /// given lowercase tokens. Missing names are simply not returned.
    fn rules_for(&self, ingredients: &[String]) -> Result<Vec<IngredientRule>, StoreError>;
}

/// Read-only lookup of user health profiles. An absent profile is valid and
/// maps to the general-health default downstream.
pub trait ProfileStore: Send + Sync {
    fn fetch(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;
}

/// Store failures are the only fatal error class in the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
