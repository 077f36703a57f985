use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::pipeline::catalog::CatalogSource;
use crate::pipeline::domain::{
    CatalogId, IngredientRule, ProductAnalysis, ProductRecord, UserProfile,
};
use crate::pipeline::enhancer::{
    AlternativeSuggester, Enhancement, EnhancerDisabled, EnhancerError, SemanticEnhancer,
    SuggestedAlternative,
};
use crate::pipeline::evaluation::EvaluationEngine;
use crate::pipeline::store::{ProductStore, ProfileStore, RuleStore, StoreError};

pub(super) type CallLog = Arc<Mutex<Vec<String>>>;

pub(super) fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub(super) fn logged_calls(log: &CallLog) -> Vec<String> {
    log.lock().expect("call log poisoned").clone()
}

/// Catalog stub with canned answers that records every call in a shared log
/// so tests can assert on attempt order.
pub(super) struct StubCatalog {
    id: CatalogId,
    by_barcode: Option<ProductRecord>,
    by_name: Option<ProductRecord>,
    calls: CallLog,
}

impl StubCatalog {
    pub(super) fn miss(id: CatalogId, calls: CallLog) -> Self {
        Self {
            id,
            by_barcode: None,
            by_name: None,
            calls,
        }
    }

    pub(super) fn with_barcode_hit(mut self, record: ProductRecord) -> Self {
        self.by_barcode = Some(record);
        self
    }

    pub(super) fn with_name_hit(mut self, record: ProductRecord) -> Self {
        self.by_name = Some(record);
        self
    }
}

#[async_trait]
impl CatalogSource for StubCatalog {
    fn id(&self) -> CatalogId {
        self.id
    }

    async fn product_by_barcode(&self, _barcode: &str) -> Option<ProductRecord> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(format!("{}:barcode", self.id.label()));
        self.by_barcode.clone()
    }

    async fn product_by_name(&self, query: &str) -> Option<ProductRecord> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(format!("{}:name", self.id.label()));
        self.by_name
            .clone()
            .filter(|hit| hit.name.as_deref() == Some(query))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    products: Arc<Mutex<HashMap<String, ProductRecord>>>,
    analyses: Arc<Mutex<HashMap<String, ProductAnalysis>>>,
}

impl MemoryStore {
    pub(super) fn seed_product(&self, record: ProductRecord) {
        self.products
            .lock()
            .expect("product mutex poisoned")
            .insert(record.barcode.clone(), record);
    }

    pub(super) fn seed_analysis(&self, barcode: &str, analysis: ProductAnalysis) {
        self.analyses
            .lock()
            .expect("analysis mutex poisoned")
            .insert(barcode.to_string(), analysis);
    }

    pub(super) fn stored_product(&self, barcode: &str) -> Option<ProductRecord> {
        self.products
            .lock()
            .expect("product mutex poisoned")
            .get(barcode)
            .cloned()
    }

    pub(super) fn stored_analysis(&self, barcode: &str) -> Option<ProductAnalysis> {
        self.analyses
            .lock()
            .expect("analysis mutex poisoned")
            .get(barcode)
            .cloned()
    }
}

impl ProductStore for MemoryStore {
    fn fetch(&self, barcode: &str) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self
            .products
            .lock()
            .expect("product mutex poisoned")
            .get(barcode)
            .cloned())
    }

    fn upsert(&self, record: ProductRecord) -> Result<ProductRecord, StoreError> {
        let mut guard = self.products.lock().expect("product mutex poisoned");
        let merged = match guard.remove(&record.barcode) {
            Some(existing) => existing.merge_from(record),
            None => record,
        };
        guard.insert(merged.barcode.clone(), merged.clone());
        Ok(merged)
    }

    fn fetch_analysis(&self, barcode: &str) -> Result<Option<ProductAnalysis>, StoreError> {
        Ok(self
            .analyses
            .lock()
            .expect("analysis mutex poisoned")
            .get(barcode)
            .cloned())
    }

    fn store_analysis(&self, barcode: &str, analysis: ProductAnalysis) -> Result<(), StoreError> {
        self.analyses
            .lock()
            .expect("analysis mutex poisoned")
            .insert(barcode.to_string(), analysis);
        Ok(())
    }
}

/// Product store whose every operation fails, for fatal-path assertions.
pub(super) struct UnavailableStore;

impl ProductStore for UnavailableStore {
    fn fetch(&self, _barcode: &str) -> Result<Option<ProductRecord>, StoreError> {
        Err(StoreError::Unavailable("primary datastore down".to_string()))
    }

    fn upsert(&self, _record: ProductRecord) -> Result<ProductRecord, StoreError> {
        Err(StoreError::Unavailable("primary datastore down".to_string()))
    }

    fn fetch_analysis(&self, _barcode: &str) -> Result<Option<ProductAnalysis>, StoreError> {
        Err(StoreError::Unavailable("primary datastore down".to_string()))
    }

    fn store_analysis(
        &self,
        _barcode: &str,
        _analysis: ProductAnalysis,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("primary datastore down".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRules {
    rules: Vec<IngredientRule>,
}

impl MemoryRules {
    pub(super) fn with(rules: Vec<IngredientRule>) -> Self {
        Self { rules }
    }
}

impl RuleStore for MemoryRules {
    fn rules_for(&self, ingredients: &[String]) -> Result<Vec<IngredientRule>, StoreError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| ingredients.contains(&rule.ingredient_name))
            .cloned()
            .collect())
    }
}

/// Rule store that always fails; used to prove cached-analysis paths never
/// consult the rules.
pub(super) struct UnavailableRules;

impl RuleStore for UnavailableRules {
    fn rules_for(&self, _ingredients: &[String]) -> Result<Vec<IngredientRule>, StoreError> {
        Err(StoreError::Unavailable("rule store down".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
}

impl MemoryProfiles {
    pub(super) fn seed(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.user_id.clone(), profile);
    }
}

impl ProfileStore for MemoryProfiles {
    fn fetch(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .cloned())
    }
}

/// Enhancer stub returning a canned enhancement.
pub(super) struct StubEnhancer {
    pub(super) enhancement: Enhancement,
}

#[async_trait]
impl SemanticEnhancer for StubEnhancer {
    async fn enhance(
        &self,
        _ingredients: &[String],
        _profile_context: &str,
    ) -> Result<Enhancement, EnhancerError> {
        Ok(self.enhancement.clone())
    }
}

/// Enhancer stub that always fails with a transport error.
pub(super) struct FailingEnhancer;

#[async_trait]
impl SemanticEnhancer for FailingEnhancer {
    async fn enhance(
        &self,
        _ingredients: &[String],
        _profile_context: &str,
    ) -> Result<Enhancement, EnhancerError> {
        Err(EnhancerError::Network("connection reset".to_string()))
    }
}

pub(super) struct StubSuggester {
    pub(super) items: Vec<SuggestedAlternative>,
}

#[async_trait]
impl AlternativeSuggester for StubSuggester {
    async fn suggest(
        &self,
        _product_name: &str,
        _avoided: &[String],
    ) -> Result<Vec<SuggestedAlternative>, EnhancerError> {
        Ok(self.items.clone())
    }
}

pub(super) fn record(barcode: &str) -> ProductRecord {
    ProductRecord {
        barcode: barcode.to_string(),
        source: CatalogId::Food,
        name: Some("Daily Face Cream".to_string()),
        brand: Some("Dermalux".to_string()),
        category: Some("skincare".to_string()),
        ingredients_raw: Some("Water (Aqua), Glycerin".to_string()),
        nutrition: None,
        image_url: Some("https://img.example/cream.jpg".to_string()),
        last_fetched_at: Utc::now(),
    }
}

pub(super) fn record_without_image(barcode: &str) -> ProductRecord {
    ProductRecord {
        image_url: None,
        ..record(barcode)
    }
}

pub(super) fn profile_with(
    conditions: &[&str],
    symptoms: &[&str],
    sensitivities: &[&str],
) -> UserProfile {
    UserProfile {
        user_id: "u-test".to_string(),
        conditions: to_set(conditions),
        symptoms: to_set(symptoms),
        sensitivities: to_set(sensitivities),
        goals: BTreeSet::new(),
        dietary_preferences: BTreeSet::new(),
    }
}

fn to_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn avoid_rule(name: &str, condition: &str, explanation: &str) -> IngredientRule {
    let mut rule = IngredientRule::new(name, explanation);
    rule.avoid_for.insert(condition.to_string());
    rule.tags.insert("preservatives".to_string());
    rule
}

pub(super) fn caution_rule(name: &str, symptom: &str, explanation: &str) -> IngredientRule {
    let mut rule = IngredientRule::new(name, explanation);
    rule.caution_for.insert(symptom.to_string());
    rule
}

/// Engine with the given rules, no collaborators, no catalogs.
pub(super) fn deterministic_engine(rules: Vec<IngredientRule>) -> EvaluationEngine<MemoryRules> {
    EvaluationEngine::new(
        Arc::new(MemoryRules::with(rules)),
        Arc::new(EnhancerDisabled),
        Arc::new(EnhancerDisabled),
        Vec::new(),
    )
}

pub(super) fn ingredients(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|token| token.to_string()).collect()
}
