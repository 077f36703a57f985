use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use labelwise::pipeline::domain::{IngredientRule, ProductAnalysis, ProductRecord, UserProfile};
use labelwise::pipeline::store::{ProductStore, ProfileStore, RuleStore, StoreError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProductStore {
    products: Arc<Mutex<HashMap<String, ProductRecord>>>,
    analyses: Arc<Mutex<HashMap<String, ProductAnalysis>>>,
}

impl InMemoryProductStore {
    pub(crate) fn seed(&self, record: ProductRecord) {
        self.products
            .lock()
            .expect("product mutex poisoned")
            .insert(record.barcode.clone(), record);
    }
}

impl ProductStore for InMemoryProductStore {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryRuleStore {
    rules: Arc<Mutex<Vec<IngredientRule>>>,
}

impl InMemoryRuleStore {
    pub(crate) fn seeded() -> Self {
        let store = Self::default();
        for rule in baseline_rules() {
            store
                .rules
                .lock()
                .expect("rule mutex poisoned")
                .push(rule);
        }
        store
    }
}

impl RuleStore for InMemoryRuleStore {
    fn rules_for(&self, ingredients: &[String]) -> Result<Vec<IngredientRule>, StoreError> {
        Ok(self
            .rules
            .lock()
            .expect("rule mutex poisoned")
            .iter()
            .filter(|rule| ingredients.contains(&rule.ingredient_name))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
}

impl InMemoryProfileStore {
    pub(crate) fn seed(&self, profile: UserProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.user_id.clone(), profile);
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn fetch(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .cloned())
    }
}

/// Curated starter rule set used until an external rule source is wired in.
pub(crate) fn baseline_rules() -> Vec<IngredientRule> {
    let mut fragrance = IngredientRule::new(
        "fragrance",
        "Undisclosed fragrance blends are a common trigger for sensitive skin and airways.",
    );
    fragrance.avoid_for.insert("Asthma".to_string());
    fragrance.caution_for.insert("Headaches".to_string());
    fragrance.tags.insert("fragrances".to_string());

    let mut methylparaben = IngredientRule::new(
        "methylparaben",
        "Paraben preservative with reported endocrine activity.",
    );
    methylparaben.avoid_for.insert("Endometriosis".to_string());
    methylparaben.tags.insert("preservatives".to_string());

    let mut sls = IngredientRule::new(
        "sodium lauryl sulfate",
        "Harsh surfactant that strips the skin barrier.",
    );
    sls.caution_for.insert("Dry skin".to_string());
    sls.tags.insert("surfactants".to_string());

    vec![fragrance, methylparaben, sls]
}
