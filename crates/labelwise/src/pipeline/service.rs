use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use super::catalog::CatalogSource;
use super::domain::{CatalogId, ProductAnalysis, ProductRecord, UserProfile};
use super::enhancer::{AlternativeSuggester, SemanticEnhancer};
use super::evaluation::EvaluationEngine;
use super::normalize::normalize_ingredients;
use super::resolver::Resolver;
use super::store::{ProductStore, ProfileStore, RuleStore, StoreError};

/// Service composing the resolver, the evaluation engine, and profile
/// lookup. One instance serves all requests; per-request state stays on the
/// stack.
pub struct ScanService<S, R, P> {
    store: Arc<S>,
    profiles: Arc<P>,
    resolver: Resolver<S>,
    engine: EvaluationEngine<R>,
    enhancement_enabled: bool,
}

/// Successful barcode scan: the resolved product and its evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub product: ProductRecord,
    pub analysis: ProductAnalysis,
}

impl<S, R, P> ScanService<S, R, P>
where
    S: ProductStore + 'static,
    R: RuleStore + 'static,
    P: ProfileStore + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<S>,
        rules: Arc<R>,
        profiles: Arc<P>,
        sources: Vec<Arc<dyn CatalogSource>>,
        enhancer: Arc<dyn SemanticEnhancer>,
        suggester: Arc<dyn AlternativeSuggester>,
        enhancement_enabled: bool,
    ) -> Self {
        let resolver = Resolver::new(store.clone(), sources.clone());
        let engine = EvaluationEngine::new(rules, enhancer, suggester, sources);
        Self {
            store,
            profiles,
            resolver,
            engine,
            enhancement_enabled,
        }
    }

    /// Resolve a barcode and evaluate the product for the given user.
    /// `Ok(None)` is the user-visible not-found outcome.
    pub async fn scan(
        &self,
        barcode: &str,
        user_id: Option<&str>,
    ) -> Result<Option<ScanOutcome>, ScanServiceError> {
        let Some(product) = self
            .resolver
            .resolve(barcode)
            .await
            .map_err(ScanServiceError::Store)?
        else {
            return Ok(None);
        };

        if let Some(analysis) = self
            .store
            .fetch_analysis(barcode)
            .map_err(ScanServiceError::Store)?
        {
            if !analysis.is_stale() {
                return Ok(Some(ScanOutcome { product, analysis }));
            }
        }

        let profile = self.profile_for(user_id)?;
        let ingredients = product
            .ingredients_raw
            .as_deref()
            .map(normalize_ingredients)
            .unwrap_or_default();
        let display_name = product
            .name
            .clone()
            .unwrap_or_else(|| product.barcode.clone());

        let analysis = self
            .engine
            .evaluate(
                &profile,
                &ingredients,
                &display_name,
                self.enhancement_enabled,
            )
            .await
            .map_err(ScanServiceError::Rules)?;

        // Only full (non-skip-enhancement) evaluations are cached.
        if self.enhancement_enabled {
            self.persist_analysis(barcode, analysis.clone());
        }

        Ok(Some(ScanOutcome { product, analysis }))
    }

    /// Evaluate a raw ingredient list directly, without barcode resolution.
    pub async fn evaluate_ingredients(
        &self,
        ingredients: &[String],
        product_name: &str,
        user_id: Option<&str>,
    ) -> Result<ProductAnalysis, ScanServiceError> {
        let profile = self.profile_for(user_id)?;
        let tokens = normalize_ingredients(&ingredients.join(", "));
        self.engine
            .evaluate(&profile, &tokens, product_name, self.enhancement_enabled)
            .await
            .map_err(ScanServiceError::Rules)
    }

    /// Manual admin entry path: upsert a record without touching the
    /// external catalogs.
    pub fn create_manual_product(
        &self,
        barcode: &str,
        name: &str,
        brand: Option<String>,
        category: Option<String>,
        ingredients: Option<String>,
    ) -> Result<ProductRecord, ScanServiceError> {
        let record = ProductRecord {
            barcode: barcode.to_string(),
            source: CatalogId::Manual,
            name: Some(name.to_string()),
            brand,
            category,
            ingredients_raw: ingredients,
            nutrition: None,
            image_url: None,
            last_fetched_at: Utc::now(),
        };
        self.store.upsert(record).map_err(ScanServiceError::Store)
    }

    fn profile_for(&self, user_id: Option<&str>) -> Result<UserProfile, ScanServiceError> {
        let Some(user_id) = user_id else {
            return Ok(UserProfile::general("anonymous"));
        };
        let profile = self
            .profiles
            .fetch(user_id)
            .map_err(ScanServiceError::Profiles)?;
        Ok(profile.unwrap_or_else(|| UserProfile::general(user_id)))
    }

    /// Best-effort background write; failure is logged, never surfaced to
    /// the request that triggered it.
    fn persist_analysis(&self, barcode: &str, analysis: ProductAnalysis) {
        let store = self.store.clone();
        let barcode = barcode.to_string();
        tokio::spawn(async move {
            if let Err(err) = store.store_analysis(&barcode, analysis) {
                warn!(%barcode, %err, "failed to persist cached analysis");
            }
        });
    }
}

/// Fatal error class: the pipeline cannot produce a meaningful result
/// without its stores.
#[derive(Debug, thiserror::Error)]
pub enum ScanServiceError {
    #[error("product store failure: {0}")]
    Store(#[source] StoreError),
    #[error("rule store failure: {0}")]
    Rules(#[source] StoreError),
    #[error("profile store failure: {0}")]
    Profiles(#[source] StoreError),
}
