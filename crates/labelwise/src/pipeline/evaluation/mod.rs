mod heuristics;
mod rules;
mod summary;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::debug;

use super::catalog::CatalogSource;
use super::domain::{Alternative, Concern, ProductAnalysis, SafetyLevel, Severity, UserProfile};
use super::enhancer::{AlternativeSuggester, SemanticEnhancer};
use super::store::{RuleStore, StoreError};
use rules::contains_ingredient;

const ENHANCER_AVOID_PENALTY: i64 = 20;
const ENHANCER_CAUTION_PENALTY: i64 = 10;

/// Deterministic image substituted when no catalog can supply one for a
/// suggested alternative.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/256x256?text=No+Image";

/// Layered scoring engine: deterministic rules, heuristic family markers,
/// then optional semantic enhancement and alternative suggestions. Always
/// produces a complete analysis; collaborator failures degrade content only.
pub struct EvaluationEngine<R> {
    rules: Arc<R>,
    enhancer: Arc<dyn SemanticEnhancer>,
    suggester: Arc<dyn AlternativeSuggester>,
    catalogs: Vec<Arc<dyn CatalogSource>>,
}

impl<R> EvaluationEngine<R>
where
    R: RuleStore,
{
    pub fn new(
        rules: Arc<R>,
        enhancer: Arc<dyn SemanticEnhancer>,
        suggester: Arc<dyn AlternativeSuggester>,
        catalogs: Vec<Arc<dyn CatalogSource>>,
    ) -> Self {
        Self {
            rules,
            enhancer,
            suggester,
            catalogs,
        }
    }

    /// With `enhancement_enabled` false this is a pure function of the
    /// profile, the rule store contents, and the ingredient list.
    pub async fn evaluate(
        &self,
        profile: &UserProfile,
        ingredients: &[String],
        product_name: &str,
        enhancement_enabled: bool,
    ) -> Result<ProductAnalysis, StoreError> {
        let matched_rules = self.rules.rules_for(ingredients)?;
        let rule_pass = rules::apply_rules(&matched_rules, profile, ingredients);
        let mut concerns = rule_pass.concerns;
        let mut deduction = rule_pass.deduction;
        let mut category_hits = rule_pass.category_hits;

        for hit in heuristics::detect(ingredients) {
            if contains_ingredient(&concerns, &hit.ingredient) {
                continue;
            }
            deduction += heuristics::HEURISTIC_PENALTY;
            *category_hits.entry(hit.family.to_string()).or_insert(0) += 1;
            concerns.push(Concern {
                ingredient: hit.ingredient,
                reason: hit.reason,
                severity: Severity::Avoid,
            });
        }

        let mut positives = Vec::new();
        let mut enhancer_summary = None;
        let mut enhancer_categories = None;

        if enhancement_enabled {
            match self
                .enhancer
                .enhance(ingredients, &profile.context_text())
                .await
            {
                Ok(enhancement) => {
                    for concern in enhancement.concerns {
                        if contains_ingredient(&concerns, &concern.ingredient) {
                            continue;
                        }
                        deduction += match concern.severity {
                            Severity::Avoid => ENHANCER_AVOID_PENALTY,
                            Severity::Caution => ENHANCER_CAUTION_PENALTY,
                        };
                        concerns.push(Concern {
                            ingredient: concern.ingredient,
                            reason: concern.reason,
                            severity: concern.severity,
                        });
                    }
                    positives.extend(enhancement.positives);
                    enhancer_summary = enhancement.summary;
                    enhancer_categories = enhancement.risk_categories;
                }
                Err(err) => {
                    // Degraded, not fatal: the deterministic passes stand on
                    // their own and the fallback summary takes over.
                    debug!(%err, "semantic enhancement unavailable");
                }
            }
        }

        // All contributions subtract from 100, so only the lower bound can
        // actually be hit.
        let score = (100i64 - deduction).clamp(0, 100) as u32;
        let safety_level = SafetyLevel::from_score(score);

        let summary = enhancer_summary
            .unwrap_or_else(|| summary::fallback_summary(safety_level, concerns.len()));
        let risk_categories = Some(enhancer_categories.unwrap_or(category_hits));

        let alternatives = if enhancement_enabled && !concerns.is_empty() {
            self.alternatives_for(product_name, &concerns).await
        } else {
            Vec::new()
        };

        Ok(ProductAnalysis {
            score,
            safety_level,
            summary,
            concerns,
            positives,
            alternatives,
            risk_categories,
            computed_at: Utc::now(),
        })
    }

    /// Asks the suggester for substitutes and enriches each with a buy link
    /// and a best-effort catalog image. Enrichment runs concurrently across
    /// alternatives and is zipped back by index.
    async fn alternatives_for(&self, product_name: &str, concerns: &[Concern]) -> Vec<Alternative> {
        let avoided: Vec<String> = concerns
            .iter()
            .map(|concern| concern.ingredient.clone())
            .collect();

        let suggested = match self.suggester.suggest(product_name, &avoided).await {
            Ok(suggested) => suggested,
            Err(err) => {
                debug!(%err, "alternative suggestion unavailable");
                return Vec::new();
            }
        };

        let images = join_all(
            suggested
                .iter()
                .map(|candidate| self.image_by_name(&candidate.product_name)),
        )
        .await;

        suggested
            .into_iter()
            .zip(images)
            .map(|(candidate, image)| Alternative {
                buy_link: buy_link(&candidate.product_name),
                image_url: image.unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
                product_name: candidate.product_name,
                brand: candidate.brand,
                reason: candidate.reason,
            })
            .collect()
    }

    async fn image_by_name(&self, name: &str) -> Option<String> {
        for source in &self.catalogs {
            if let Some(record) = source.product_by_name(name).await {
                if record.image_url.is_some() {
                    return record.image_url;
                }
            }
        }
        None
    }
}

/// Deterministic shopping-search link for a suggested alternative.
fn buy_link(product_name: &str) -> String {
    format!(
        "https://www.google.com/search?tbm=shop&q={}",
        product_name.trim().replace(' ', "+")
    )
}
