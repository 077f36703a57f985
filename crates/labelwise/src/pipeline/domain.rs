use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies which catalog produced a product record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogId {
    Food,
    Beauty,
    Upc,
    Manual,
}

impl CatalogId {
    pub fn label(&self) -> &'static str {
        match self {
            CatalogId::Food => "food",
            CatalogId::Beauty => "beauty",
            CatalogId::Upc => "upc",
            CatalogId::Manual => "manual",
        }
    }
}

/// Canonical product record keyed by barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: String,
    pub source: CatalogId,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub ingredients_raw: Option<String>,
    pub nutrition: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub last_fetched_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Explicit completeness flag the cache-repair policy keys on: a record
    /// without an image is worth a re-resolution attempt.
    pub fn is_display_complete(&self) -> bool {
        self.image_url.is_some()
    }

    /// Merge semantics for cache upserts: a field present in `newer`
    /// overwrites, an absent field never clears previously known data.
    pub fn merge_from(mut self, newer: ProductRecord) -> ProductRecord {
        self.source = newer.source;
        self.last_fetched_at = newer.last_fetched_at;
        if newer.name.is_some() {
            self.name = newer.name;
        }
        if newer.brand.is_some() {
            self.brand = newer.brand;
        }
        if newer.category.is_some() {
            self.category = newer.category;
        }
        if newer.ingredients_raw.is_some() {
            self.ingredients_raw = newer.ingredients_raw;
        }
        if newer.nutrition.is_some() {
            self.nutrition = newer.nutrition;
        }
        if newer.image_url.is_some() {
            self.image_url = newer.image_url;
        }
        self
    }
}

/// Overall verdict bands derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Good,
    Caution,
    Avoid,
}

impl SafetyLevel {
    /// Band thresholds are closed design constants: scores below 50 are
    /// avoid, below 80 caution, 80 and up good.
    pub fn from_score(score: u32) -> Self {
        if score < 50 {
            SafetyLevel::Avoid
        } else if score < 80 {
            SafetyLevel::Caution
        } else {
            SafetyLevel::Good
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SafetyLevel::Good => "good",
            SafetyLevel::Caution => "caution",
            SafetyLevel::Avoid => "avoid",
        }
    }
}

/// Severity attached to a single flagged ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Caution,
    Avoid,
}

/// One flagged ingredient with the reason it was flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concern {
    pub ingredient: String,
    pub reason: String,
    pub severity: Severity,
}

/// Substitute product proposed by the alternative suggester, enriched with a
/// purchase link and a best-effort image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub product_name: String,
    pub brand: String,
    pub reason: String,
    pub buy_link: String,
    pub image_url: String,
}

/// Complete evaluation of a product for one profile. Doubles as the cached
/// analysis row; an entry without a risk-category breakdown predates the
/// breakdown schema and is treated as stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub score: u32,
    pub safety_level: SafetyLevel,
    pub summary: String,
    pub concerns: Vec<Concern>,
    pub positives: Vec<String>,
    pub alternatives: Vec<Alternative>,
    pub risk_categories: Option<BTreeMap<String, u32>>,
    pub computed_at: DateTime<Utc>,
}

impl ProductAnalysis {
    pub fn is_stale(&self) -> bool {
        self.risk_categories.is_none()
    }
}

/// Structured avoid/caution rule for a single canonical ingredient name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRule {
    pub ingredient_name: String,
    pub tags: BTreeSet<String>,
    pub avoid_for: BTreeSet<String>,
    pub caution_for: BTreeSet<String>,
    pub explanation: String,
    pub confidence: f32,
}

impl IngredientRule {
    pub fn new(ingredient_name: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            ingredient_name: ingredient_name.into(),
            tags: BTreeSet::new(),
            avoid_for: BTreeSet::new(),
            caution_for: BTreeSet::new(),
            explanation: explanation.into(),
            confidence: 1.0,
        }
    }
}

/// Health profile the evaluation is personalized against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub conditions: BTreeSet<String>,
    pub symptoms: BTreeSet<String>,
    pub sensitivities: BTreeSet<String>,
    pub goals: BTreeSet<String>,
    pub dietary_preferences: BTreeSet<String>,
}

impl UserProfile {
    /// Default profile used when no stored profile exists for a user.
    pub fn general(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conditions: BTreeSet::new(),
            symptoms: BTreeSet::new(),
            sensitivities: BTreeSet::new(),
            goals: BTreeSet::new(),
            dietary_preferences: BTreeSet::new(),
        }
    }

    /// Renders the profile as prompt context for the semantic enhancer.
    pub fn context_text(&self) -> String {
        let mut parts = Vec::new();
        for (label, set) in [
            ("conditions", &self.conditions),
            ("symptoms", &self.symptoms),
            ("sensitivities", &self.sensitivities),
            ("goals", &self.goals),
            ("dietary preferences", &self.dietary_preferences),
        ] {
            if !set.is_empty() {
                parts.push(format!(
                    "{label}: {}",
                    set.iter().cloned().collect::<Vec<_>>().join(", ")
                ));
            }
        }
        if parts.is_empty() {
            "general health".to_string()
        } else {
            parts.join("; ")
        }
    }
}
