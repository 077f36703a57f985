//! Optional AI collaborators: the semantic enhancer and the alternative
//! suggester. Both are best-effort; every failure mode surfaces as an
//! [`EnhancerError`] the evaluation engine absorbs into degraded content.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{SafetyLevel, Severity};
use crate::config::EnhancerConfig;

/// Supplementary analysis returned by the semantic enhancer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Enhancement {
    pub score: Option<u32>,
    pub safety_level: Option<SafetyLevel>,
    pub summary: Option<String>,
    pub risk_categories: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub concerns: Vec<EnhancedConcern>,
    #[serde(default)]
    pub positives: Vec<String>,
}

/// Concern as reported by the enhancer, before dedup against the
/// rule/heuristic passes.
#[derive(Debug, Clone, Deserialize)]
pub struct EnhancedConcern {
    pub ingredient: String,
    pub reason: String,
    pub severity: Severity,
}

/// Substitute product proposal before buy-link and image enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestedAlternative {
    pub product_name: String,
    pub brand: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnhancerError {
    #[error("enhancer is disabled")]
    Disabled,
    #[error("enhancer network error: {0}")]
    Network(String),
    #[error("enhancer api error: {0}")]
    Api(String),
    #[error("enhancer returned unparseable content: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for EnhancerError {
    fn from(err: reqwest::Error) -> Self {
        EnhancerError::Network(err.to_string())
    }
}

/// Produces supplementary concerns/positives/summary for an ingredient list
/// in the context of a user profile.
#[async_trait]
pub trait SemanticEnhancer: Send + Sync {
    async fn enhance(
        &self,
        ingredients: &[String],
        profile_context: &str,
    ) -> Result<Enhancement, EnhancerError>;
}

/// Proposes substitute products for one flagged product.
#[async_trait]
pub trait AlternativeSuggester: Send + Sync {
    async fn suggest(
        &self,
        product_name: &str,
        avoided: &[String],
    ) -> Result<Vec<SuggestedAlternative>, EnhancerError>;
}

/// Explicit disabled mode used when no API key is configured. Keeping this a
/// first-class implementation keeps "no enhancer" out of the engine's logic.
pub struct EnhancerDisabled;

#[async_trait]
impl SemanticEnhancer for EnhancerDisabled {
    async fn enhance(
        &self,
        _ingredients: &[String],
        _profile_context: &str,
    ) -> Result<Enhancement, EnhancerError> {
        Err(EnhancerError::Disabled)
    }
}

#[async_trait]
impl AlternativeSuggester for EnhancerDisabled {
    async fn suggest(
        &self,
        _product_name: &str,
        _avoided: &[String],
    ) -> Result<Vec<SuggestedAlternative>, EnhancerError> {
        Err(EnhancerError::Disabled)
    }
}

/// Chat-completions client implementing both collaborator roles.
pub struct OpenAiEnhancer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEnhancer {
    /// Returns `None` when the config carries no API key; callers fall back
    /// to [`EnhancerDisabled`].
    pub fn from_config(client: reqwest::Client, config: &EnhancerConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, EnhancerError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: system.to_string(),
                },
                WireMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EnhancerError::Api(format!(
                "status {}",
                response.status()
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|err| EnhancerError::Parse(err.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| EnhancerError::Api("empty completion".to_string()))
    }
}

#[async_trait]
impl SemanticEnhancer for OpenAiEnhancer {
    async fn enhance(
        &self,
        ingredients: &[String],
        profile_context: &str,
    ) -> Result<Enhancement, EnhancerError> {
        let system = "You are an ingredient safety analyst. Respond with a single JSON object \
                      with the keys: score (0-100 integer), safety_level (\"good\", \"caution\" \
                      or \"avoid\"), summary (string), risk_categories (object mapping category \
                      name to integer count), concerns (array of {ingredient, reason, severity}) \
                      where severity is \"caution\" or \"avoid\", and positives (array of strings). \
                      No prose outside the JSON.";
        let user = format!(
            "Ingredients: {}\nUser context: {}",
            ingredients.join(", "),
            profile_context
        );

        let content = self.chat(system, &user).await?;
        let json = strip_code_blocks(&content);
        serde_json::from_str(json).map_err(|err| {
            debug!(%err, "enhancer returned non-JSON content");
            EnhancerError::Parse(err.to_string())
        })
    }
}

#[async_trait]
impl AlternativeSuggester for OpenAiEnhancer {
    async fn suggest(
        &self,
        product_name: &str,
        avoided: &[String],
    ) -> Result<Vec<SuggestedAlternative>, EnhancerError> {
        let system = "You recommend safer substitute products. Respond with a single JSON array \
                      of at most three objects with the keys product_name, brand, and reason. \
                      No prose outside the JSON.";
        let user = format!(
            "Product: {}\nIngredients to avoid: {}",
            product_name,
            avoided.join(", ")
        );

        let content = self.chat(system, &user).await?;
        let json = strip_code_blocks(&content);
        serde_json::from_str(json).map_err(|err| EnhancerError::Parse(err.to_string()))
    }
}

/// Strips markdown code fences models like to wrap JSON in.
fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}
