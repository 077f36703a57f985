use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::CatalogSource;
use crate::pipeline::domain::{CatalogId, ProductRecord};

/// Client for the Open Food Facts / Open Beauty Facts wire shape. Both
/// catalogs share the same payload; they differ only in base URL, identity,
/// and whether free-text search is offered.
pub struct FactsCatalog {
    id: CatalogId,
    client: reqwest::Client,
    base_url: String,
    searchable: bool,
}

impl FactsCatalog {
    pub fn food(client: reqwest::Client, base_url: String) -> Self {
        Self {
            id: CatalogId::Food,
            client,
            base_url,
            searchable: true,
        }
    }

    pub fn beauty(client: reqwest::Client, base_url: String) -> Self {
        Self {
            id: CatalogId::Beauty,
            client,
            base_url,
            searchable: false,
        }
    }

    fn record_from(&self, barcode: &str, payload: FactsProduct) -> ProductRecord {
        ProductRecord {
            barcode: barcode.to_string(),
            source: self.id,
            name: non_empty(payload.product_name),
            brand: non_empty(payload.brands),
            category: non_empty(payload.categories),
            ingredients_raw: non_empty(payload.ingredients_text),
            nutrition: payload.nutriments,
            image_url: non_empty(payload.image_url),
            last_fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
impl CatalogSource for FactsCatalog {
    fn id(&self) -> CatalogId {
        self.id
    }

    async fn product_by_barcode(&self, barcode: &str) -> Option<ProductRecord> {
        let url = format!("{}/api/v2/product/{}.json", self.base_url, barcode);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(catalog = self.id.label(), %barcode, %err, "catalog request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(
                catalog = self.id.label(),
                %barcode,
                status = %response.status(),
                "catalog returned non-success status"
            );
            return None;
        }

        let envelope: FactsEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(catalog = self.id.label(), %barcode, %err, "malformed catalog payload");
                return None;
            }
        };

        match (envelope.status, envelope.product) {
            (Some(1), Some(product)) => Some(self.record_from(barcode, product)),
            _ => None,
        }
    }

    async fn product_by_name(&self, query: &str) -> Option<ProductRecord> {
        if !self.searchable {
            return None;
        }

        let url = format!("{}/cgi/search.pl", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", "1"),
            ])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let results: FactsSearchResults = response.json().await.ok()?;
        let product = results.products.into_iter().next()?;
        let barcode = product.code.clone()?;
        Some(self.record_from(&barcode, product))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct FactsEnvelope {
    status: Option<u8>,
    product: Option<FactsProduct>,
}

#[derive(Debug, Deserialize)]
struct FactsSearchResults {
    #[serde(default)]
    products: Vec<FactsProduct>,
}

#[derive(Debug, Deserialize)]
struct FactsProduct {
    code: Option<String>,
    product_name: Option<String>,
    brands: Option<String>,
    categories: Option<String>,
    ingredients_text: Option<String>,
    nutriments: Option<serde_json::Value>,
    image_url: Option<String>,
}
