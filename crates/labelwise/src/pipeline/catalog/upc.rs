use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::CatalogSource;
use crate::pipeline::domain::{CatalogId, ProductRecord};

/// Generic UPC lookup client (UPCitemdb wire shape). Bounds its own latency
/// with a hard timeout; expiry resolves to a miss so the fallback chain is
/// never held hostage by a slow upstream.
pub struct UpcCatalog {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl UpcCatalog {
    pub fn new(client: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    async fn lookup(&self, barcode: &str) -> Option<ProductRecord> {
        let url = format!("{}/prod/trial/lookup", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("upc", barcode)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let envelope: UpcEnvelope = response.json().await.ok()?;
        let item = envelope.items.into_iter().next()?;
        Some(ProductRecord {
            barcode: barcode.to_string(),
            source: CatalogId::Upc,
            name: item.title.filter(|text| !text.trim().is_empty()),
            brand: item.brand.filter(|text| !text.trim().is_empty()),
            category: item.category.filter(|text| !text.trim().is_empty()),
            ingredients_raw: None,
            nutrition: None,
            image_url: item.images.into_iter().next(),
            last_fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl CatalogSource for UpcCatalog {
    fn id(&self) -> CatalogId {
        CatalogId::Upc
    }

    async fn product_by_barcode(&self, barcode: &str) -> Option<ProductRecord> {
        match tokio::time::timeout(self.timeout, self.lookup(barcode)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(%barcode, timeout_secs = self.timeout.as_secs(), "upc lookup timed out");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpcEnvelope {
    #[serde(default)]
    items: Vec<UpcItem>,
}

#[derive(Debug, Deserialize)]
struct UpcItem {
    title: Option<String>,
    brand: Option<String>,
    category: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}
