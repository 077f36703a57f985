//! External product catalog clients.
//!
//! Every upstream is reduced to the same lookup contract so the resolver can
//! walk an ordered chain of sources without caring which catalog it is
//! talking to. Transport errors, non-success statuses, and malformed payloads
//! all resolve to `None` so one flaky upstream never breaks the chain.

mod facts;
mod upc;

pub use facts::FactsCatalog;
pub use upc::UpcCatalog;

use std::sync::Arc;

use async_trait::async_trait;

use super::domain::{CatalogId, ProductRecord};
use crate::config::CatalogConfig;

/// Uniform lookup contract over one upstream catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn id(&self) -> CatalogId;

    /// Resolves a barcode to a product record, or `None` for not-found and
    /// every kind of upstream failure.
    async fn product_by_barcode(&self, barcode: &str) -> Option<ProductRecord>;

    /// Free-text name search. Only some catalogs support it; the default is
    /// a miss.
    async fn product_by_name(&self, _query: &str) -> Option<ProductRecord> {
        None
    }
}

/// Builds the fixed-priority source chain: food catalog first, then beauty,
/// then the generic UPC catalog.
pub fn catalog_chain(config: &CatalogConfig) -> Vec<Arc<dyn CatalogSource>> {
    let client = reqwest::Client::new();
    vec![
        Arc::new(FactsCatalog::food(
            client.clone(),
            config.food_base_url.clone(),
        )),
        Arc::new(FactsCatalog::beauty(
            client.clone(),
            config.beauty_base_url.clone(),
        )),
        Arc::new(UpcCatalog::new(
            client,
            config.upc_base_url.clone(),
            config.upc_timeout(),
        )),
    ]
}
