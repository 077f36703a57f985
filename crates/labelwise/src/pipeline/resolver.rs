use std::sync::Arc;

use tracing::debug;

use super::catalog::CatalogSource;
use super::domain::ProductRecord;
use super::store::{ProductStore, StoreError};

const MAX_SEARCH_QUERY_CHARS: usize = 60;

/// Resolves a barcode to a product record via the cache and an ordered chain
/// of external catalog sources.
///
/// Cache policy is repair-without-regression: a cached record missing its
/// image is treated as a miss so the chain gets a chance to fill the gap,
/// but if the re-fetch fails entirely the original record is returned rather
/// than declaring not-found.
pub struct Resolver<S> {
    store: Arc<S>,
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl<S> Resolver<S>
where
    S: ProductStore,
{
    pub fn new(store: Arc<S>, sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self { store, sources }
    }

    /// Not-found is a first-class outcome (`Ok(None)`); only store failures
    /// are errors.
    pub async fn resolve(&self, barcode: &str) -> Result<Option<ProductRecord>, StoreError> {
        let cached = self.store.fetch(barcode)?;
        if let Some(record) = &cached {
            if record.is_display_complete() {
                return Ok(Some(record.clone()));
            }
            debug!(%barcode, "cached record incomplete, attempting repair");
        }

        let mut fetched = None;
        for source in &self.sources {
            if let Some(record) = source.product_by_barcode(barcode).await {
                debug!(%barcode, catalog = source.id().label(), "catalog hit");
                fetched = Some(record);
                break;
            }
        }

        let Some(mut record) = fetched else {
            // Every source missed. Fall back to whatever we already knew.
            return Ok(cached);
        };

        if record.ingredients_raw.is_none() {
            if let Some(name) = record.name.clone() {
                self.repair_by_name(&mut record, &name).await;
            }
        }

        let merged = match cached {
            Some(previous) => previous.merge_from(record),
            None => record,
        };
        let stored = self.store.upsert(merged)?;
        Ok(Some(stored))
    }

    /// Secondary name-search repair for records that arrived without an
    /// ingredient list. A failed search leaves the record untouched.
    async fn repair_by_name(&self, record: &mut ProductRecord, name: &str) {
        let query = sanitize_search_query(name);
        if query.is_empty() {
            return;
        }

        for source in &self.sources {
            let Some(hit) = source.product_by_name(&query).await else {
                continue;
            };
            if let Some(ingredients) = hit.ingredients_raw {
                debug!(
                    barcode = %record.barcode,
                    catalog = source.id().label(),
                    "spliced ingredients from name search"
                );
                record.ingredients_raw = Some(ingredients);
                if record.image_url.is_none() {
                    record.image_url = hit.image_url;
                }
                return;
            }
        }
    }
}

/// Prepares a product name for free-text search: size/volume tokens such as
/// "100ml" or "2x50g" are dropped and the query is capped in length.
pub fn sanitize_search_query(name: &str) -> String {
    let kept: Vec<&str> = name
        .split_whitespace()
        .filter(|token| !is_size_token(token))
        .collect();
    let joined = kept.join(" ");
    truncate_to_char_boundary(&joined, MAX_SEARCH_QUERY_CHARS).to_string()
}

fn is_size_token(token: &str) -> bool {
    let trimmed = token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_ascii_lowercase();
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    if !first.is_ascii_digit() {
        return false;
    }
    trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'x' | 'm' | 'l' | 'g' | 'k' | 'o' | 'z' | 'f'))
}

fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &text[..end]
}
