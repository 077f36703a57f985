use std::sync::Arc;

use super::common::*;
use crate::pipeline::catalog::CatalogSource;
use crate::pipeline::domain::CatalogId;
use crate::pipeline::resolver::Resolver;
use crate::pipeline::store::StoreError;

fn chain(sources: Vec<StubCatalog>) -> Vec<Arc<dyn CatalogSource>> {
    sources
        .into_iter()
        .map(|source| Arc::new(source) as Arc<dyn CatalogSource>)
        .collect()
}

#[tokio::test]
async fn walks_sources_in_priority_order_until_first_hit() {
    let calls = call_log();
    let store = Arc::new(MemoryStore::default());
    let upc_record = {
        let mut hit = record("4006381333931");
        hit.source = CatalogId::Upc;
        hit
    };
    let resolver = Resolver::new(
        store.clone(),
        chain(vec![
            StubCatalog::miss(CatalogId::Food, calls.clone()),
            StubCatalog::miss(CatalogId::Beauty, calls.clone()),
            StubCatalog::miss(CatalogId::Upc, calls.clone()).with_barcode_hit(upc_record),
        ]),
    );

    let resolved = resolver
        .resolve("4006381333931")
        .await
        .expect("store reachable")
        .expect("third source matches");

    assert_eq!(resolved.source, CatalogId::Upc);
    assert_eq!(
        logged_calls(&calls),
        vec!["food:barcode", "beauty:barcode", "upc:barcode"]
    );
    assert!(store.stored_product("4006381333931").is_some());
}

#[tokio::test]
async fn complete_cache_hit_skips_the_sources() {
    let calls = call_log();
    let store = Arc::new(MemoryStore::default());
    store.seed_product(record("111"));
    let resolver = Resolver::new(
        store,
        chain(vec![StubCatalog::miss(CatalogId::Food, calls.clone())]),
    );

    let resolved = resolver
        .resolve("111")
        .await
        .expect("store reachable")
        .expect("cache hit");

    assert_eq!(resolved.barcode, "111");
    assert!(logged_calls(&calls).is_empty());
}

#[tokio::test]
async fn incomplete_cache_entry_survives_a_failed_refetch() {
    let calls = call_log();
    let store = Arc::new(MemoryStore::default());
    let cached = record_without_image("222");
    store.seed_product(cached.clone());
    let resolver = Resolver::new(
        store,
        chain(vec![
            StubCatalog::miss(CatalogId::Food, calls.clone()),
            StubCatalog::miss(CatalogId::Beauty, calls.clone()),
        ]),
    );

    let resolved = resolver
        .resolve("222")
        .await
        .expect("store reachable")
        .expect("falls back to the cached record");

    assert_eq!(resolved, cached);
    // The repair attempt did walk the chain before regressing to cache.
    assert_eq!(logged_calls(&calls), vec!["food:barcode", "beauty:barcode"]);
}

#[tokio::test]
async fn refetch_merges_over_cached_fields_instead_of_clearing() {
    let calls = call_log();
    let store = Arc::new(MemoryStore::default());
    store.seed_product(record_without_image("333"));
    let sparse_hit = {
        let mut hit = record("333");
        hit.name = None;
        hit.brand = None;
        hit.category = None;
        hit.ingredients_raw = None;
        hit
    };
    let resolver = Resolver::new(
        store.clone(),
        chain(vec![
            StubCatalog::miss(CatalogId::Food, calls.clone()).with_barcode_hit(sparse_hit)
        ]),
    );

    let resolved = resolver
        .resolve("333")
        .await
        .expect("store reachable")
        .expect("refetch succeeds");

    assert_eq!(resolved.name.as_deref(), Some("Daily Face Cream"));
    assert_eq!(
        resolved.ingredients_raw.as_deref(),
        Some("Water (Aqua), Glycerin")
    );
    assert!(resolved.is_display_complete());
    assert_eq!(store.stored_product("333"), Some(resolved));
}

#[tokio::test]
async fn name_search_splices_missing_ingredients() {
    let calls = call_log();
    let store = Arc::new(MemoryStore::default());
    // UPC-style hit: has a name and an image, no ingredient list. The name
    // carries a size token the search query must drop.
    let upc_hit = {
        let mut hit = record("444");
        hit.source = CatalogId::Upc;
        hit.name = Some("Daily Face Cream 100ml".to_string());
        hit.ingredients_raw = None;
        hit
    };
    let search_hit = {
        let mut hit = record("444");
        hit.name = Some("Daily Face Cream".to_string());
        hit.ingredients_raw = Some("aqua, glycerin, panthenol".to_string());
        hit
    };
    let resolver = Resolver::new(
        store.clone(),
        chain(vec![
            StubCatalog::miss(CatalogId::Food, calls.clone()).with_name_hit(search_hit),
            StubCatalog::miss(CatalogId::Upc, calls.clone()).with_barcode_hit(upc_hit),
        ]),
    );

    let resolved = resolver
        .resolve("444")
        .await
        .expect("store reachable")
        .expect("resolution succeeds");

    assert_eq!(
        resolved.ingredients_raw.as_deref(),
        Some("aqua, glycerin, panthenol")
    );
    assert_eq!(resolved.name.as_deref(), Some("Daily Face Cream 100ml"));
    assert!(logged_calls(&calls).contains(&"food:name".to_string()));
}

#[tokio::test]
async fn failed_name_search_does_not_fail_resolution() {
    let calls = call_log();
    let store = Arc::new(MemoryStore::default());
    let upc_hit = {
        let mut hit = record("555");
        hit.ingredients_raw = None;
        hit
    };
    let resolver = Resolver::new(
        store,
        chain(vec![
            StubCatalog::miss(CatalogId::Food, calls.clone()).with_barcode_hit(upc_hit)
        ]),
    );

    let resolved = resolver
        .resolve("555")
        .await
        .expect("store reachable")
        .expect("resolution succeeds without ingredients");

    assert!(resolved.ingredients_raw.is_none());
}

#[tokio::test]
async fn unreachable_store_is_fatal() {
    let resolver = Resolver::new(Arc::new(UnavailableStore), Vec::new());

    let result = resolver.resolve("666").await;

    assert!(matches!(result, Err(StoreError::Unavailable(_))));
}
