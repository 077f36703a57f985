use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryProductStore, InMemoryProfileStore, InMemoryRuleStore};
use crate::routes::with_scan_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use labelwise::config::AppConfig;
use labelwise::error::AppError;
use labelwise::pipeline::catalog::catalog_chain;
use labelwise::pipeline::enhancer::{
    AlternativeSuggester, EnhancerDisabled, OpenAiEnhancer, SemanticEnhancer,
};
use labelwise::pipeline::ScanService;
use labelwise::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let sources = catalog_chain(&config.catalogs);
    let (enhancer, suggester, enhancement_enabled) = build_enhancer(&config);

    let store = Arc::new(InMemoryProductStore::default());
    let rules = Arc::new(InMemoryRuleStore::seeded());
    let profiles = Arc::new(InMemoryProfileStore::default());
    let scan_service = Arc::new(ScanService::new(
        store,
        rules,
        profiles,
        sources,
        enhancer,
        suggester,
        enhancement_enabled,
    ));

    let app = with_scan_routes(scan_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, enhancement_enabled, "scan service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// One enhancer instance backs both collaborator seams; when no API key is
/// configured the disabled variant keeps the pipeline purely deterministic.
fn build_enhancer(
    config: &AppConfig,
) -> (Arc<dyn SemanticEnhancer>, Arc<dyn AlternativeSuggester>, bool) {
    match OpenAiEnhancer::from_config(reqwest::Client::new(), &config.enhancer) {
        Some(enhancer) => {
            let enhancer = Arc::new(enhancer);
            (enhancer.clone(), enhancer, true)
        }
        None => (Arc::new(EnhancerDisabled), Arc::new(EnhancerDisabled), false),
    }
}
