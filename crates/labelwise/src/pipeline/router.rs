use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{ScanService, ScanServiceError};
use super::store::{ProductStore, ProfileStore, RuleStore};

/// Router builder exposing the pipeline's HTTP endpoints.
pub fn scan_router<S, R, P>(service: Arc<ScanService<S, R, P>>) -> Router
where
    S: ProductStore + 'static,
    R: RuleStore + 'static,
    P: ProfileStore + 'static,
{
    Router::new()
        .route("/api/v1/scan", post(scan_handler::<S, R, P>))
        .route("/api/v1/evaluate", post(evaluate_handler::<S, R, P>))
        .route(
            "/api/v1/products/:barcode",
            put(manual_product_handler::<S, R, P>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub barcode: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub ingredients: Vec<String>,
    pub product_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManualProductRequest {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
}

pub(crate) async fn scan_handler<S, R, P>(
    State(service): State<Arc<ScanService<S, R, P>>>,
    axum::Json(request): axum::Json<ScanRequest>,
) -> Response
where
    S: ProductStore + 'static,
    R: RuleStore + 'static,
    P: ProfileStore + 'static,
{
    match service
        .scan(&request.barcode, request.user_id.as_deref())
        .await
    {
        Ok(Some(outcome)) => {
            let payload = json!({
                "found": true,
                "product": outcome.product,
                "analysis": outcome.analysis,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        // Not-found is a non-exceptional outcome so clients can offer
        // manual entry.
        Ok(None) => {
            let payload = json!({ "found": false });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler<S, R, P>(
    State(service): State<Arc<ScanService<S, R, P>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    S: ProductStore + 'static,
    R: RuleStore + 'static,
    P: ProfileStore + 'static,
{
    match service
        .evaluate_ingredients(
            &request.ingredients,
            &request.product_name,
            request.user_id.as_deref(),
        )
        .await
    {
        Ok(analysis) => (StatusCode::OK, axum::Json(analysis)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn manual_product_handler<S, R, P>(
    State(service): State<Arc<ScanService<S, R, P>>>,
    Path(barcode): Path<String>,
    axum::Json(request): axum::Json<ManualProductRequest>,
) -> Response
where
    S: ProductStore + 'static,
    R: RuleStore + 'static,
    P: ProfileStore + 'static,
{
    match service.create_manual_product(
        &barcode,
        &request.name,
        request.brand,
        request.category,
        request.ingredients,
    ) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ScanServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
}
