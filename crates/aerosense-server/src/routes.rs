//! HTTP surface: `/aqi`, `/api/aqi` and `/health`.

use std::sync::Arc;

use aerosense_core::{AqiRequest, AqiRouter, Measurement, DEFAULT_CITY, DEFAULT_LIMIT};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;

const SECONDARY_KEY_HEADER: &str = "x-owm-key";

pub type AppState = Arc<AqiRouter>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiQuery {
    pub city: Option<String>,
    pub limit: Option<usize>,
    pub secondary_key: Option<String>,
    pub owm_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AqiResponse {
    pub results: Vec<Measurement>,
}

pub fn app(router: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/aqi", get(get_aqi))
        .route("/api/aqi", get(get_aqi))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(router)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_aqi(
    State(router): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<AqiQuery>, QueryRejection>,
) -> Result<Json<AqiResponse>, ApiError> {
    let Query(query) = query?;
    let request = build_request(query, &headers)?;

    let span = info_span!(
        "aqi_request",
        request_id = %Uuid::new_v4(),
        city = %request.city,
        limit = request.limit,
    );
    async move {
        match router.get_aqi(&request).await {
            Ok(success) => Ok(Json(AqiResponse {
                results: success.results,
            })),
            Err(error) => {
                error!(code = error.last_source_error().code(), %error, "aqi request failed");
                Err(error.into())
            }
        }
    }
    .instrument(span)
    .await
}

/// Header credential wins over either query spelling.
fn build_request(query: AqiQuery, headers: &HeaderMap) -> Result<AqiRequest, ApiError> {
    let header_key = headers
        .get(SECONDARY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_owned);
    let query_key = query
        .secondary_key
        .filter(|value| !value.trim().is_empty())
        .or(query.owm_key);

    let request = AqiRequest::new(
        query.city.unwrap_or_else(|| String::from(DEFAULT_CITY)),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    )?;
    Ok(request.with_secondary_key(header_key.or(query_key)))
}
