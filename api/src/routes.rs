use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pipeline::MatchedMapping;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::metrics;
use crate::state::AppState;

/// Metrics label for requests that no route or mapping claimed
pub const UNMATCHED_PATH: &str = "unmatched";

/// Operational endpoints first; every other path goes through the pipeline
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .fallback(dispatch)
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    match state.pipeline.process(request).await {
        Ok(response) => response,
        Err(error) => {
            let kind = error
                .kind()
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "transport".to_string());
            metrics::DISPATCH_ERRORS.with_label_values(&[&kind]).inc();
            tracing::error!(%kind, "Unhandled dispatch error: {}", error);
            let mapping = error.mapping_path().map(|path| MatchedMapping(path.to_string()));
            let mut response = error.into_response();
            if let Some(mapping) = mapping {
                response.extensions_mut().insert(mapping);
            }
            response
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    let now = chrono::Utc::now().to_rfc3339();

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": now,
            "uptime_secs": uptime,
            "mappings": state.pipeline.module().mappings.len(),
            "profiles": state.profiles.len(),
        })),
    )
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let body = metrics::gather_metrics(&state.registry);
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());
    let start = Instant::now();

    metrics::HTTP_IN_FLIGHT.inc();
    let response = next.run(req).await;
    metrics::HTTP_IN_FLIGHT.dec();

    let elapsed = start.elapsed();
    let status = response.status().as_u16();

    // Raw URIs are client-controlled; only configured paths become labels
    let label = matched_path
        .or_else(|| {
            response
                .extensions()
                .get::<MatchedMapping>()
                .map(|m| m.0.clone())
        })
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());
    metrics::observe_http(method.as_str(), &label, status, elapsed.as_secs_f64());

    tracing::info!("{method} {uri} {status} {}ms", elapsed.as_millis());

    response
}
