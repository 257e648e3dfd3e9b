// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `mlserve serve` command: the HTTP surface over a [`ServingContext`].
//!
//! ```text
//! GET  /health         → {ready, loaded, version}
//! GET  /version        → {version}
//! GET  /metrics        → {requests, latency_ms_p50, latency_ms_p95, window, version}
//! POST /predict        → {prediction, proba, latency_ms}        (api key)
//! POST /predict_batch  → {predictions, proba, latency_ms}       (api key)
//! ```
//!
//! Handlers hold no state of their own; everything flows through the
//! injected context. Model calls are synchronous and run on the blocking
//! pool.

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serving::{
    HealthStatus, MetricsReport, PredictError, ServingConfig, ServingContext, VersionInfo,
};
use std::sync::Arc;
use std::time::Instant;

/// Header carrying the API key on prediction routes.
pub const API_KEY_HEADER: &str = "x-api-key";

// ── State and wire types ───────────────────────────────────────

/// Shared router state.
#[derive(Debug, Clone)]
pub struct AppState {
    ctx: ServingContext,
    api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(ctx: ServingContext, api_key: Option<String>) -> Self {
        Self {
            ctx,
            api_key: api_key.map(Arc::from),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
    #[serde(default)]
    pub return_proba: bool,
}

#[derive(Debug, serde::Deserialize)]
pub struct PredictBatchRequest {
    pub items: Vec<Vec<f64>>,
    #[serde(default)]
    pub return_proba: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct PredictResponse {
    pub prediction: i64,
    pub proba: Option<Vec<f64>>,
    pub latency_ms: f64,
}

#[derive(Debug, serde::Serialize)]
pub struct PredictBatchResponse {
    pub predictions: Vec<i64>,
    pub proba: Option<Vec<Vec<f64>>>,
    pub latency_ms: f64,
}

/// An error response with a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            detail: "Unauthorized".into(),
        }
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("request failed: {err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: err.to_string(),
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if err.is_retriable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

// ── Router ─────────────────────────────────────────────────────

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let predictions = Router::new()
        .route("/predict", post(predict))
        .route("/predict_batch", post(predict_batch))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/metrics", get(metrics))
        .merge(predictions)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn execute(config: ServingConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║               mlserve · HTTP Server                 ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let ctx = ServingContext::from_config(&config)?;

    println!("  Config:");
    println!("   Artifact: {}", config.artifact_path.display());
    println!("   Bind:     {}", config.bind_addr);
    println!("   Window:   {} samples", config.window_capacity);
    println!(
        "   API key:  {}",
        if config.api_key.is_some() { "required" } else { "off" }
    );

    if config.eager_load {
        let warm = ctx.clone();
        let loaded = tokio::task::spawn_blocking(move || warm.warm_up()).await?;
        if loaded {
            println!("   Model:    loaded");
        } else {
            println!("   Model:    not loaded, retrying on first request");
        }
    } else {
        println!("   Model:    lazy, loads on first request");
    }
    println!();

    let window = Arc::clone(ctx.window());
    let app = router(AppState::new(ctx, config.api_key.clone()));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind '{}'", config.bind_addr))?;

    let addr = listener.local_addr()?;
    tracing::info!("listening on {addr}");
    println!("  Listening on http://{addr} (Ctrl-C to stop)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped. {}", window.summary().summary());
    Ok(())
}

// ── Handlers ───────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.ctx.health().health())
}

async fn version(State(state): State<AppState>) -> Json<VersionInfo> {
    Json(state.ctx.health().version())
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.ctx.health().metrics())
}

async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let ctx = state.ctx;
    let result = tokio::task::spawn_blocking(move || {
        ctx.pipeline().predict_one(&req.features, req.return_proba)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(PredictResponse {
        prediction: result.label,
        proba: result.probabilities,
        latency_ms: result.latency_ms,
    }))
}

async fn predict_batch(
    State(state): State<AppState>,
    Json(req): Json<PredictBatchRequest>,
) -> Result<Json<PredictBatchResponse>, ApiError> {
    let ctx = state.ctx;
    let result = tokio::task::spawn_blocking(move || {
        ctx.pipeline().predict_batch(&req.items, req.return_proba)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(PredictBatchResponse {
        predictions: result.labels,
        proba: result.probabilities,
        latency_ms: result.latency_ms,
    }))
}

// ── Middleware ─────────────────────────────────────────────────

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            tracing::debug!("rejected {} without a valid api key", request.uri().path());
            return Err(ApiError::unauthorized());
        }
    }
    Ok(next.run(request).await)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::debug!(
        "{method} {path} → {} in {:.2}ms",
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0,
    );
    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
