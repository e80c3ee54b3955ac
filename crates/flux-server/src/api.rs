use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use flux_metrics::MetricBatch;
use flux_rule::{NewMonitoringRule, RuleError, RuleUpdate};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AggregationQuery {
    pub namespace: String,
    pub name: String,
}

type ApiResponse = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, message: impl ToString) -> ApiResponse {
    (status, Json(json!({ "error": message.to_string() })))
}

fn rule_error_response(e: RuleError) -> ApiResponse {
    let status = match &e {
        RuleError::NotFound(_) => StatusCode::NOT_FOUND,
        RuleError::InvalidRule(_) => StatusCode::BAD_REQUEST,
        RuleError::Scheduler(_) => StatusCode::CONFLICT,
        RuleError::Evaluation { .. } | RuleError::Aggregate { .. } => StatusCode::BAD_GATEWAY,
    };
    error_response(status, e)
}

pub async fn publish_metrics(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<MetricBatch>,
) -> impl IntoResponse {
    let namespace = batch.namespace.clone();
    let count = batch.metrics.len();

    if let Err(e) = state.collector.publish_metrics(batch).await {
        tracing::error!("Failed to publish metrics for {}: {}", namespace, e);
        return error_response(StatusCode::BAD_GATEWAY, e);
    }

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "namespace": namespace,
            "metrics": count,
            "pending_batches": state.collector.pending_batches().await,
        })),
    )
}

pub async fn flush_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.collector.flush_all_metrics().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "flushed" }))),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e),
    }
}

pub async fn get_aggregation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregationQuery>,
) -> impl IntoResponse {
    match state
        .collector
        .get_metric_aggregation(&query.namespace, &query.name, None)
        .await
    {
        Some(aggregation) => (StatusCode::OK, Json(json!(aggregation))),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("No aggregation for {}/{}", query.namespace, query.name),
        ),
    }
}

pub async fn list_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rules = state.engine.get_rules().await;
    (StatusCode::OK, Json(json!({ "rules": rules })))
}

pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewMonitoringRule>,
) -> impl IntoResponse {
    tracing::info!("Creating rule: {}", req.name);

    match state.engine.add_rule(req).await {
        Ok(rule) => (StatusCode::CREATED, Json(json!(rule))),
        Err(e) => rule_error_response(e),
    }
}

pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<String>,
    Json(update): Json<RuleUpdate>,
) -> impl IntoResponse {
    match state.engine.update_rule(&rule_id, update).await {
        Ok(rule) => (StatusCode::OK, Json(json!(rule))),
        Err(e) => rule_error_response(e),
    }
}

pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<String>,
) -> impl IntoResponse {
    state.engine.remove_rule(&rule_id).await;
    StatusCode::NO_CONTENT
}

pub async fn evaluate_rule(
    State(state): State<Arc<AppState>>,
    Path(rule_id): Path<String>,
) -> impl IntoResponse {
    let Some(rule) = state.engine.get_rule(&rule_id).await else {
        return rule_error_response(RuleError::NotFound(rule_id));
    };

    match state.engine.evaluate_rule(&rule).await {
        Ok(alert) => (StatusCode::OK, Json(json!({ "alert": alert }))),
        Err(e) => rule_error_response(e),
    }
}

pub async fn evaluate_all_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.evaluate_all_rules().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "evaluated" }))),
        Err(e) => rule_error_response(e),
    }
}

pub async fn export_telemetry(State(state): State<Arc<AppState>>) -> Response {
    match state.telemetry.export() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(export_telemetry))
        .route("/api/v1/metrics", post(publish_metrics))
        .route("/api/v1/metrics/flush", post(flush_metrics))
        .route("/api/v1/metrics/aggregation", get(get_aggregation))
        .route("/api/v1/rules", post(create_rule).get(list_rules))
        .route("/api/v1/rules/evaluate", post(evaluate_all_rules))
        .route("/api/v1/rules/:rule_id", patch(update_rule).delete(delete_rule))
        .route("/api/v1/rules/:rule_id/evaluate", post(evaluate_rule))
        .with_state(state)
}
