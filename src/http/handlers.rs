use crate::http::extractors::RequestId;
use crate::http::types::{
    EventBatchIn, EventBatchOut, MachineStatsOut, MachineStatsQuery, TopDefectLinesOut,
    TopDefectLinesQuery,
};
use crate::service::{IngestService, LineStatsService, MachineStatsService};
use crate::telemetry::Telemetry;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

pub struct HttpState {
    pub ingest: IngestService,
    pub machine_stats: MachineStatsService,
    pub line_stats: LineStatsService,
    pub telemetry: Telemetry,
}

pub async fn post_batch(
    State(state): State<Arc<HttpState>>,
    request_id: RequestId,
    Json(body): Json<EventBatchIn>,
) -> impl IntoResponse {
    if body.events.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "details": ["events: must not be empty"],
            })),
        )
            .into_response();
    }

    let batch_size = body.events.len();
    let submissions = body.events.into_iter().map(|e| e.into_domain()).collect();

    match state.ingest.ingest(submissions).await {
        Ok(report) => {
            info!(
                request_id = %request_id,
                batch_size,
                accepted = report.counts.accepted,
                updated = report.counts.updated,
                deduped = report.counts.deduped,
                rejected = report.rejected(),
                "ingested batch"
            );
            (StatusCode::OK, Json(EventBatchOut::from(report))).into_response()
        }
        Err(err) => {
            error!(request_id = %request_id, %err, "batch ingestion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "INGESTION_FAILED"})),
            )
                .into_response()
        }
    }
}

pub async fn get_machine_stats(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<MachineStatsQuery>,
) -> impl IntoResponse {
    let stats = state
        .machine_stats
        .stats(&query.machine_id, query.start, query.end)
        .await;
    Json(MachineStatsOut::from(stats))
}

pub async fn get_top_defect_lines(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<TopDefectLinesQuery>,
) -> impl IntoResponse {
    if query.limit < 1 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "details": ["limit: must be positive"],
            })),
        )
            .into_response();
    }

    let lines = state
        .line_stats
        .top_defect_lines(&query.factory_id, query.start, query.end, query.limit as usize)
        .await;
    Json(TopDefectLinesOut::from(lines)).into_response()
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    (StatusCode::OK, state.telemetry.gather())
}
