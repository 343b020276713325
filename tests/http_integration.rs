use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use factory_events_service::clock::ManualClock;
use factory_events_service::http::extractors::RequestId;
use factory_events_service::http::handlers::{
    get_machine_stats, get_top_defect_lines, healthz, metrics, post_batch, HttpState,
};
use factory_events_service::http::routes::build_router;
use factory_events_service::http::types::{
    EventBatchIn, MachineStatsQuery, RawEventIn, TopDefectLinesQuery,
};
use factory_events_service::service::{
    IngestService, LineStatsService, MachineStatsService, ResolverStrategy,
};
use factory_events_service::store::EventStore;
use factory_events_service::telemetry::Telemetry;

use axum::body::to_bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

fn build_state() -> (Arc<HttpState>, Arc<ManualClock>) {
    let store = EventStore::new();
    let telemetry = Telemetry::new();
    let clock = Arc::new(ManualClock::new(base_time()));
    let ingest = IngestService::new(
        ResolverStrategy::Upsert.build(store.clone()),
        clock.clone(),
        telemetry.clone(),
    );
    let state = Arc::new(HttpState {
        ingest,
        machine_stats: MachineStatsService::new(store.clone()),
        line_stats: LineStatsService::new(store),
        telemetry,
    });
    (state, clock)
}

fn raw_event(event_id: &str, line_id: &str, defect_count: i32) -> RawEventIn {
    RawEventIn {
        event_id: event_id.to_string(),
        event_time: base_time() - Duration::hours(1),
        machine_id: "M1".to_string(),
        factory_id: "F-1".to_string(),
        line_id: line_id.to_string(),
        duration_ms: 1000,
        defect_count,
    }
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), 65_536).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn batch_round_trip_through_handlers() {
    let (state, clock) = build_state();

    // the router builds; handlers are exercised directly below, which keeps
    // the test free of a live listener
    let _app = build_router(state.clone());

    let batch = EventBatchIn {
        events: vec![
            raw_event("E-1", "L-1", 5),
            raw_event("E-1", "L-1", 5), // intra-batch duplicate
            raw_event("E-2", "L-2", 7),
        ],
    };

    let resp = post_batch(
        State(state.clone()),
        RequestId("itest".to_string()),
        Json(batch.clone()),
    )
    .await
    .into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["accepted"], json!(2));
    assert_eq!(body["deduped"], json!(0));
    assert_eq!(body["rejected"], json!(0));

    // identical re-post later is fully deduped
    clock.advance(Duration::seconds(10));
    let resp = post_batch(
        State(state.clone()),
        RequestId("itest".to_string()),
        Json(batch),
    )
    .await
    .into_response();
    let body = body_json(resp).await;
    assert_eq!(body["accepted"], json!(0));
    assert_eq!(body["deduped"], json!(2));

    // rejections are itemized with their reason
    let mut too_long = raw_event("E-3", "L-1", 0);
    too_long.duration_ms = 7 * 60 * 60 * 1000;
    let resp = post_batch(
        State(state.clone()),
        RequestId("itest".to_string()),
        Json(EventBatchIn { events: vec![too_long] }),
    )
    .await
    .into_response();
    let body = body_json(resp).await;
    assert_eq!(body["rejected"], json!(1));
    assert_eq!(body["rejections"][0]["eventId"], json!("E-3"));
    assert_eq!(body["rejections"][0]["reason"], json!("INVALID_DURATION"));
}

#[tokio::test]
async fn stats_endpoints_serve_aggregates() {
    let (state, _clock) = build_state();

    let batch = EventBatchIn {
        events: vec![
            raw_event("E-1", "L-1", 5),
            raw_event("E-2", "L-1", 3),
            raw_event("E-3", "L-2", 7),
        ],
    };
    post_batch(State(state.clone()), RequestId("seed".to_string()), Json(batch))
        .await
        .into_response();

    let start = base_time() - Duration::hours(10);
    let end = base_time();

    let resp = get_machine_stats(
        State(state.clone()),
        Query(MachineStatsQuery {
            machine_id: "M1".to_string(),
            start,
            end,
        }),
    )
    .await
    .into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["machineId"], json!("M1"));
    assert_eq!(body["eventsCount"], json!(3));
    assert_eq!(body["defectsCount"], json!(15));
    assert_eq!(body["avgDefectRate"], json!(1.5));
    assert_eq!(body["status"], json!("HEALTHY"));

    let resp = get_top_defect_lines(
        State(state.clone()),
        Query(TopDefectLinesQuery {
            factory_id: "F-1".to_string(),
            start,
            end,
            limit: 10,
        }),
    )
    .await
    .into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let lines = body["defectLines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["lineId"], json!("L-1"));
    assert_eq!(lines[0]["totalDefects"], json!(8));
    assert_eq!(lines[0]["eventCount"], json!(2));
    assert_eq!(lines[0]["defectsPercent"], json!(400.0));
    assert_eq!(lines[1]["lineId"], json!("L-2"));
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let (state, _clock) = build_state();

    post_batch(
        State(state.clone()),
        RequestId("seed".to_string()),
        Json(EventBatchIn {
            events: vec![raw_event("E-1", "L-1", 0)],
        }),
    )
    .await
    .into_response();

    let resp = healthz().await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = metrics(State(state)).await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 65_536).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("events_accepted_total 1"));
    assert!(text.contains("batches_ingested_total 1"));
}
