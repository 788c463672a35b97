use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::cache::SnapshotCache;
use crate::db::{HistoryRecord, HistoryStore};
use crate::snapshot::Snapshot;

/// Everything the handlers share. Handlers only ever read already-captured
/// state; no request triggers a hardware capture.
pub struct AppContext {
    pub cache: Arc<SnapshotCache>,
    pub store: Arc<HistoryStore>,
}

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/all", get(get_all))
        .route("/history", get(get_history))
        .route("/button", get(get_buttons))
        .route("/relay", get(get_relay).post(post_relay))
        .route("/soil-moisture", get(get_soil_moisture))
        .route("/sunlight", get(get_sunlight))
        .route("/temperature-humidity", get(get_temperature_humidity))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn home() -> &'static str {
    "Hello"
}

async fn get_all(State(ctx): State<Arc<AppContext>>) -> Json<Snapshot> {
    Json(ctx.cache.read_all().await)
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    from_date: i64,
}

async fn get_history(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryRecord>>, (StatusCode, String)> {
    ctx.store.query_history(query.from_date).map(Json).map_err(|e| {
        log::error!("history query failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "history query failed".to_string(),
        )
    })
}

async fn get_buttons(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let snapshot = ctx.cache.read_all().await;
    Json(json!({
        "button1": snapshot.button1,
        "button2": snapshot.button2,
    }))
}

async fn get_relay(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let snapshot = ctx.cache.read_all().await;
    Json(json!({ "value": snapshot.relay }))
}

async fn post_relay(State(ctx): State<Arc<AppContext>>, Json(body): Json<Value>) -> Response {
    let Some(on) = body.get("value").and_then(Value::as_bool) else {
        return (StatusCode::BAD_REQUEST, "Invalid payload").into_response();
    };

    match ctx.cache.set_relay(on).await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            log::error!("relay command failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "relay command failed").into_response()
        }
    }
}

async fn get_soil_moisture(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let snapshot = ctx.cache.read_all().await;
    Json(json!({ "value": snapshot.soil_moisture }))
}

async fn get_sunlight(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let snapshot = ctx.cache.read_all().await;
    Json(json!({
        "visible": snapshot.visible,
        "IR": snapshot.infra_red,
        "UV": snapshot.ultra_violet,
    }))
}

async fn get_temperature_humidity(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let snapshot = ctx.cache.read_all().await;
    Json(json!({
        "temperature": snapshot.temperature,
        "soil_temperature": snapshot.soil_temperature,
        "humidity": snapshot.humidity,
    }))
}
