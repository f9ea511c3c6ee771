//! REST API route handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use nestwatch_core::{now_millis, STALENESS_WINDOW_MS};

use crate::web::AppState;

/// GET /api/violations — pilots seen violating the zone in the last 10
/// minutes, most recent first. Never errors; no data yields `[]`.
pub async fn api_violations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ledger = state.ledger.read().unwrap();
    let now = now_millis();

    let pilots: Vec<Value> = ledger
        .snapshot(STALENESS_WINDOW_MS, now)
        .iter()
        .map(|record| {
            json!({
                "pilotId": record.pilot_id,
                "name": record.name,
                "email": record.email,
                "phoneNumber": record.phone_number,
                "timestamp": record.last_seen_at,
                "drones": record.drone_ids,
                "minDistanceToNest": record.min_distance_to_nest,
            })
        })
        .collect();

    Json(json!(pilots))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
