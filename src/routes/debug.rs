//! Debug endpoints for development
//!
//! Only routed when MOCK_DEBUG=true. Read-only: inspecting a counter never
//! advances it.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Counter state of one endpoint
#[derive(Debug, Serialize)]
pub struct EndpointCounterInfo {
    pub name: String,
    pub methods: Vec<String>,
    pub cycle_length: u32,
    pub failures_per_cycle: u32,
    pub total_calls: u64,
    pub position: u32,
}

/// GET /debug/counters
pub async fn counters(State(state): State<Arc<AppState>>) -> Json<Vec<EndpointCounterInfo>> {
    let counters = state
        .registry
        .iter()
        .filter_map(|(id, endpoint)| {
            let snapshot = state.simulator.snapshot(id)?;
            Some(EndpointCounterInfo {
                name: endpoint.name.clone(),
                methods: endpoint.methods.iter().map(|m| m.to_string()).collect(),
                cycle_length: endpoint.ratio.cycle_length(),
                failures_per_cycle: endpoint.ratio.failures(),
                total_calls: snapshot.total_calls,
                position: snapshot.position,
            })
        })
        .collect();

    Json(counters)
}
