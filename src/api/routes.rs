//! API route definitions.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::error::ApiError;
use super::state::AppState;
use crate::monitor::alert::{build_alert, Alert};
use crate::monitor::{scorer, MachineData, MachineStatus, MetricValues};
use crate::narrative::FacilityReport;
use crate::registry::{Machine, MachineType};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/machines", get(list_machines))
        .route("/machines/data/current", get(current_data))
        .route("/machines/{id}", get(get_machine))
        .route("/machines/{id}/data", get(machine_data))
        .route("/machines/{id}/status", get(machine_status))
        .route("/machines/{id}/analyze", post(analyze_machine))
        .route("/performance-report", post(performance_report))
}

/// Latest reading of one machine, joined with its identity.
#[derive(Debug, Serialize)]
pub struct MachineDataResponse {
    pub machine_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: MachineType,
    pub status: MachineStatus,
    pub data: MetricValues,
    pub anomaly_score: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

impl MachineDataResponse {
    fn new(machine: &Machine, data: MachineData) -> Self {
        Self {
            machine_id: machine.id.clone(),
            name: machine.name.clone(),
            machine_type: machine.machine_type,
            status: data.status,
            data: data.values,
            anomaly_score: data.anomaly_score,
            last_updated: data.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub machine_id: String,
    pub anomaly_score: f64,
    pub ai_analysis: Option<String>,
    pub alert_created: bool,
    pub alert: Option<Alert>,
}

fn lookup<'a>(state: &'a AppState, id: &str) -> Result<&'a Machine, ApiError> {
    state
        .registry
        .get(id)
        .ok_or_else(|| ApiError::MachineNotFound(id.to_string()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn list_machines(State(state): State<AppState>) -> Json<Vec<Machine>> {
    Json(state.registry.all().to_vec())
}

async fn get_machine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Machine>, ApiError> {
    lookup(&state, &id).cloned().map(Json)
}

async fn current_data(State(state): State<AppState>) -> Json<Vec<MachineDataResponse>> {
    let mut responses = Vec::with_capacity(state.registry.len());
    for machine in state.registry.all() {
        let data = state.monitor.sample(machine).await;
        responses.push(MachineDataResponse::new(machine, data));
    }
    Json(responses)
}

async fn machine_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MachineDataResponse>, ApiError> {
    let machine = lookup(&state, &id)?;
    let data = state.monitor.sample(machine).await;
    Ok(Json(MachineDataResponse::new(machine, data)))
}

async fn machine_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let machine = lookup(&state, &id)?;
    let status = state.monitor.store().status(&machine.id).await;
    Ok(Json(json!({ "machine_id": machine.id, "status": status })))
}

async fn analyze_machine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let machine = lookup(&state, &id)?;
    // Cloned out of the store so no lock is held across the narrative call.
    let data = state
        .monitor
        .store()
        .get(&machine.id)
        .await
        .ok_or_else(|| ApiError::NoData(machine.id.clone()))?;

    let score = data
        .anomaly_score
        .unwrap_or_else(|| scorer::anomaly_score(machine, &data));
    let ai_analysis = state.narrator.explain_anomaly(machine, &data, score).await;
    let alert = build_alert(machine, &data, score, ai_analysis.clone());

    if let Some(alert) = &alert {
        warn!(
            machine_id = %machine.id,
            severity = ?alert.severity,
            metric = %alert.metric,
            score,
            "{}", alert.message
        );
    }

    Ok(Json(AnalysisResponse {
        machine_id: machine.id.clone(),
        anomaly_score: score,
        ai_analysis,
        alert_created: alert.is_some(),
        alert,
    }))
}

async fn performance_report(State(state): State<AppState>) -> Json<FacilityReport> {
    let mut latest = state.monitor.store().snapshot().await;
    let readings: Vec<(Machine, MachineData)> = state
        .registry
        .all()
        .iter()
        .filter_map(|m| latest.remove(&m.id).map(|d| (m.clone(), d)))
        .collect();

    let report = state.narrator.performance_report(&readings).await;
    info!(machines = report.machine_count, source = ?report.source, "performance report served");
    Json(report)
}
