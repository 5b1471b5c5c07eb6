use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::error;

use inspecta_core::{InspectionDraft, InspectionRecord};
use inspecta_storage::Database;

use crate::error::ErrorResponse;
use crate::service::{InspectionService, RegisterError};
use crate::telemetry;

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    service: InspectionService,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database) -> Self {
        let clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> = Arc::new(Utc::now);
        let service = InspectionService::new(storage.clone(), clock);
        Self {
            metrics,
            storage,
            service,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn service(&self) -> &InspectionService {
        &self.service
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route(
            "/api/inspecciones",
            get(list_inspections).post(register_inspection),
        )
        .route("/api/inspecciones/:id", delete(delete_inspection))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}

async fn list_inspections(
    State(state): State<AppState>,
) -> Result<Json<Vec<InspectionRecord>>, ErrorResponse> {
    let inspections = state.service().list_all().await.map_err(|err| {
        counter!("api_inspections_requests_total", "op" => "list", "result" => "error")
            .increment(1);
        error!(stage = "api", %err, "failed to list inspections");
        ErrorResponse::internal()
    })?;

    counter!("api_inspections_requests_total", "op" => "list", "result" => "ok").increment(1);
    let records = inspections
        .iter()
        .map(|inspection| inspection.to_record())
        .collect();
    Ok(Json(records))
}

async fn register_inspection(
    State(state): State<AppState>,
    Json(draft): Json<InspectionDraft>,
) -> Result<(StatusCode, Json<InspectionRecord>), ErrorResponse> {
    let created = state.service().register(&draft).await.map_err(|err| match err {
        RegisterError::Validation(violation) => {
            counter!("api_inspections_requests_total", "op" => "register", "result" => "invalid")
                .increment(1);
            ErrorResponse::bad_request(violation.to_string())
        }
        RegisterError::Storage(cause) => {
            counter!("api_inspections_requests_total", "op" => "register", "result" => "error")
                .increment(1);
            error!(stage = "api", %cause, company_id = draft.company_id, "failed to register inspection");
            ErrorResponse::internal()
        }
    })?;

    counter!("api_inspections_requests_total", "op" => "register", "result" => "ok").increment(1);
    counter!("inspections_registered_total").increment(1);
    Ok((StatusCode::CREATED, Json(created.to_record())))
}

async fn delete_inspection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ErrorResponse> {
    let removed = state.service().delete(id).await.map_err(|err| {
        counter!("api_inspections_requests_total", "op" => "delete", "result" => "error")
            .increment(1);
        error!(stage = "api", %err, id, "failed to delete inspection");
        ErrorResponse::internal()
    })?;

    if removed {
        counter!("api_inspections_requests_total", "op" => "delete", "result" => "ok").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        counter!("api_inspections_requests_total", "op" => "delete", "result" => "missing")
            .increment(1);
        Err(ErrorResponse::not_found("inspection not found"))
    }
}
