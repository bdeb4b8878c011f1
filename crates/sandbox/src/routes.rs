//! HTTP surface of the sandbox.

use crate::{BookOutcome, SandboxState};
use axum::{
    body::Bytes,
    extract::{Path as AxumPath, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use fhir::{Appointment, ServiceRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

#[derive(Serialize)]
struct Health {
    ok: bool,
    message: String,
}

/// Error body, matching what the booking client reads on failures.
#[derive(Serialize)]
struct Detail {
    detail: String,
}

type Failure = (StatusCode, Json<Detail>);

fn failure(status: StatusCode, detail: impl Into<String>) -> Failure {
    (
        status,
        Json(Detail {
            detail: detail.into(),
        }),
    )
}

fn internal(context: &str, err: impl std::fmt::Display) -> Failure {
    tracing::error!("{context}: {err}");
    failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
}

#[derive(Deserialize)]
struct IdentifierQuery {
    system: Option<String>,
    value: Option<String>,
}

/// Build the sandbox router over `state`.
pub fn router(state: SandboxState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/servicerequest", get(search_service_requests))
        .route("/servicerequest/:id", get(read_service_request))
        .route("/appointment", post(create_appointment))
        .route(
            "/appointment/service-request/:id",
            get(appointment_for_service_request),
        )
        .layer(middleware::from_fn_with_state(state.clone(), inject_latency))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn inject_latency(State(state): State<SandboxState>, request: Request, next: Next) -> Response {
    let latency = state.latency();
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    next.run(request).await
}

async fn health() -> Json<Health> {
    Json(Health {
        ok: true,
        message: "radbook sandbox is alive".into(),
    })
}

/// `GET /servicerequest/{id}`
#[axum::debug_handler]
async fn read_service_request(
    State(state): State<SandboxState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Value>, Failure> {
    let store = state.store().read().await;
    let request = store
        .service_request(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, format!("ServiceRequest/{id} not found")))?;

    ServiceRequest::to_value(request)
        .map(Json)
        .map_err(|e| internal("Render service request error", e))
}

/// `GET /servicerequest?system=..&value=..`: always an array, possibly empty.
#[axum::debug_handler]
async fn search_service_requests(
    State(state): State<SandboxState>,
    Query(query): Query<IdentifierQuery>,
) -> Result<Json<Value>, Failure> {
    let value = query
        .value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "query parameter 'value' is required"))?;

    let store = state.store().read().await;
    let matches = store
        .find_by_identifier(query.system.as_deref(), &value)
        .into_iter()
        .map(ServiceRequest::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| internal("Render service request error", e))?;

    Ok(Json(Value::Array(matches)))
}

/// `GET /appointment/service-request/{id}`
#[axum::debug_handler]
async fn appointment_for_service_request(
    State(state): State<SandboxState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Value>, Failure> {
    let appointment = state.appointment_for(&id).await.ok_or_else(|| {
        failure(
            StatusCode::NOT_FOUND,
            format!("no appointment for ServiceRequest/{id}"),
        )
    })?;

    Appointment::to_value(&appointment)
        .map(Json)
        .map_err(|e| internal("Render appointment error", e))
}

/// `POST /appointment`
///
/// The body is read raw so malformed JSON gets the same `{"detail": ..}` shape as a
/// semantically invalid appointment.
#[axum::debug_handler]
async fn create_appointment(
    State(state): State<SandboxState>,
    body: Bytes,
) -> Result<Response, Failure> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| failure(StatusCode::UNPROCESSABLE_ENTITY, format!("invalid JSON: {e}")))?;
    let appointment = Appointment::from_value(value)
        .map_err(|e| failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    if appointment.service_request_ids().next().is_none() {
        return Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "basedOn must reference a ServiceRequest",
        ));
    }

    let outcome = state
        .book(appointment)
        .await
        .map_err(|e| internal("Assign appointment id error", e))?;

    match outcome {
        BookOutcome::Created(created) => {
            let rendered = Appointment::to_value(&created)
                .map_err(|e| internal("Render appointment error", e))?;
            tracing::info!(
                appointment_id = ?created.id.as_ref().map(|id| id.as_str()),
                "appointment created"
            );
            Ok((StatusCode::CREATED, Json(rendered)).into_response())
        }
        BookOutcome::UnknownRequest(id) => Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("ServiceRequest/{id} does not exist"),
        )),
        BookOutcome::AlreadyBooked {
            request_id,
            appointment_id,
        } => Err(failure(
            StatusCode::CONFLICT,
            format!("ServiceRequest/{request_id} already has appointment {appointment_id}"),
        )),
    }
}
