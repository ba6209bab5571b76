use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use vitrina_core::{
    format_sidecar_stamp, now_utc, validate_modelo, Document, ValidationError, MSG_FALLBACK,
};
use vitrina_store_json::StorageError;

use crate::app::ServiceState;
use crate::middleware::RequestStamp;
use crate::report;

pub const MSG_BULK_REQUIRED: &str =
    "Se requiere 'fieldName' y 'newValue' en el cuerpo de la solicitud.";

/// Single translation point from handler failures to HTTP responses.
#[derive(Debug)]
pub enum ApiFailure {
    /// 400 with the canned message in `{"error": ...}`.
    Validation(String),
    /// 404 with an empty body.
    NotFound,
    /// 500; the cause goes to the operator console, never to the client.
    Storage(StorageError),
}

impl ApiFailure {
    fn invalid_body(rejection: &JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<ValidationError> for ApiFailure {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.message.to_string())
    }
}

impl From<StorageError> for ApiFailure {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Storage(err) => {
                tracing::error!(error = %err, "storage failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "error interno del servidor" })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    filter: Option<String>,
    value: Option<String>,
    // Raw string so a non-numeric limit is ignored instead of rejected.
    limit: Option<String>,
}

pub async fn list_modelos(
    State(state): State<ServiceState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Document>>, ApiFailure> {
    let mut records = state.store.load()?;

    if let (Some(field), Some(value)) = (&query.filter, &query.value) {
        records
            .retain(|record| record.get(field).and_then(Value::as_str) == Some(value.as_str()));
    }

    if let Some(limit) = query.limit.as_deref().and_then(|raw| raw.parse::<usize>().ok()) {
        if limit > 0 {
            records.truncate(limit);
        }
    }

    if let Err(err) = report::write_report(&records, &state.report_path) {
        tracing::error!(
            error = %err,
            path = %state.report_path.display(),
            "failed to export the model report"
        );
    }

    Ok(Json(records))
}

pub async fn create_modelo(
    State(state): State<ServiceState>,
    Extension(stamp): Extension<RequestStamp>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), ApiFailure> {
    let body = object_body(payload)?;
    let mut records = state.store.load()?;

    let mut record = body;
    record.insert("id".to_string(), json!(records.len() + 1));
    record.insert("ipAddress".to_string(), Value::String(stamp.ip_address));
    if let Some(created_at) = stamp.created_at {
        record.insert("createdAt".to_string(), Value::String(created_at));
    }

    validate_modelo(&record)?;

    records.push(record.clone());
    state.store.save(&records)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_modelo_by_patreon(
    State(state): State<ServiceState>,
    Path(patreon): Path<String>,
) -> Result<Json<Document>, ApiFailure> {
    let records = state.store.load()?;
    records
        .into_iter()
        .find(|record| record.get("Patreon").and_then(Value::as_str) == Some(patreon.as_str()))
        .map(Json)
        .ok_or(ApiFailure::NotFound)
}

pub async fn update_modelo_by_nombre(
    State(state): State<ServiceState>,
    Path(nombre): Path<String>,
    Extension(stamp): Extension<RequestStamp>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Document>, ApiFailure> {
    let body = object_body(payload)?;
    let mut records = state.store.load()?;

    // One position lookup; first match wins when names are duplicated.
    let index = records
        .iter()
        .position(|record| {
            record.get("Nombre_Modelo").and_then(Value::as_str) == Some(nombre.as_str())
        })
        .ok_or(ApiFailure::NotFound)?;

    let mut updated = records[index].clone();
    for (field, value) in body {
        updated.insert(field, value);
    }
    updated.insert("ipAddress".to_string(), Value::String(stamp.ip_address));
    if let Some(updated_at) = stamp.updated_at {
        updated.insert("updatedAt".to_string(), Value::String(updated_at));
    }

    validate_modelo(&updated)?;

    records[index] = updated.clone();
    state.store.save(&records)?;
    Ok(Json(updated))
}

pub async fn delete_modelo_by_id(
    State(state): State<ServiceState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Document>, ApiFailure> {
    let id = raw_id.parse::<u64>().map_err(|_| ApiFailure::NotFound)?;
    let mut records = state.store.load()?;

    let index = records
        .iter()
        .position(|record| record.get("id").and_then(Value::as_u64) == Some(id))
        .ok_or(ApiFailure::NotFound)?;

    let removed = records.remove(index);
    state.store.save(&records)?;
    Ok(Json(removed))
}

pub async fn bulk_update_field(
    State(state): State<ServiceState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<Document>>, ApiFailure> {
    let body = object_body(payload)?;

    let field = body
        .get("fieldName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty());
    let (Some(field), Some(value)) = (field, body.get("newValue")) else {
        return Err(ApiFailure::Validation(MSG_BULK_REQUIRED.to_string()));
    };

    let mut records = state.store.load()?;
    let stamp = format_sidecar_stamp(now_utc()).unwrap_or_default();

    for record in &mut records {
        record.insert(field.to_string(), value.clone());
        record.insert("updated_at".to_string(), Value::String(stamp.clone()));
        // Validation is advisory on this path: the write goes through even
        // when the mutated record no longer satisfies the schema.
        if let Err(err) = validate_modelo(record) {
            tracing::warn!(
                field = %err.field,
                "record fails schema validation after bulk update: {err}"
            );
        }
    }

    state.store.save(&records)?;
    Ok(Json(records))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn object_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Document, ApiFailure> {
    let Json(body) = payload.map_err(|rejection| ApiFailure::invalid_body(&rejection))?;
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiFailure::Validation(MSG_FALLBACK.to_string())),
    }
}
