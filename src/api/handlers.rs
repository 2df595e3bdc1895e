use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Json},
    Json as RequestJson,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::logic::{export_csv, parse_rows, run_import, ImportReport};
use crate::model::{Draft, Entity, Id, MessageResponse};
use crate::store::traits::EntityStore;

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /
pub async fn banner() -> &'static str {
    "Ecommerce Demo API is running!"
}

/// Read the optional parent filter for `E` from the query string.
fn parent_filter<E: Entity>(params: &HashMap<String, String>) -> Result<Option<Id>, ApiError> {
    let Some(key) = E::FILTER_KEY else {
        return Ok(None);
    };
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid {}", key))),
    }
}

/// GET /api/{resource}
/// List every row, or only the rows whose filter key equals the query value
pub async fn list_records<E, S>(
    State(store): State<AppState<S>>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<E>>, ApiError>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    let Query(params) = params?;
    let parent = parent_filter::<E>(&params)?;
    let records = store.list(parent).await?;
    Ok(Json(records))
}

/// POST /api/{resource}
pub async fn create_record<E, S>(
    State(store): State<AppState<S>>,
    payload: Result<RequestJson<E::Draft>, JsonRejection>,
) -> Result<Json<E>, ApiError>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    let RequestJson(draft) = payload?;
    draft.validate_create()?;

    let record = store.create(draft).await?;
    log::info!("Created {} {}", E::NAME, record.id());
    Ok(Json(record))
}

/// PUT /api/{resource}/{id}
/// Replace every editable field of the row
pub async fn update_record<E, S>(
    State(store): State<AppState<S>>,
    id: Result<Path<Id>, PathRejection>,
    payload: Result<RequestJson<E::Draft>, JsonRejection>,
) -> Result<Json<E>, ApiError>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    let Path(id) = id?;
    let RequestJson(draft) = payload?;
    draft.validate_update()?;

    match store.update(id, draft).await? {
        Some(record) => {
            log::info!("Updated {} {}", E::NAME, id);
            Ok(Json(record))
        }
        None => Err(ApiError::NotFound(E::NAME)),
    }
}

/// DELETE /api/{resource}/{id}
pub async fn delete_record<E, S>(
    State(store): State<AppState<S>>,
    id: Result<Path<Id>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    let Path(id) = id?;
    if !store.delete(id).await? {
        return Err(ApiError::NotFound(E::NAME));
    }

    log::info!("Deleted {} {}", E::NAME, id);
    Ok(Json(MessageResponse::new(format!("{} deleted", E::NAME))))
}

/// GET /api/{resource}/export
/// Download every row as CSV with the entity's export columns
pub async fn export_records<E, S>(
    State(store): State<AppState<S>>,
) -> Result<impl IntoResponse, ApiError>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    let records = store.list(None).await?;
    let csv = export_csv(&records)?;
    let disposition = format!("attachment; filename=\"{}.csv\"", E::RESOURCE);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// POST /api/{resource}/import
/// Run the bulk import over a CSV body and report every row's outcome
pub async fn import_records<E, S>(
    State(store): State<AppState<S>>,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    let rows = parse_rows(&body[..])
        .map_err(|e| ApiError::BadRequest(format!("Import failed: {:#}", e)))?;

    let batch = run_import::<E, S>(store.as_ref(), &rows).await;
    Ok(Json(batch.report))
}
