/**
 * Resource Routes
 * One CRUD handler set per document collection
 */
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::{models::Resource, repository::Repository};
use crate::error::{respond, ApiError};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// `?id=` addressing on the collection path.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// An id that is not a UUID names no document.
fn parse_id<R: Resource>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound(R::NAME))
}

fn required_query_id<R: Resource>(query: IdQuery) -> Result<Uuid, ApiError> {
    match query.id {
        Some(raw) => parse_id::<R>(&raw),
        None => Err(ApiError::BadRequest("Missing id parameter".to_string())),
    }
}

fn repository<R: Resource>(state: &AppState) -> Repository<'_, R> {
    Repository::new(&state.store, &state.config.image_hosts)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload?;
    Ok(value)
}

/// Register the collection and item routes of `R` under `/api/{collection}`.
pub fn register<R: Resource>(router: Router<AppState>) -> Router<AppState> {
    let collection = format!("/api/{}", R::COLLECTION);
    let item = format!("/api/{}/{{id}}", R::COLLECTION);

    router
        .route(
            &collection,
            get(list_or_get::<R>)
                .post(create::<R>)
                .put(update_by_query::<R>)
                .delete(delete_by_query::<R>),
        )
        .route(
            &item,
            get(get_one::<R>).put(update::<R>).delete(delete::<R>),
        )
}

async fn fetch<R: Resource>(state: &AppState, id: Uuid) -> Result<Response, ApiError> {
    match repository::<R>(state).find(id).await? {
        Some(record) => Ok(respond(StatusCode::OK, record)),
        None => Err(ApiError::NotFound(R::NAME)),
    }
}

async fn apply_update<R: Resource>(
    state: &AppState,
    id: Uuid,
    patch: Value,
) -> Result<Response, ApiError> {
    match repository::<R>(state).update(id, patch).await? {
        Some(record) => Ok(respond(StatusCode::OK, record)),
        None => Err(ApiError::NotFound(R::NAME)),
    }
}

async fn remove<R: Resource>(state: &AppState, id: Uuid) -> Result<Response, ApiError> {
    if repository::<R>(state).delete(id).await? {
        Ok(respond(StatusCode::OK, serde_json::json!({})))
    } else {
        Err(ApiError::NotFound(R::NAME))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/{collection} - every document, or one with `?id=`
pub async fn list_or_get<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = query.id {
        return fetch::<R>(&state, parse_id::<R>(&raw)?).await;
    }

    let records = repository::<R>(&state).list().await?;
    Ok(respond(StatusCode::OK, records))
}

/// GET /api/{collection}/{id}
pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    fetch::<R>(&state, parse_id::<R>(&id)?).await
}

/// POST /api/{collection} (auth required)
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<R::Draft>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.auth.require_admin(&headers)?;
    let draft = body(payload)?;

    let record = repository::<R>(&state).create(draft).await?;
    Ok(respond(StatusCode::CREATED, record))
}

/// PUT /api/{collection}?id= (auth required)
pub async fn update_by_query<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.auth.require_admin(&headers)?;
    let id = required_query_id::<R>(query)?;
    apply_update::<R>(&state, id, body(payload)?).await
}

/// PUT /api/{collection}/{id} (auth required)
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.auth.require_admin(&headers)?;
    let id = parse_id::<R>(&id)?;
    apply_update::<R>(&state, id, body(payload)?).await
}

/// DELETE /api/{collection}?id= (auth required)
pub async fn delete_by_query<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Result<Response, ApiError> {
    state.auth.require_admin(&headers)?;
    remove::<R>(&state, required_query_id::<R>(query)?).await
}

/// DELETE /api/{collection}/{id} (auth required)
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.auth.require_admin(&headers)?;
    remove::<R>(&state, parse_id::<R>(&id)?).await
}
