/**
 * Listing Routes
 * Public pages grouped by category with a "load more" slice
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::content::grouping::{group_by, GroupedQuery};
use crate::db::models::{Blog, Category, Portfolio, Resource, Service};
use crate::db::repository::Repository;
use crate::error::{respond, ApiError};
use crate::state::AppState;

const UNCATEGORIZED: &str = "Uncategorized";

fn repository<R: Resource>(state: &AppState) -> Repository<'_, R> {
    Repository::new(&state.store, &state.config.image_hosts)
}

/// GET /api/blogs/grouped
pub async fn blogs_grouped(
    State(state): State<AppState>,
    Query(query): Query<GroupedQuery>,
) -> Result<Response, ApiError> {
    let blogs = repository::<Blog>(&state).list().await?;
    let buckets = group_by(blogs, |b| b.doc.article.category.clone(), query.visible());
    Ok(respond(StatusCode::OK, buckets))
}

/// GET /api/services/grouped
pub async fn services_grouped(
    State(state): State<AppState>,
    Query(query): Query<GroupedQuery>,
) -> Result<Response, ApiError> {
    let services = repository::<Service>(&state).list().await?;
    let buckets = group_by(services, |s| s.doc.article.category.clone(), query.visible());
    Ok(respond(StatusCode::OK, buckets))
}

/// GET /api/portfolios/grouped - buckets named after the referenced category
pub async fn portfolios_grouped(
    State(state): State<AppState>,
    Query(query): Query<GroupedQuery>,
) -> Result<Response, ApiError> {
    let names: HashMap<Uuid, String> = repository::<Category>(&state)
        .list()
        .await?
        .into_iter()
        .map(|c| (c.id, c.doc.name))
        .collect();

    let portfolios = repository::<Portfolio>(&state).list().await?;
    let buckets = group_by(
        portfolios,
        |p| {
            names
                .get(&p.doc.category)
                .cloned()
                .unwrap_or_else(|| UNCATEGORIZED.to_string())
        },
        query.visible(),
    );
    Ok(respond(StatusCode::OK, buckets))
}
