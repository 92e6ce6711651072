/**
 * Site Routes
 * Static configuration the front end needs at render time
 */
use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;

use crate::error::respond;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Hosts remote images may be rendered from; empty means unrestricted.
    pub image_domains: Vec<String>,
}

/// GET /api/site-config
pub async fn site_config(State(state): State<AppState>) -> Response {
    respond(
        StatusCode::OK,
        SiteConfig {
            image_domains: state.config.image_hosts.hosts().to_vec(),
        },
    )
}
