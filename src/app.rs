// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, request pre-handlers, server-level route handlers and
//! router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::config::ServerConfig;
use crate::errors::{ApiError, ErrorEnvelope};
use crate::models::role::RolePayload;
use crate::models::saved_objects::{BulkCreateObject, BulkCreateResponse};
use crate::models::usage::{KibanaIdentity, StatsQuery, StatsResponse};
use crate::models::version::VersionResponse;
use crate::plugins::{PluginRegistrations, UiExports};
use crate::routes::{saved_objects_router, security_router};
use crate::services::license::LicenseService;
use crate::services::saved_objects::SavedObjectsClient;
use crate::services::security::{RoleService, SecurityApi};
use crate::services::usage::UsageCollectorSet;
use axum::{
    extract::{rejection::QueryRejection, FromRequestParts, Path, Query, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `KBN_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("KBN_VERSION");

pub const SERVER_NAME: &str = "kbn-server";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub saved_objects: Arc<dyn SavedObjectsClient>,
    pub roles: Arc<RoleService>,
    pub license: Arc<LicenseService>,
    pub usage: Arc<UsageCollectorSet>,
    pub ui_exports: Arc<UiExports>,
}

impl AppState {
    pub fn new(
        config: Arc<ServerConfig>,
        saved_objects: Arc<dyn SavedObjectsClient>,
        security: Arc<dyn SecurityApi>,
        license: Arc<LicenseService>,
        registrations: &PluginRegistrations,
    ) -> Self {
        let roles = Arc::new(RoleService::new(security, config.security_application()));
        Self {
            config,
            saved_objects,
            roles,
            license,
            usage: Arc::new(registrations.usage.clone()),
            ui_exports: Arc::new(registrations.ui_exports.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pre-handlers
// ---------------------------------------------------------------------------

/// Axum extractor handing the saved objects client to a route handler.
pub struct SavedObjects(pub Arc<dyn SavedObjectsClient>);

impl FromRequestParts<AppState> for SavedObjects {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(SavedObjects(state.saved_objects.clone()))
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status - Server name and version.
#[utoipa::path(get, path = "/api/status", tag = "server", responses((status = 200, body = VersionResponse)))]
pub async fn version_handler(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        name: SERVER_NAME.to_string(),
        version: VERSION.to_string(),
        base_path: state.config.base_path.clone(),
    })
}

/// GET /api/stats - Server identity, plus plugin usage when `extended` is set.
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "server",
    params(StatsQuery),
    responses((status = 200, body = StatsResponse), (status = 400, body = ErrorEnvelope))
)]
pub async fn stats_handler(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<StatsResponse>, ApiError> {
    let Query(query) = query?;

    let usage = if query.extended {
        Some(state.usage.bulk_fetch().await)
    } else {
        None
    };

    Ok(Json(StatsResponse {
        kibana: KibanaIdentity {
            index: state.config.kibana_index.clone(),
            version: VERSION.to_string(),
            name: SERVER_NAME.to_string(),
        },
        usage,
    }))
}

/// GET /api/apps/{app}/injected_vars - Variables injected into a UI application.
#[utoipa::path(
    get,
    path = "/api/apps/{app}/injected_vars",
    tag = "server",
    params(("app" = String, Path, description = "UI application id")),
    responses((status = 200, body = Object), (status = 404, body = ErrorEnvelope))
)]
pub async fn injected_vars_handler(
    State(state): State<AppState>,
    Path(app): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .ui_exports
        .vars(&app)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown application: {app}")))
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        version_handler,
        stats_handler,
        injected_vars_handler,
        crate::routes::saved_objects::bulk_create_handler,
        crate::routes::security::put_role_handler,
        crate::plugins::canvas::list_functions_handler,
    ),
    components(schemas(ErrorEnvelope, RolePayload, BulkCreateObject, BulkCreateResponse))
)]
pub struct ApiDoc;

/// Build the Axum application router from the shared state and the routes
/// plugins registered during startup.
pub fn create_router(state: AppState, plugin_routes: Router<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(version_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/apps/{app}/injected_vars", get(injected_vars_handler))
        .nest("/api/saved_objects", saved_objects_router())
        .nest("/api/security", security_router())
        .merge(plugin_routes)
        .fallback(not_found_handler)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
