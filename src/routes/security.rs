// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Role management route handlers.

use crate::app::AppState;
use crate::errors::{ApiError, ErrorEnvelope};
use crate::models::role::{RoleParams, RolePayload, KIBANA_PRIVILEGES};
use crate::services::security::validate_kibana_privileges;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::put,
    Json, Router,
};
use validator::Validate;

pub fn security_router() -> Router<AppState> {
    Router::new().route("/role/{name}", put(put_role_handler))
}

/// PUT /api/security/role/{name} - Create or update a role.
///
/// The request is validated completely before the license pre-check and
/// before anything is read from the cluster.
#[utoipa::path(
    put,
    path = "/api/security/role/{name}",
    tag = "security",
    params(("name" = String, Path, description = "Role name, 1 to 1024 characters")),
    request_body = RolePayload,
    responses(
        (status = 204, description = "Role saved"),
        (status = 400, body = ErrorEnvelope),
        (status = 403, body = ErrorEnvelope)
    )
)]
pub async fn put_role_handler(
    State(state): State<AppState>,
    params: Result<Path<RoleParams>, PathRejection>,
    payload: Result<Json<RolePayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(params) = params?;
    params.validate()?;

    let Json(payload) = payload?;
    validate_kibana_privileges(&payload, &KIBANA_PRIVILEGES)?;

    state.license.current().await.check()?;

    state.roles.put_role(&params.name, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
