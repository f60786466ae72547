// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Saved objects route handlers.

use crate::app::{AppState, SavedObjects};
use crate::errors::{ApiError, ErrorEnvelope};
use crate::models::saved_objects::{
    BulkCreateObject, BulkCreateOptions, BulkCreateQuery, BulkCreateResponse,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    routing::post,
    Json, Router,
};
use validator::Validate;

pub fn saved_objects_router() -> Router<AppState> {
    Router::new().route("/_bulk_create", post(bulk_create_handler))
}

/// POST /api/saved_objects/_bulk_create - Create several saved objects at once.
#[utoipa::path(
    post,
    path = "/api/saved_objects/_bulk_create",
    tag = "saved_objects",
    params(BulkCreateQuery),
    request_body = Vec<BulkCreateObject>,
    responses(
        (status = 200, body = BulkCreateResponse),
        (status = 400, body = ErrorEnvelope)
    )
)]
pub async fn bulk_create_handler(
    SavedObjects(client): SavedObjects,
    query: Result<Query<BulkCreateQuery>, QueryRejection>,
    payload: Result<Json<Vec<BulkCreateObject>>, JsonRejection>,
) -> Result<Json<BulkCreateResponse>, ApiError> {
    let Query(query) = query?;
    let Json(objects) = payload?;

    for (position, object) in objects.iter().enumerate() {
        object
            .validate()
            .map_err(|e| ApiError::BadRequest(format!("[{position}] {e}")))?;
    }

    client
        .bulk_create(
            objects,
            BulkCreateOptions {
                overwrite: query.overwrite,
            },
        )
        .await
        .map(Json)
}
