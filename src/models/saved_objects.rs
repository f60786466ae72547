// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query string of `POST /api/saved_objects/_bulk_create`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BulkCreateQuery {
    /// Replace objects that already exist instead of reporting a conflict
    #[serde(default)]
    pub overwrite: bool,
}

/// Options forwarded to the saved objects client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkCreateOptions {
    pub overwrite: bool,
}

/// One object of a bulk create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BulkCreateObject {
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub id: Option<String>,
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub version: Option<Number>,
    #[serde(
        rename = "migrationVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<Object>)]
    pub migration_version: Option<Map<String, Value>>,
}

/// Error attached to an object that could not be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedObjectError {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
}

/// A saved object as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedObject {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Map<String, Value>>,
    #[serde(
        rename = "migrationVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<Object>)]
    pub migration_version: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SavedObjectError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BulkCreateResponse {
    pub saved_objects: Vec<SavedObject>,
}
