// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Saved objects client and its Elasticsearch backed repository.

use crate::errors::{wrap_error, ApiError};
use crate::models::saved_objects::{
    BulkCreateObject, BulkCreateOptions, BulkCreateResponse, SavedObject, SavedObjectError,
};
use crate::services::elasticsearch::EsClient;
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

const VERSION_CONFLICT: &str = "version_conflict_engine_exception";

#[async_trait]
pub trait SavedObjectsClient: Send + Sync {
    /// Persist several objects in one round trip. Objects that already
    /// exist are reported with a 409 error unless `overwrite` is set.
    async fn bulk_create(
        &self,
        objects: Vec<BulkCreateObject>,
        options: BulkCreateOptions,
    ) -> Result<BulkCreateResponse, ApiError>;
}

/// Document id used in the index for an object.
pub fn raw_document_id(object_type: &str, id: &str) -> String {
    format!("{object_type}:{id}")
}

/// Saved objects stored as documents of the Kibana index.
pub struct EsSavedObjectsRepository {
    es: Arc<EsClient>,
    index: String,
}

impl EsSavedObjectsRepository {
    pub fn new(es: Arc<EsClient>, index: String) -> Self {
        Self { es, index }
    }
}

/// An object ready to be written, with its id resolved.
struct PreparedObject {
    id: String,
    object: BulkCreateObject,
}

/// Build the action and source lines of one object.
fn bulk_lines(prepared: &PreparedObject, overwrite: bool, updated_at: &str) -> [Value; 2] {
    let PreparedObject { id, object } = prepared;

    let method = if object.id.is_some() && !overwrite {
        "create"
    } else {
        "index"
    };
    let mut meta = Map::new();
    meta.insert(
        "_id".to_string(),
        Value::String(raw_document_id(&object.object_type, id)),
    );
    let mut action = Map::new();
    action.insert(method.to_string(), Value::Object(meta));

    let mut source = Map::new();
    source.insert("type".to_string(), Value::String(object.object_type.clone()));
    source.insert(
        object.object_type.clone(),
        Value::Object(object.attributes.clone()),
    );
    if let Some(migration_version) = &object.migration_version {
        source.insert(
            "migrationVersion".to_string(),
            Value::Object(migration_version.clone()),
        );
    }
    source.insert("updated_at".to_string(), Value::String(updated_at.to_string()));

    [Value::Object(action), Value::Object(source)]
}

/// Map one `items[]` entry of a bulk response back to a saved object.
fn bulk_item_result(
    item: &Value,
    prepared: PreparedObject,
    updated_at: &str,
) -> Result<SavedObject, ApiError> {
    let result = item
        .as_object()
        .and_then(|actions| actions.values().next())
        .ok_or_else(|| ApiError::Internal(format!("malformed bulk item: {item}")))?;

    let PreparedObject { id, object } = prepared;

    if let Some(error) = result.get("error") {
        if error.get("type").and_then(Value::as_str) == Some(VERSION_CONFLICT) {
            return Ok(SavedObject {
                id,
                object_type: object.object_type,
                version: None,
                updated_at: None,
                attributes: None,
                migration_version: None,
                error: Some(SavedObjectError {
                    status_code: StatusCode::CONFLICT.as_u16(),
                    message: "version conflict, document already exists".to_string(),
                }),
            });
        }

        let status = result
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let reason = error
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("bulk item failed")
            .to_string();
        return Err(ApiError::Remote {
            status,
            message: reason,
        });
    }

    Ok(SavedObject {
        id,
        object_type: object.object_type,
        version: result.get("_version").and_then(Value::as_u64),
        updated_at: Some(updated_at.to_string()),
        attributes: Some(object.attributes),
        migration_version: object.migration_version,
        error: None,
    })
}

#[async_trait]
impl SavedObjectsClient for EsSavedObjectsRepository {
    async fn bulk_create(
        &self,
        objects: Vec<BulkCreateObject>,
        options: BulkCreateOptions,
    ) -> Result<BulkCreateResponse, ApiError> {
        if objects.is_empty() {
            return Ok(BulkCreateResponse {
                saved_objects: Vec::new(),
            });
        }

        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let prepared: Vec<PreparedObject> = objects
            .into_iter()
            .map(|object| PreparedObject {
                id: object
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::now_v7().to_string()),
                object,
            })
            .collect();

        let lines: Vec<Value> = prepared
            .iter()
            .flat_map(|p| bulk_lines(p, options.overwrite, &updated_at))
            .collect();

        let response = self
            .es
            .bulk(&self.index, &lines, "wait_for")
            .await
            .map_err(wrap_error)?;

        let items = response
            .get("items")
            .and_then(Value::as_array)
            .filter(|items| items.len() == prepared.len())
            .ok_or_else(|| {
                ApiError::Internal("bulk response does not match the request".to_string())
            })?;

        let saved_objects = items
            .iter()
            .zip(prepared)
            .map(|(item, prepared)| bulk_item_result(item, prepared, &updated_at))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            count = saved_objects.len(),
            overwrite = options.overwrite,
            "saved objects bulk created"
        );

        Ok(BulkCreateResponse { saved_objects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(id: Option<&str>) -> BulkCreateObject {
        serde_json::from_value(json!({
            "type": "dashboard",
            "id": id,
            "attributes": {"title": "Overview"},
        }))
        .unwrap()
    }

    fn prepare(object: BulkCreateObject) -> PreparedObject {
        PreparedObject {
            id: object.id.clone().unwrap_or_else(|| "generated".to_string()),
            object,
        }
    }

    #[test]
    fn test_raw_document_id() {
        assert_eq!(raw_document_id("dashboard", "abc"), "dashboard:abc");
    }

    #[test]
    fn test_explicit_id_without_overwrite_uses_create() {
        let [action, source] = bulk_lines(&prepare(object(Some("abc"))), false, "t");
        assert_eq!(action, json!({"create": {"_id": "dashboard:abc"}}));
        assert_eq!(
            source,
            json!({"type": "dashboard", "dashboard": {"title": "Overview"}, "updated_at": "t"})
        );
    }

    #[test]
    fn test_overwrite_uses_index() {
        let [action, _] = bulk_lines(&prepare(object(Some("abc"))), true, "t");
        assert_eq!(action, json!({"index": {"_id": "dashboard:abc"}}));
    }

    #[test]
    fn test_generated_id_uses_index() {
        let [action, _] = bulk_lines(&prepare(object(None)), false, "t");
        assert_eq!(action, json!({"index": {"_id": "dashboard:generated"}}));
    }

    #[test]
    fn test_version_conflict_becomes_409_entry() {
        let item = json!({"create": {
            "_id": "dashboard:abc",
            "status": 409,
            "error": {"type": "version_conflict_engine_exception", "reason": "exists"}
        }});
        let saved = bulk_item_result(&item, prepare(object(Some("abc"))), "t").unwrap();
        assert_eq!(saved.error.unwrap().status_code, 409);
        assert!(saved.attributes.is_none());
    }

    #[test]
    fn test_other_item_errors_fail_the_request() {
        let item = json!({"index": {
            "status": 400,
            "error": {"type": "mapper_parsing_exception", "reason": "failed to parse"}
        }});
        let err = bulk_item_result(&item, prepare(object(None)), "t").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "failed to parse");
    }

    #[test]
    fn test_successful_item_carries_version() {
        let item = json!({"index": {"_id": "dashboard:abc", "_version": 3, "status": 200}});
        let saved = bulk_item_result(&item, prepare(object(Some("abc"))), "t").unwrap();
        assert_eq!(saved.version, Some(3));
        assert_eq!(saved.updated_at.as_deref(), Some("t"));
        assert_eq!(saved.id, "abc");
    }
}
