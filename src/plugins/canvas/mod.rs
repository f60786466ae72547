// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Canvas plugin: UI variables, expression functions and usage statistics.

pub mod functions;
pub mod usage;

use crate::app::AppState;
use crate::models::canvas::{CanvasAppVars, FunctionDefinition};
use crate::plugins::{Plugin, PluginHost};
use anyhow::Result;
use async_trait::async_trait;
use axum::{routing::get, Json, Router};
use functions::{common_functions, server_functions, FunctionsRegistry};
use std::sync::Arc;
use usage::CanvasUsageCollector;

pub const CANVAS_APP: &str = "canvas";

#[derive(Default)]
pub struct CanvasPlugin;

#[async_trait]
impl Plugin for CanvasPlugin {
    fn id(&self) -> &'static str {
        CANVAS_APP
    }

    async fn init(&self, host: &mut PluginHost) -> Result<()> {
        let mut registry = FunctionsRegistry::default();

        // Common functions that use server side APIs are registered here
        for function in common_functions() {
            registry.register(function)?;
        }

        let config = host.config().clone();
        host.register_usage_collector(Arc::new(CanvasUsageCollector::new(
            host.es().clone(),
            config.kibana_index.clone(),
        )));

        // Routes and UI vars see the registry only once it is complete
        for function in server_functions() {
            registry.register(function)?;
        }
        let registry = Arc::new(registry);
        tracing::debug!(functions = registry.len(), "canvas function registry populated");

        let vars_registry = registry.clone();
        host.inject_ui_app_vars(CANVAS_APP, move || {
            let vars = CanvasAppVars {
                kbn_index: config.kibana_index.clone(),
                es_shard_timeout: config.elasticsearch.shard_timeout_ms,
                es_api_version: config.elasticsearch.api_version.clone(),
                server_functions: vars_registry.to_vec(),
                base_path: config.base_path.clone(),
                reporting_browser_type: config.reporting_browser_type.clone(),
            };
            serde_json::to_value(vars).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to serialize canvas app vars");
                serde_json::Value::Null
            })
        });

        host.route(canvas_routes(registry));
        Ok(())
    }
}

/// Serialized function registry
#[utoipa::path(
    get,
    path = "/api/canvas/functions",
    tag = "canvas",
    responses((status = 200, body = Vec<FunctionDefinition>))
)]
pub async fn list_functions_handler(registry: Arc<FunctionsRegistry>) -> Json<Vec<FunctionDefinition>> {
    Json(registry.to_vec())
}

fn canvas_routes(registry: Arc<FunctionsRegistry>) -> Router<AppState> {
    Router::new().route(
        "/api/canvas/functions",
        get(move || list_functions_handler(registry.clone())),
    )
}
