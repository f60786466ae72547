// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Plugin host: what a plugin may register while the server starts.

pub mod canvas;

use crate::app::AppState;
use crate::config::ServerConfig;
use crate::services::elasticsearch::EsClient;
use crate::services::usage::{UsageCollector, UsageCollectorSet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Plugin: Send + Sync {
    fn id(&self) -> &'static str;

    /// Register everything the plugin contributes to the server.
    async fn init(&self, host: &mut PluginHost) -> Result<()>;
}

/// Computes the variables injected into a UI application. Called on every
/// request so the values follow the current configuration.
pub type UiVarsProvider = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Clone, Default)]
pub struct UiExports {
    providers: HashMap<String, UiVarsProvider>,
}

impl UiExports {
    pub fn inject(&mut self, app: &str, provider: UiVarsProvider) {
        self.providers.insert(app.to_string(), provider);
    }

    pub fn vars(&self, app: &str) -> Option<Value> {
        self.providers.get(app).map(|provider| provider())
    }

    pub fn apps(&self) -> Vec<&str> {
        let mut apps: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        apps.sort_unstable();
        apps
    }
}

/// Everything plugins registered, ready to be moved into the app state.
pub struct PluginRegistrations {
    pub ui_exports: UiExports,
    pub usage: UsageCollectorSet,
    pub routes: Router<AppState>,
}

pub struct PluginHost {
    config: Arc<ServerConfig>,
    es: Arc<EsClient>,
    ui_exports: UiExports,
    usage: UsageCollectorSet,
    routes: Router<AppState>,
}

impl PluginHost {
    pub fn new(config: Arc<ServerConfig>, es: Arc<EsClient>) -> Self {
        Self {
            config,
            es,
            ui_exports: UiExports::default(),
            usage: UsageCollectorSet::default(),
            routes: Router::new(),
        }
    }

    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    pub fn es(&self) -> &Arc<EsClient> {
        &self.es
    }

    pub fn inject_ui_app_vars<F>(&mut self, app: &str, provider: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.ui_exports.inject(app, Arc::new(provider));
    }

    pub fn register_usage_collector(&mut self, collector: Arc<dyn UsageCollector>) {
        self.usage.register(collector);
    }

    /// Add plugin routes to the server router.
    pub fn route(&mut self, router: Router<AppState>) {
        let routes = std::mem::replace(&mut self.routes, Router::new());
        self.routes = routes.merge(router);
    }

    /// Run `init` of every plugin, in order.
    pub async fn init_plugins(&mut self, plugins: &[Arc<dyn Plugin>]) -> Result<()> {
        for plugin in plugins {
            plugin
                .init(self)
                .await
                .with_context(|| format!("Failed to initialize plugin {}", plugin.id()))?;
            tracing::info!(plugin = plugin.id(), "plugin initialized");
        }
        Ok(())
    }

    pub fn finish(self) -> PluginRegistrations {
        PluginRegistrations {
            ui_exports: self.ui_exports,
            usage: self.usage,
            routes: self.routes,
        }
    }
}
