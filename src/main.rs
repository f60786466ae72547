// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use kbn_server::app::{create_router, AppState, VERSION};
use kbn_server::config::ServerConfig;
use kbn_server::plugins::canvas::CanvasPlugin;
use kbn_server::plugins::{Plugin, PluginHost};
use kbn_server::services::elasticsearch::EsClient;
use kbn_server::services::license::LicenseService;
use kbn_server::services::saved_objects::EsSavedObjectsRepository;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine outside local development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(ServerConfig::from_env()?);
    tracing::info!(
        elasticsearch = %config.elasticsearch.url,
        index = %config.kibana_index,
        "configuration loaded"
    );

    let es = Arc::new(
        EsClient::new(&config.elasticsearch).context("Failed to create Elasticsearch client")?,
    );

    let license = Arc::new(LicenseService::new(es.clone()));
    let initial = license.refresh().await;
    tracing::info!(license = ?initial, "initial security license");
    let poller = license.clone().start_polling(config.license_poll_interval);

    let mut host = PluginHost::new(config.clone(), es.clone());
    let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(CanvasPlugin)];
    host.init_plugins(&plugins).await?;
    let registrations = host.finish();
    tracing::info!(apps = ?registrations.ui_exports.apps(), "plugins initialized");

    let saved_objects = Arc::new(EsSavedObjectsRepository::new(
        es.clone(),
        config.kibana_index.clone(),
    ));
    let state = AppState::new(
        config.clone(),
        saved_objects,
        es,
        license,
        &registrations,
    );
    let app = create_router(state, registrations.routes);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("kbn-server v{} listening on {}", VERSION, addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let result = axum::serve(listener, app).await.context("Server error");
    poller.abort();
    result
}
