// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Server configuration loaded from environment variables.

use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Settings for the Elasticsearch connection.
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `elasticsearch.shardTimeout` in milliseconds
    pub shard_timeout_ms: u64,
    pub request_timeout: Duration,
    /// `elasticsearch.apiVersion`
    pub api_version: String,
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `server.basePath`, empty when the server is mounted at the root
    pub base_path: String,
    /// `kibana.index`
    pub kibana_index: String,
    pub elasticsearch: ElasticsearchConfig,
    /// `xpack.reporting.capture.browser.type`
    pub reporting_browser_type: String,
    pub license_poll_interval: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let es_url = env_or("ELASTICSEARCH_URL", "http://localhost:9200");
        let url = Url::parse(&es_url)
            .map_err(|e| anyhow!("ELASTICSEARCH_URL is not a valid URL ({es_url}): {e}"))?;

        let base_path = env_or("SERVER_BASE_PATH", "");
        if !base_path.is_empty() && (!base_path.starts_with('/') || base_path.ends_with('/')) {
            return Err(anyhow!(
                "SERVER_BASE_PATH must start with a slash and must not end with one, got: {base_path}"
            ));
        }

        Ok(Self {
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: parse_env("SERVER_PORT", 5601)?,
            base_path,
            kibana_index: env_or("KIBANA_INDEX", ".kibana"),
            elasticsearch: ElasticsearchConfig {
                url,
                username: env::var("ELASTICSEARCH_USERNAME").ok(),
                password: env::var("ELASTICSEARCH_PASSWORD").ok(),
                shard_timeout_ms: parse_env("ELASTICSEARCH_SHARD_TIMEOUT", 30_000)?,
                request_timeout: Duration::from_millis(parse_env(
                    "ELASTICSEARCH_REQUEST_TIMEOUT",
                    30_000,
                )?),
                api_version: env_or("ELASTICSEARCH_API_VERSION", "master"),
            },
            reporting_browser_type: env_or("REPORTING_BROWSER_TYPE", "chromium"),
            license_poll_interval: Duration::from_millis(parse_env(
                "LICENSE_POLL_INTERVAL_MS",
                30_001,
            )?),
        })
    }

    /// Name of the Elasticsearch security application that owns this
    /// server's privileges.
    pub fn security_application(&self) -> String {
        format!("kibana-{}", self.kibana_index)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value ({raw}): {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 5601,
        base_path: "/kbn".to_string(),
        kibana_index: ".kibana".to_string(),
        elasticsearch: ElasticsearchConfig {
            url: Url::parse("http://127.0.0.1:9200").expect("static url"),
            username: None,
            password: None,
            shard_timeout_ms: 30_000,
            request_timeout: Duration::from_secs(30),
            api_version: "master".to_string(),
        },
        reporting_browser_type: "chromium".to_string(),
        license_poll_interval: Duration::from_millis(30_001),
    }
}
