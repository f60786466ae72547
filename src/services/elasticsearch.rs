// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::config::ElasticsearchConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum EsError {
    #[error("Elasticsearch transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The cluster answered with a non-success status code.
    #[error("[{status}] {reason}")]
    Status {
        status: u16,
        reason: String,
        body: Value,
    },

    #[error("Invalid Elasticsearch URL: {0}")]
    Url(String),

    #[error("Unexpected Elasticsearch response: {0}")]
    Decode(String),
}

/// Thin client over the Elasticsearch REST API.
pub struct EsClient {
    http: reqwest::Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl EsClient {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self, EsError> {
        if config.url.cannot_be_a_base() {
            return Err(EsError::Url(config.url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        tracing::info!(url = %config.url, "Elasticsearch client configured");

        Ok(Self {
            http,
            base_url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Build a URL below the base URL. Each segment is percent-encoded.
    ///
    /// `.` and `..` are refused: URL parsing drops them even when encoded, so
    /// the request would silently reach the parent resource.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, EsError> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(EsError::Url(format!(
                "path segment '{segment}' cannot be addressed below {}",
                self.base_url
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EsError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_deref()),
            None => builder,
        }
    }

    /// Send a request and decode the JSON body. `ignore` lists status codes
    /// that are returned as `Ok(None)` instead of an error.
    async fn send(&self, builder: RequestBuilder, ignore: &[u16]) -> Result<Option<Value>, EsError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if ignore.contains(&status.as_u16()) {
            return Ok(None);
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| EsError::Decode(format!("{e} (status {status})")))?
        };

        if !status.is_success() {
            return Err(EsError::Status {
                status: status.as_u16(),
                reason: error_reason(status, &body),
                body,
            });
        }

        Ok(Some(body))
    }

    async fn send_required(&self, builder: RequestBuilder) -> Result<Value, EsError> {
        self.send(builder, &[])
            .await
            .map(|body| body.unwrap_or(Value::Null))
    }

    pub async fn get(&self, segments: &[&str], ignore: &[u16]) -> Result<Option<Value>, EsError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        self.send(self.request(Method::GET, url), ignore).await
    }

    pub async fn put(&self, segments: &[&str], body: &Value) -> Result<Value, EsError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "PUT");
        self.send_required(self.request(Method::PUT, url).json(body))
            .await
    }

    /// Run a `_bulk` request against `index`. Each element of `lines` becomes
    /// one line of the NDJSON body.
    pub async fn bulk(&self, index: &str, lines: &[Value], refresh: &str) -> Result<Value, EsError> {
        let mut url = self.endpoint(&[index, "_bulk"])?;
        url.query_pairs_mut().append_pair("refresh", refresh);

        let mut body = String::new();
        for line in lines {
            body.push_str(&line.to_string());
            body.push('\n');
        }

        tracing::debug!(%url, actions = lines.len() / 2, "bulk");
        self.send_required(
            self.request(Method::POST, url)
                .header(CONTENT_TYPE, "application/x-ndjson")
                .body(body),
        )
        .await
    }

    /// Run a search against `index`, treating a missing index as no hits.
    pub async fn search(&self, index: &str, body: &Value) -> Result<Value, EsError> {
        let url = self.endpoint(&[index, "_search"])?;
        tracing::debug!(%url, "search");
        let response = self
            .send(self.request(Method::POST, url).json(body), &[404])
            .await?;
        Ok(response.unwrap_or_else(|| serde_json::json!({"hits": {"total": 0, "hits": []}})))
    }

    /// Cluster license and feature information.
    pub async fn xpack_info(&self) -> Result<Value, EsError> {
        let url = self.endpoint(&["_xpack"])?;
        self.send_required(self.request(Method::GET, url)).await
    }
}

/// Pull a human readable reason out of an Elasticsearch error body.
fn error_reason(status: StatusCode, body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(reason)) => reason.clone(),
        Some(error) => error
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        None => status.canonical_reason().unwrap_or("Unknown Error").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use serde_json::json;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = EsClient::new(&test_config().elasticsearch).unwrap();
        let url = client.endpoint(&["_security", "role", "my role/1"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9200/_security/role/my%20role%2F1");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let mut config = test_config().elasticsearch;
        config.url = Url::parse("http://proxy.local/es/").unwrap();
        let client = EsClient::new(&config).unwrap();
        let url = client.endpoint(&["_xpack"]).unwrap();
        assert_eq!(url.as_str(), "http://proxy.local/es/_xpack");
    }

    #[test]
    fn test_endpoint_refuses_dot_segments() {
        let client = EsClient::new(&test_config().elasticsearch).unwrap();
        for name in [".", ".."] {
            let result = client.endpoint(&["_security", "role", name]);
            assert!(matches!(result, Err(EsError::Url(_))), "accepted {name:?}");
        }
        let url = client.endpoint(&["_security", "role", "..."]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9200/_security/role/...");
    }

    #[test]
    fn test_error_reason_from_structured_error() {
        let body = json!({"error": {"type": "security_exception", "reason": "action is unauthorized"}});
        assert_eq!(
            error_reason(StatusCode::FORBIDDEN, &body),
            "action is unauthorized"
        );
    }

    #[test]
    fn test_error_reason_falls_back_to_status() {
        assert_eq!(
            error_reason(StatusCode::SERVICE_UNAVAILABLE, &Value::Null),
            "Service Unavailable"
        );
    }
}
