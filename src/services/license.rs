// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Tracks whether the cluster license allows the security features.

use crate::errors::ApiError;
use crate::services::elasticsearch::{EsClient, EsError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Security feature state as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLicense {
    /// License information could not be fetched
    Unknown,
    /// The current license does not include security
    Unavailable,
    /// Security is available but switched off in the cluster
    Disabled,
    Enabled,
}

impl SecurityLicense {
    /// Read the `features.security` block of an `_xpack` info response.
    pub fn from_xpack_info(info: &Value) -> Self {
        let Some(security) = info.pointer("/features/security") else {
            return SecurityLicense::Unavailable;
        };
        let flag = |key: &str| security.get(key).and_then(Value::as_bool).unwrap_or(false);

        if !flag("available") {
            SecurityLicense::Unavailable
        } else if !flag("enabled") {
            SecurityLicense::Disabled
        } else {
            SecurityLicense::Enabled
        }
    }

    /// Route pre-check: only an enabled security feature lets the request through.
    pub fn check(&self) -> Result<(), ApiError> {
        match self {
            SecurityLicense::Enabled => Ok(()),
            SecurityLicense::Unknown => Err(ApiError::Forbidden(
                "License information could not be obtained from Elasticsearch. Please check the logs."
                    .to_string(),
            )),
            SecurityLicense::Unavailable => Err(ApiError::Forbidden(
                "Security is not available with the current license".to_string(),
            )),
            SecurityLicense::Disabled => Err(ApiError::Forbidden(
                "Security is disabled in Elasticsearch".to_string(),
            )),
        }
    }
}

#[async_trait]
pub trait LicenseSource: Send + Sync {
    async fn xpack_info(&self) -> Result<Value, EsError>;
}

#[async_trait]
impl LicenseSource for EsClient {
    async fn xpack_info(&self) -> Result<Value, EsError> {
        EsClient::xpack_info(self).await
    }
}

/// Holds the latest license snapshot and refreshes it in the background.
pub struct LicenseService {
    source: Arc<dyn LicenseSource>,
    state: RwLock<SecurityLicense>,
}

impl LicenseService {
    pub fn new(source: Arc<dyn LicenseSource>) -> Self {
        Self {
            source,
            state: RwLock::new(SecurityLicense::Unknown),
        }
    }

    /// A service whose state never changes. Used when no cluster is polled.
    pub fn fixed(state: SecurityLicense) -> Self {
        struct NoSource;

        #[async_trait]
        impl LicenseSource for NoSource {
            async fn xpack_info(&self) -> Result<Value, EsError> {
                Err(EsError::Decode("no license source".to_string()))
            }
        }

        Self {
            source: Arc::new(NoSource),
            state: RwLock::new(state),
        }
    }

    pub async fn current(&self) -> SecurityLicense {
        *self.state.read().await
    }

    /// Fetch license information once and store the result.
    pub async fn refresh(&self) -> SecurityLicense {
        let next = match self.source.xpack_info().await {
            Ok(info) => SecurityLicense::from_xpack_info(&info),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch license information");
                SecurityLicense::Unknown
            }
        };

        let mut state = self.state.write().await;
        if *state != next {
            tracing::info!(from = ?*state, to = ?next, "security license changed");
        }
        *state = next;
        next
    }

    /// Refresh the license every `interval` until the task is aborted.
    pub fn start_polling(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}
