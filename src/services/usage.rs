// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Usage collectors registered by plugins and reported through the stats API.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::sync::Arc;

#[async_trait]
pub trait UsageCollector: Send + Sync {
    /// Key the collected data is reported under.
    fn collector_type(&self) -> &str;

    /// Gather the usage data, `None` when there is nothing to report.
    async fn fetch(&self) -> Result<Option<Value>>;
}

#[derive(Clone, Default)]
pub struct UsageCollectorSet {
    collectors: Vec<Arc<dyn UsageCollector>>,
}

impl UsageCollectorSet {
    pub fn register(&mut self, collector: Arc<dyn UsageCollector>) {
        tracing::debug!(collector = collector.collector_type(), "usage collector registered");
        self.collectors.push(collector);
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Run every collector concurrently. A failing collector is logged and
    /// left out of the result.
    pub async fn bulk_fetch(&self) -> Map<String, Value> {
        let results = join_all(self.collectors.iter().map(|collector| async move {
            (collector.collector_type().to_string(), collector.fetch().await)
        }))
        .await;

        let mut usage = Map::new();
        for (collector_type, result) in results {
            match result {
                Ok(Some(data)) => {
                    usage.insert(collector_type, data);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(collector = %collector_type, error = %e, "usage collector failed");
                }
            }
        }
        usage
    }
}
