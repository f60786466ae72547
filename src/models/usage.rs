// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

/// Query string of `GET /api/stats`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Include the data gathered by the usage collectors
    #[serde(default)]
    pub extended: bool,
}

/// Identity of this server inside a stats response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KibanaIdentity {
    pub index: String,
    pub version: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub kibana: KibanaIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub usage: Option<Map<String, Value>>,
}
