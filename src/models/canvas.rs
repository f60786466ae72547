// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Saved object type of a Canvas workpad.
pub const CANVAS_WORKPAD_TYPE: &str = "canvas-workpad";

/// Variables injected into the Canvas UI application.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanvasAppVars {
    pub kbn_index: String,
    pub es_shard_timeout: u64,
    pub es_api_version: String,
    pub server_functions: Vec<FunctionDefinition>,
    pub base_path: String,
    pub reporting_browser_type: String,
}

/// Serializable description of an expression function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FunctionDefinition {
    pub name: String,
    pub help: String,
    /// Type of the value the function returns
    #[serde(rename = "type")]
    pub return_type: String,
    /// Types accepted as the piped-in context
    pub context: Vec<String>,
    pub args: Vec<FunctionArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FunctionArg {
    pub name: String,
    pub types: Vec<String>,
    #[serde(default)]
    pub multi: bool,
    pub help: String,
}

/// The parts of a stored workpad the usage collector looks at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workpad {
    #[serde(default)]
    pub pages: Vec<WorkpadPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkpadPage {
    #[serde(default)]
    pub elements: Vec<WorkpadElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkpadElement {
    #[serde(default)]
    pub expression: String,
}

/// Average, minimum and maximum of a per-item count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub avg: f64,
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkpadUsage {
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageUsage {
    pub total: usize,
    pub per_workpad: Spread,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementUsage {
    pub total: usize,
    pub per_page: Spread,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionUsage {
    pub total: usize,
    pub in_use: Vec<String>,
    pub per_element: Spread,
}

/// Usage block reported under the `canvas` key of the stats API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasUsage {
    pub workpads: WorkpadUsage,
    pub pages: PageUsage,
    pub elements: ElementUsage,
    pub functions: FunctionUsage,
}
