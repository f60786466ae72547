// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Registry of the expression functions Canvas can run on the server.

use crate::models::canvas::{FunctionArg, FunctionDefinition};
use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Default)]
pub struct FunctionsRegistry {
    functions: Vec<FunctionDefinition>,
}

impl FunctionsRegistry {
    /// Add a function. Names are unique.
    pub fn register(&mut self, function: FunctionDefinition) -> Result<()> {
        if self.get(&function.name).is_some() {
            return Err(anyhow!("Function '{}' is already registered", function.name));
        }
        self.functions.push(function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// All functions in registration order.
    pub fn to_vec(&self) -> Vec<FunctionDefinition> {
        self.functions.clone()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn arg(name: &str, types: &[&str], help: &str) -> FunctionArg {
    FunctionArg {
        name: name.to_string(),
        types: types.iter().map(|t| t.to_string()).collect(),
        multi: false,
        help: help.to_string(),
    }
}

fn multi(mut arg: FunctionArg) -> FunctionArg {
    arg.multi = true;
    arg
}

fn function(
    name: &str,
    help: &str,
    return_type: &str,
    context: &[&str],
    args: Vec<FunctionArg>,
) -> FunctionDefinition {
    FunctionDefinition {
        name: name.to_string(),
        help: help.to_string(),
        return_type: return_type.to_string(),
        context: context.iter().map(|t| t.to_string()).collect(),
        args,
    }
}

/// Functions shared with the browser that need server side APIs.
pub fn common_functions() -> Vec<FunctionDefinition> {
    vec![
        function(
            "filters",
            "Collect element filters on the workpad, usually to provide them to a data source",
            "filter",
            &["null"],
            vec![
                multi(arg("group", &["string"], "The name of the filter group to use")),
                arg(
                    "ungrouped",
                    &["boolean"],
                    "Exclude filters belonging to a filter group",
                ),
            ],
        ),
        function(
            "timelion",
            "Use timelion to extract one or more timeseries from many sources",
            "datatable",
            &["filter"],
            vec![
                arg("query", &["string"], "A timelion query"),
                arg("interval", &["string"], "Bucket interval for the time series"),
                arg("from", &["string"], "Elasticsearch date math string for the start"),
                arg("to", &["string"], "Elasticsearch date math string for the end"),
                arg("timezone", &["string"], "Timezone to use for the query"),
            ],
        ),
        function(
            "to",
            "Explicitly cast from one type to another",
            "*",
            &["*"],
            vec![multi(arg("type", &["string"], "A known type"))],
        ),
    ]
}

/// Data source functions that only run on the server.
pub fn server_functions() -> Vec<FunctionDefinition> {
    vec![
        function(
            "demodata",
            "A mock data set that includes project CI times with usernames, countries and run phases",
            "datatable",
            &["filter"],
            vec![arg("type", &["string"], "The name of the demo data set to use")],
        ),
        function(
            "escount",
            "Query elasticsearch for a count of the number of hits matching a query",
            "number",
            &["filter"],
            vec![
                arg("index", &["string", "null"], "Specify an index pattern"),
                arg("query", &["string"], "A Lucene query string"),
            ],
        ),
        function(
            "esdocs",
            "Query elasticsearch and get back raw documents",
            "datatable",
            &["filter"],
            vec![
                arg("index", &["string", "null"], "Specify an index pattern"),
                arg("query", &["string"], "A Lucene query string"),
                arg("sort", &["string", "null"], "Sort direction as \"field, direction\""),
                arg("fields", &["string", "null"], "Comma separated list of fields"),
                arg("metaFields", &["string", "null"], "Comma separated list of meta fields"),
                arg("count", &["number"], "The number of docs to pull back"),
            ],
        ),
        function(
            "essql",
            "Elasticsearch SQL",
            "datatable",
            &["filter"],
            vec![
                arg("query", &["string"], "SQL query"),
                arg("count", &["number"], "The number of rows to pull back"),
                arg("timezone", &["string"], "Timezone to use for date operations"),
            ],
        ),
        function(
            "pointseries",
            "Turn a datatable into a point series model",
            "pointseries",
            &["datatable"],
            ["x", "y", "color", "size", "text"]
                .iter()
                .map(|dim| arg(dim, &["string", "null"], "A math expression over the datatable columns"))
                .collect(),
        ),
    ]
}
