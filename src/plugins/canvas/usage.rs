// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Canvas usage statistics, computed over every stored workpad.

use crate::models::canvas::{
    CanvasUsage, ElementUsage, FunctionUsage, PageUsage, Spread, Workpad, WorkpadUsage,
    CANVAS_WORKPAD_TYPE,
};
use crate::services::elasticsearch::EsClient;
use crate::services::usage::UsageCollector;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::Arc;

/// Upper bound on the workpads read per collection.
const MAX_WORKPADS: usize = 10_000;

/// Names of the functions invoked by an expression, subexpressions included,
/// in the order they appear.
pub fn expression_functions(expression: &str) -> Vec<String> {
    let mut names = Vec::new();
    scan_expression(expression, &mut names);
    names
}

fn scan_expression(expression: &str, names: &mut Vec<String>) {
    let mut chars = expression.char_indices().peekable();
    // The first word after the start or after a pipe names a function
    let mut expect_name = true;

    while let Some((i, c)) = chars.next() {
        match c {
            '|' => expect_name = true,
            '"' | '\'' => {
                skip_quoted(&mut chars, c);
                expect_name = false;
            }
            '{' => {
                let end = matching_brace(&mut chars).unwrap_or(expression.len());
                scan_expression(&expression[i + 1..end], names);
                expect_name = false;
            }
            c if c.is_whitespace() => {}
            _ => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, d)) = chars.peek() {
                    if d.is_whitespace() || matches!(d, '|' | '{' | '}' | '=' | '"' | '\'') {
                        break;
                    }
                    end = j + d.len_utf8();
                    chars.next();
                }
                if expect_name && c != '=' && c != '}' {
                    names.push(expression[i..end].to_string());
                }
                expect_name = false;
            }
        }
    }
}

fn skip_quoted(chars: &mut Peekable<CharIndices>, quote: char) {
    while let Some((_, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            break;
        }
    }
}

/// Consume up to the brace closing an already opened one and return its index.
fn matching_brace(chars: &mut Peekable<CharIndices>) -> Option<usize> {
    let mut depth = 1usize;
    while let Some((j, c)) = chars.next() {
        match c {
            '"' | '\'' => skip_quoted(chars, c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}

fn spread(counts: &[usize]) -> Spread {
    if counts.is_empty() {
        return Spread {
            avg: 0.0,
            min: 0,
            max: 0,
        };
    }
    let total: usize = counts.iter().sum();
    Spread {
        avg: total as f64 / counts.len() as f64,
        min: counts.iter().copied().min().unwrap_or(0),
        max: counts.iter().copied().max().unwrap_or(0),
    }
}

/// Summarize a set of workpads, `None` when there are none.
pub fn summarize_workpads(workpads: &[Workpad]) -> Option<CanvasUsage> {
    if workpads.is_empty() {
        return None;
    }

    let pages_per_workpad: Vec<usize> = workpads.iter().map(|w| w.pages.len()).collect();
    let elements_per_page: Vec<usize> = workpads
        .iter()
        .flat_map(|w| w.pages.iter().map(|p| p.elements.len()))
        .collect();

    let element_functions: Vec<Vec<String>> = workpads
        .iter()
        .flat_map(|w| w.pages.iter())
        .flat_map(|p| p.elements.iter())
        .map(|e| expression_functions(&e.expression))
        .collect();
    let functions_per_element: Vec<usize> = element_functions.iter().map(Vec::len).collect();
    let in_use: BTreeSet<&str> = element_functions
        .iter()
        .flatten()
        .map(String::as_str)
        .collect();

    Some(CanvasUsage {
        workpads: WorkpadUsage {
            total: workpads.len(),
        },
        pages: PageUsage {
            total: pages_per_workpad.iter().sum(),
            per_workpad: spread(&pages_per_workpad),
        },
        elements: ElementUsage {
            total: elements_per_page.iter().sum(),
            per_page: spread(&elements_per_page),
        },
        functions: FunctionUsage {
            total: functions_per_element.iter().sum(),
            in_use: in_use.into_iter().map(str::to_string).collect(),
            per_element: spread(&functions_per_element),
        },
    })
}

/// Reads workpads from the Kibana index and reports them under `canvas`.
pub struct CanvasUsageCollector {
    es: Arc<EsClient>,
    index: String,
}

impl CanvasUsageCollector {
    pub fn new(es: Arc<EsClient>, index: String) -> Self {
        Self { es, index }
    }
}

#[async_trait]
impl UsageCollector for CanvasUsageCollector {
    fn collector_type(&self) -> &str {
        "canvas"
    }

    async fn fetch(&self) -> Result<Option<Value>> {
        let query = json!({
            "size": MAX_WORKPADS,
            "query": {"term": {"type": CANVAS_WORKPAD_TYPE}},
            "_source": [CANVAS_WORKPAD_TYPE],
        });
        let response = self
            .es
            .search(&self.index, &query)
            .await
            .context("Failed to search canvas workpads")?;

        let workpads: Vec<Workpad> = response
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit.pointer(&format!("/_source/{CANVAS_WORKPAD_TYPE}")))
                    .filter_map(|source| serde_json::from_value(source.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        summarize_workpads(&workpads)
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to serialize canvas usage")
    }
}
