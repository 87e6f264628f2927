// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Solidity parser collaborator seam.
//!
//! The pipeline only needs a contract name and a function list; full AST
//! parsing belongs to an external library. [`HeuristicParser`] covers that
//! contract with declaration scanning.

use regex::Regex;
use std::sync::OnceLock;

use gz_core::{FunctionSummary, Mutability, StaticProfile, Visibility};

/// Static-analysis collaborator: contract name plus declared functions.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<StaticProfile, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

fn contract_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // literal pattern
        let re = Regex::new(r"(?m)^\s*(?:abstract\s+)?contract\s+([A-Za-z_]\w*)").unwrap();
        re
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // literal pattern
        let re = Regex::new(r"function\s+([A-Za-z_]\w*)\s*\([^)]*\)([^{;]*)").unwrap();
        re
    })
}

/// Declaration-scanning parser.
#[derive(Default)]
pub struct HeuristicParser;

impl SourceParser for HeuristicParser {
    fn parse(&self, source: &str) -> Result<StaticProfile, ParseError> {
        let contract_name = contract_re()
            .captures(source)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ParseError("no contract declaration found".to_string()))?;

        let functions = function_re()
            .captures_iter(source)
            .map(|caps| {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();
                let modifiers = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                FunctionSummary {
                    name,
                    visibility: visibility_of(modifiers),
                    mutability: mutability_of(modifiers),
                }
            })
            .collect();

        Ok(StaticProfile { contract_name, functions })
    }
}

fn visibility_of(modifiers: &str) -> Visibility {
    if modifiers.contains("external") {
        Visibility::External
    } else if modifiers.contains("internal") {
        Visibility::Internal
    } else if modifiers.contains("private") {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

fn mutability_of(modifiers: &str) -> Mutability {
    if modifiers.contains("pure") {
        Mutability::Pure
    } else if modifiers.contains("view") {
        Mutability::View
    } else if modifiers.contains("payable") {
        Mutability::Payable
    } else {
        Mutability::Nonpayable
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
