// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate verification: static anti-pattern pre-check plus parsing of the
//! AI verifier's verdict.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use gz_core::VerifierVerdict;

use crate::draft::clean_json_text;

struct AntiPattern {
    name: &'static str,
    regex: &'static OnceLock<Regex>,
    pattern: &'static str,
}

static STORAGE_ON_VALUE: OnceLock<Regex> = OnceLock::new();
static REQUIRE_CUSTOM_ERROR: OnceLock<Regex> = OnceLock::new();
static UNCHECKED_IN_HEADER: OnceLock<Regex> = OnceLock::new();

const ANTI_PATTERNS: &[AntiPattern] = &[
    AntiPattern {
        name: "storage keyword on value type",
        regex: &STORAGE_ON_VALUE,
        pattern: r"\b(uint\d*|int\d*|bool|address|bytes\d+)\s+storage\b",
    },
    AntiPattern {
        name: "require with custom error argument",
        regex: &REQUIRE_CUSTOM_ERROR,
        pattern: r"require\s*\([^;]*,\s*[A-Z][A-Za-z0-9_]*\s*\(\s*\)\s*\)",
    },
    AntiPattern {
        name: "unchecked block in for-loop header",
        regex: &UNCHECKED_IN_HEADER,
        pattern: r"for\s*\([^)]*unchecked",
    },
];

/// Reject candidates that match known compilation anti-patterns.
///
/// Returns the precise anti-pattern name on rejection.
pub fn static_pre_check(source: &str) -> Result<(), String> {
    for anti in ANTI_PATTERNS {
        let regex = anti.regex.get_or_init(|| {
            #[allow(clippy::unwrap_used)] // literal patterns
            let re = Regex::new(anti.pattern).unwrap();
            re
        });
        if regex.is_match(source) {
            return Err(anti.name.to_string());
        }
    }
    Ok(())
}

/// Parse the verifier's JSON verdict, enumerating shape errors.
pub fn parse_verdict(raw: &str) -> Result<VerifierVerdict, Vec<String>> {
    let cleaned = clean_json_text(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| vec![format!("verdict is not valid JSON: {e}")])?;

    let mut errors = Vec::new();

    let approved = match value.get("approved").and_then(Value::as_bool) {
        Some(b) => b,
        None => {
            errors.push("approved: expected a boolean".to_string());
            false
        }
    };
    let summary = match value.get("summary").and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => {
            errors.push("summary: expected a string".to_string());
            String::new()
        }
    };
    let risk_flags = match value.get("riskFlags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(_) => {
            errors.push("riskFlags: expected an array of strings".to_string());
            Vec::new()
        }
    };

    if errors.is_empty() {
        Ok(VerifierVerdict { approved, summary, risk_flags })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
