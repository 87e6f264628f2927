// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort draft JSON parsing and schema validation.
//!
//! Model output is rarely clean JSON. Parsing strips code fences, slices
//! from the first `{` to the last `}`, drops control characters and trailing
//! commas, and only then hands the text to serde. Validation enumerates
//! every shape error so a single repair call can fix all of them at once.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use gz_core::{EditAction, EditOp, Optimization};

/// The validated shape of an optimizer draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationDraft {
    pub optimizations: Vec<Optimization>,
    pub edits: Vec<EditOp>,
    pub total_estimated_saving: String,
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // literal pattern
        let re = Regex::new(r",\s*([}\]])").unwrap();
        re
    })
}

/// Clean raw model output into something `serde_json` has a chance with.
pub fn clean_json_text(raw: &str) -> String {
    let mut text = raw.replace("```json", "").replace("```", "");

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            text = text[start..=end].to_string();
        }
    }

    // Raw control characters are illegal inside JSON strings.
    let text: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();

    trailing_comma_re().replace_all(&text, "$1").into_owned()
}

/// Parse and validate a draft, returning every schema error on failure.
pub fn parse_draft(raw: &str) -> Result<OptimizationDraft, Vec<String>> {
    let cleaned = clean_json_text(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| vec![format!("output is not valid JSON: {e}")])?;
    validate_draft(&value)
}

fn validate_draft(value: &Value) -> Result<OptimizationDraft, Vec<String>> {
    let mut errors = Vec::new();

    let Some(root) = value.as_object() else {
        return Err(vec!["root: expected a JSON object".to_string()]);
    };

    let mut optimizations = Vec::new();
    match root.get("optimizations") {
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                match item.get("name").and_then(Value::as_str) {
                    Some(name) => optimizations.push(Optimization {
                        name: name.to_string(),
                        description: item
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    }),
                    None => errors.push(format!("optimizations[{i}].name: expected a string")),
                }
            }
        }
        Some(_) => errors.push("optimizations: expected an array".to_string()),
        None => errors.push("optimizations: missing".to_string()),
    }

    let mut edits = Vec::new();
    match root.get("edits") {
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if let Some(edit) = validate_edit(i, item, &mut errors) {
                    edits.push(edit);
                }
            }
        }
        Some(_) => errors.push("edits: expected an array".to_string()),
        None => errors.push("edits: missing".to_string()),
    }

    let total_estimated_saving = match root.get("totalEstimatedSaving") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            errors.push("totalEstimatedSaving: expected a string".to_string());
            String::new()
        }
        None => {
            errors.push("totalEstimatedSaving: missing".to_string());
            String::new()
        }
    };

    if errors.is_empty() {
        Ok(OptimizationDraft { optimizations, edits, total_estimated_saving })
    } else {
        Err(errors)
    }
}

fn validate_edit(index: usize, item: &Value, errors: &mut Vec<String>) -> Option<EditOp> {
    let before_count = errors.len();

    let action = match item.get("action").and_then(Value::as_str) {
        Some("replace") => Some(EditAction::Replace),
        Some("insert") => Some(EditAction::Insert),
        Some("delete") => Some(EditAction::Delete),
        _ => {
            errors.push(format!("edits[{index}].action: expected one of replace|insert|delete"));
            None
        }
    };

    let line = |field: &str, errors: &mut Vec<String>| -> Option<u32> {
        match item.get(field).and_then(Value::as_u64) {
            Some(n) => Some(n as u32),
            None => {
                errors.push(format!("edits[{index}].{field}: expected a number"));
                None
            }
        }
    };
    let line_start = line("lineStart", errors);
    let line_end = line("lineEnd", errors);

    let text = |field: &str, errors: &mut Vec<String>| -> Option<String> {
        match item.get(field).and_then(Value::as_str) {
            Some(s) => Some(s.to_string()),
            None => {
                errors.push(format!("edits[{index}].{field}: expected a string"));
                None
            }
        }
    };
    let before = text("before", errors);
    let after = text("after", errors);
    let rationale = text("rationale", errors);

    if errors.len() > before_count {
        return None;
    }
    Some(EditOp {
        action: action?,
        line_start: line_start?,
        line_end: line_end?,
        before: before?,
        after: after?,
        rationale: rationale?,
    })
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
