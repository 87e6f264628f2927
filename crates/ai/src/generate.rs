// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-processing of generated candidate source.
//!
//! Generators keep producing two known-invalid Solidity patterns; both are
//! rewritten mechanically before the candidate goes anywhere near a
//! compiler:
//!
//! - `for (…; …; unchecked { ++i; })` — an unchecked block is a statement
//!   and cannot appear in a for-header; rewritten to a checked `++i`.
//! - `require(cond, Err())` — custom errors are not valid require reasons
//!   on the pinned compiler line; rewritten to `if (!(cond)) revert Err();`.

use regex::Regex;
use std::sync::OnceLock;

fn unchecked_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // literal pattern
        let re = Regex::new(
            r"(for\s*\([^;{)]*;[^;{)]*;\s*)unchecked\s*\{\s*(\+\+[A-Za-z_]\w*|[A-Za-z_]\w*\+\+)\s*;?\s*\}\s*\)",
        )
        .unwrap();
        re
    })
}

/// Strip markdown code fences from generator output.
pub fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full candidate post-processing: fences stripped, known-invalid patterns
/// rewritten, surrounding whitespace trimmed.
pub fn post_process_candidate(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = rewrite_unchecked_loop_increment(&text);
    let text = rewrite_require_custom_error(&text);
    text.trim().to_string()
}

/// Minimum sanity for a candidate: non-empty, mentions a contract, and is
/// long enough to plausibly be source.
pub fn sanity_check(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("generated source is empty".to_string());
    }
    if !source.contains("contract ") {
        return Err("generated source has no contract declaration".to_string());
    }
    if source.len() < 40 {
        return Err("generated source is implausibly short".to_string());
    }
    Ok(())
}

fn rewrite_unchecked_loop_increment(source: &str) -> String {
    unchecked_header_re().replace_all(source, "$1$2)").into_owned()
}

/// Rewrite `require(cond, Err())` statements into `if (!(cond)) revert Err()`.
///
/// Scans for `require(` with balanced parentheses (string-literal aware),
/// splits the top-level comma, and only rewrites when the second argument is
/// a bare custom-error constructor call.
fn rewrite_require_custom_error(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(call) = match_require_at(source, i) {
            if let Some((cond, error_call)) = split_custom_error_args(&call.args) {
                out.push_str(&format!("if (!({cond})) revert {error_call}"));
                i = call.end;
                continue;
            }
        }
        // Advance one char (UTF-8 safe).
        let ch_len = source[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        out.push_str(&source[i..i + ch_len]);
        i += ch_len;
    }

    out
}

struct RequireCall {
    args: String,
    /// Byte offset just past the closing paren.
    end: usize,
}

fn match_require_at(source: &str, at: usize) -> Option<RequireCall> {
    let rest = &source[at..];
    if !rest.starts_with("require") {
        return None;
    }
    // Must be a standalone identifier.
    if at > 0 {
        let prev = source[..at].chars().next_back()?;
        if prev.is_alphanumeric() || prev == '_' {
            return None;
        }
    }
    // Next non-whitespace char after the identifier must open the call.
    let after_ident = at + "require".len();
    let trimmed = source[after_ident..].trim_start();
    if !trimmed.starts_with('(') {
        return None;
    }
    let open = after_ident + (source[after_ident..].len() - trimmed.len());

    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for (offset, ch) in source[open..].char_indices() {
        match in_string {
            Some(quote) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
            }
            None => match ch {
                '"' | '\'' => in_string = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let args = source[open + 1..open + offset].to_string();
                        return Some(RequireCall { args, end: open + offset + 1 });
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// Split `cond, Err()` at the top-level comma; `None` unless the second
/// argument is a bare `UpperCamel()` constructor call.
fn split_custom_error_args(args: &str) -> Option<(String, String)> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    for (idx, ch) in args.char_indices() {
        match in_string {
            Some(quote) => {
                if ch == quote {
                    in_string = None;
                }
            }
            None => match ch {
                '"' | '\'' => in_string = Some(ch),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    let cond = args[..idx].trim().to_string();
                    let second = args[idx + 1..].trim();
                    return is_custom_error_call(second)
                        .then(|| (cond, second.to_string()));
                }
                _ => {}
            },
        }
    }
    None
}

fn is_custom_error_call(text: &str) -> bool {
    let Some(stripped) = text.strip_suffix("()") else {
        return false;
    };
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "generate_tests.rs"]
mod tests;
