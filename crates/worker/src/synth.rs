// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic ABI input synthesis.
//!
//! Gas estimation must be repeatable, so every call argument derives only
//! from the parameter's type and position. Nesting (arrays, tuples) is
//! bounded at depth 4.

use serde_json::Value;

use gz_core::abi::{Abi, AbiParam};

use crate::error::SynthError;

const MAX_DEPTH: u32 = 4;

/// Deterministic constructor arguments (empty without a constructor).
pub fn constructor_args(abi: &Abi) -> Result<Vec<Value>, SynthError> {
    match abi.constructor() {
        Some(ctor) => args_for(&ctor.inputs),
        None => Ok(Vec::new()),
    }
}

/// Deterministic arguments for a parameter list.
pub fn args_for(params: &[AbiParam]) -> Result<Vec<Value>, SynthError> {
    params
        .iter()
        .enumerate()
        .map(|(index, param)| value_for(param, index, 1))
        .collect()
}

fn value_for(param: &AbiParam, index: usize, depth: u32) -> Result<Value, SynthError> {
    if depth > MAX_DEPTH {
        return Err(SynthError::NestedTooDeep);
    }

    // The last array suffix is the outermost dimension.
    if let Some(open) = param.kind.rfind('[') {
        let element = AbiParam {
            name: param.name.clone(),
            kind: param.kind[..open].to_string(),
            components: param.components.clone(),
        };
        let suffix = &param.kind[open..];
        let count = match suffix {
            "[]" => 2,
            _ => parse_fixed_len(suffix)
                .ok_or_else(|| SynthError::UnsupportedType(param.kind.clone()))?,
        };
        let items: Result<Vec<Value>, SynthError> = (0..count)
            .map(|offset| value_for(&element, index + offset, depth + 1))
            .collect();
        return Ok(Value::Array(items?));
    }

    match param.kind.as_str() {
        "bool" => return Ok(Value::Bool(index % 2 == 0)),
        "address" => return Ok(Value::String(format!("0x{:040x}", index + 1))),
        "string" => return Ok(Value::String(format!("gweizero_{index}"))),
        "bytes" => return Ok(Value::String("0x1234".to_string())),
        "tuple" => {
            let items: Result<Vec<Value>, SynthError> = param
                .components
                .iter()
                .enumerate()
                .map(|(i, component)| value_for(component, i, depth + 1))
                .collect();
            return Ok(Value::Array(items?));
        }
        _ => {}
    }

    if integer_width(&param.kind).is_some() {
        return Ok(Value::from(index as u64 + 1));
    }
    if let Some(n) = fixed_bytes_width(&param.kind) {
        return Ok(Value::String(format!("0x{}", "11".repeat(n))));
    }

    Err(SynthError::UnsupportedType(param.kind.clone()))
}

/// `"[N]"` → `N` for positive `N`.
fn parse_fixed_len(suffix: &str) -> Option<usize> {
    suffix
        .strip_prefix('[')?
        .strip_suffix(']')?
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
}

/// `uint`/`int` with an optional width; returns the width (256 default).
fn integer_width(kind: &str) -> Option<u32> {
    let digits = kind.strip_prefix("uint").or_else(|| kind.strip_prefix("int"))?;
    if digits.is_empty() {
        return Some(256);
    }
    digits.parse::<u32>().ok().filter(|w| *w > 0 && *w <= 256 && w % 8 == 0)
}

/// `bytesN` → `N` for `1..=32`.
fn fixed_bytes_width(kind: &str) -> Option<usize> {
    let digits = kind.strip_prefix("bytes")?;
    digits.parse::<usize>().ok().filter(|n| (1..=32).contains(n))
}

#[cfg(test)]
#[path = "synth_tests.rs"]
mod tests;
