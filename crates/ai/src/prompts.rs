// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt construction for the three optimizer stages.

use gz_core::{EditOp, GasProfile};

fn profile_json(profile: &GasProfile) -> String {
    serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string())
}

fn edits_json(edits: &[EditOp]) -> String {
    serde_json::to_string_pretty(edits).unwrap_or_else(|_| "[]".to_string())
}

/// Draft prompt: propose optimizations as structured JSON.
pub fn draft_prompt(source: &str, baseline: &GasProfile, feedback: Option<&str>) -> String {
    let mut prompt = format!(
        "You are a Solidity gas-optimization expert.\n\
         Analyze the contract below together with its measured gas profile and \
         propose concrete gas optimizations.\n\n\
         Respond with ONLY a JSON object of this exact shape:\n\
         {{\n\
           \"optimizations\": [{{\"name\": string, \"description\": string}}],\n\
           \"edits\": [{{\"action\": \"replace\"|\"insert\"|\"delete\", \"lineStart\": number, \
         \"lineEnd\": number, \"before\": string, \"after\": string, \"rationale\": string}}],\n\
           \"totalEstimatedSaving\": string\n\
         }}\n\n\
         Guidelines: propose at most 3 optimizations; keep each rationale under \
         80 characters; never change the contract's external interface.\n\n\
         Contract source:\n```solidity\n{source}\n```\n\n\
         Measured gas profile:\n{profile}\n",
        profile = profile_json(baseline),
    );
    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\nYour previous attempt was rejected: {feedback}\nAddress this in the new proposal.\n"
        ));
    }
    prompt
}

/// Repair prompt: fix the draft so it matches the schema.
pub fn repair_prompt(prior_prompt: &str, bad_output: &str, errors: &[String]) -> String {
    format!(
        "Your previous response did not match the required JSON schema.\n\n\
         Original request:\n{prior_prompt}\n\n\
         Your response:\n{bad_output}\n\n\
         Schema errors:\n- {errors}\n\n\
         Respond again with ONLY a JSON object that fixes every listed error.",
        errors = errors.join("\n- "),
    )
}

/// Generator prompt: apply the edits and return full source.
pub fn generator_prompt(source: &str, edits: &[EditOp]) -> String {
    format!(
        "Apply these edits to the Solidity contract below and return the FULL \
         optimized source.\n\
         Rules: return ONLY Solidity code, no commentary and no markdown; the \
         result must compile; preserve the contract ABI exactly (same functions, \
         same parameters, same mutability).\n\n\
         Edits:\n{edits}\n\n\
         Contract source:\n```solidity\n{source}\n```\n",
        edits = edits_json(edits),
    )
}

/// Verifier prompt: adjudicate the candidate against the original.
pub fn verifier_prompt(
    original: &str,
    candidate: &str,
    edits: &[EditOp],
    baseline: &GasProfile,
) -> String {
    format!(
        "You are reviewing a proposed gas optimization of a Solidity contract.\n\
         Decide whether the optimized version is safe: it must preserve behavior \
         and the external ABI, and plausibly reduce gas.\n\n\
         Respond with ONLY a JSON object:\n\
         {{\"approved\": boolean, \"summary\": string, \"riskFlags\": [string]}}\n\n\
         Original contract:\n```solidity\n{original}\n```\n\n\
         Optimized candidate:\n```solidity\n{candidate}\n```\n\n\
         Edits applied:\n{edits}\n\n\
         Baseline gas profile:\n{profile}\n",
        edits = edits_json(edits),
        profile = profile_json(baseline),
    )
}

/// Corrective prompt used when a candidate fails to compile during
/// acceptance validation.
pub fn corrective_prompt(source: &str, error_kind: &str, hint: &str) -> String {
    format!(
        "The Solidity contract below fails to compile ({error_kind}).\n\
         Hint: {hint}\n\
         Fix the problem and return the FULL corrected source. Return ONLY \
         Solidity code, no commentary and no markdown. Preserve the contract \
         ABI exactly.\n\n\
         ```solidity\n{source}\n```\n"
    )
}
