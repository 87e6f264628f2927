// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted provider for exercising the ladder and optimizer without HTTP.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::provider::{CompletionRequest, ProviderCallError, TextProvider};

/// A provider that replays a fixed reply script and records every call.
pub struct ScriptedProvider {
    name: String,
    models: Vec<String>,
    replies: Mutex<VecDeque<Result<String, ProviderCallError>>>,
    pub calls: Mutex<Vec<(String, bool)>>,
}

impl ScriptedProvider {
    pub fn new(
        name: &str,
        models: &[&str],
        replies: Vec<Result<String, ProviderCallError>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderCallError> {
        self.calls.lock().push((model.to_string(), request.json));
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderCallError::new("script exhausted")))
    }
}

/// A syntactically valid draft reply.
pub fn good_draft_json() -> String {
    serde_json::json!({
        "optimizations": [
            {"name": "Cache array length", "description": "Hoist .length out of the loop"}
        ],
        "edits": [{
            "action": "replace",
            "lineStart": 4,
            "lineEnd": 4,
            "before": "for (uint256 i = 0; i < values.length; i++) {",
            "after": "uint256 len = values.length; for (uint256 i = 0; i < len; ++i) {",
            "rationale": "avoid repeated SLOAD"
        }],
        "totalEstimatedSaving": "~1200 gas per call"
    })
    .to_string()
}

/// A generated candidate that passes sanity and the static pre-check.
pub fn good_candidate() -> String {
    "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.20;\n\
     contract Demo { uint256 total; function bump(uint256 n) external { total += n; } }"
        .to_string()
}

pub fn approved_verdict_json() -> String {
    serde_json::json!({
        "approved": true,
        "summary": "Edits are behavior-preserving.",
        "riskFlags": []
    })
    .to_string()
}

pub fn rejected_verdict_json() -> String {
    serde_json::json!({
        "approved": false,
        "summary": "Loop rewrite changes overflow behavior.",
        "riskFlags": ["overflow"]
    })
    .to_string()
}
