// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-code fingerprints for submission deduplication.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the trimmed source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeFingerprint(pub String);

impl CodeFingerprint {
    pub fn of(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.trim().as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CodeFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_ignored() {
        let a = CodeFingerprint::of("contract A {}");
        let b = CodeFingerprint::of("  contract A {}\n\n");
        assert_eq!(a, b);
    }

    #[test]
    fn different_sources_differ() {
        let a = CodeFingerprint::of("contract A {}");
        let b = CodeFingerprint::of("contract B {}");
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_64_hex_chars() {
        let fp = CodeFingerprint::of("contract A {}");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
