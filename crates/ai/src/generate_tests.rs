// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fences_are_stripped() {
    let raw = "```solidity\ncontract A { uint256 x; }\n```";
    assert_eq!(strip_code_fences(raw), "contract A { uint256 x; }");
}

#[test]
fn unchecked_increment_in_for_header_is_rewritten() {
    let raw = "for (uint256 i = 0; i < len; unchecked { ++i; }) { sum += i; }";
    let out = post_process_candidate(&format!("contract A {{ function f() public {{ {raw} }} }}"));
    assert!(out.contains("for (uint256 i = 0; i < len; ++i)"), "got: {out}");
    assert!(!out.contains("unchecked"));
}

#[test]
fn postfix_increment_variant_is_rewritten() {
    let raw = "for (uint i = 0; i < n; unchecked{i++;})";
    let out = post_process_candidate(&format!("contract A {{ function f() public {{ {raw} }} }}"));
    assert!(out.contains("for (uint i = 0; i < n; i++)"), "got: {out}");
}

#[test]
fn require_with_custom_error_is_rewritten() {
    let source = "contract A { error Empty(); function f(uint256 n) public { \
                  require(n > 0, Empty()); } }";
    let out = post_process_candidate(source);
    assert!(out.contains("if (!(n > 0)) revert Empty();"), "got: {out}");
    assert!(!out.contains("require(n > 0"));
}

#[test]
fn require_with_string_reason_is_untouched() {
    let source = "contract A { function f(uint256 n) public { \
                  require(n > 0, \"must be positive\"); } }";
    let out = post_process_candidate(source);
    assert!(out.contains("require(n > 0, \"must be positive\");"));
}

#[test]
fn require_with_nested_parens_in_condition() {
    let source = "contract A { error Bad(); function f(uint256 a, uint256 b) public { \
                  require((a + b) > min(a, b), Bad()); } }";
    let out = post_process_candidate(source);
    assert!(out.contains("if (!((a + b) > min(a, b))) revert Bad();"), "got: {out}");
}

#[test]
fn single_argument_require_is_untouched() {
    let source = "contract A { function f(bool ok) public { require(ok); } }";
    let out = post_process_candidate(source);
    assert!(out.contains("require(ok);"));
}

#[test]
fn sanity_rejects_empty_and_short_and_contractless() {
    assert!(sanity_check("").is_err());
    assert!(sanity_check("   \n  ").is_err());
    assert!(sanity_check("contract A{}").is_err(), "below minimum length");
    assert!(sanity_check(&"pragma solidity ^0.8.20; library L { }".repeat(2)).is_err());
    assert!(sanity_check(
        "pragma solidity ^0.8.20;\ncontract A { uint256 public total; }"
    )
    .is_ok());
}
