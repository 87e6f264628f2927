// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::demo_artifacts_json;
use gz_core::abi::AbiEntry;
use gz_core::Mutability;

fn artifact(name: &str, bytecode: &str, with_ctor: bool) -> Artifact {
    let mut abi = vec![AbiEntry {
        kind: "function".into(),
        name: Some("f".into()),
        inputs: vec![],
        state_mutability: Some(Mutability::View),
    }];
    if with_ctor {
        abi.push(AbiEntry {
            kind: "constructor".into(),
            name: None,
            inputs: vec![],
            state_mutability: Some(Mutability::Nonpayable),
        });
    }
    Artifact { name: name.into(), abi: Abi(abi), bytecode: bytecode.into() }
}

#[test]
fn parses_solc_style_artifact_keys() {
    let artifacts = parse_artifacts(&demo_artifacts_json()).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "Demo");
    assert!(artifacts[0].has_constructor());
    assert_eq!(artifacts[0].abi.functions().count(), 2);
}

#[test]
fn unparseable_compiler_output_is_an_error() {
    assert!(parse_artifacts("not json").is_err());
    assert!(parse_artifacts("{}").is_err());
}

#[test]
fn empty_bytecode_is_skipped() {
    let selected = select_main_artifact(vec![
        artifact("IFace", "0x", false),
        artifact("Impl", "0x60806040", false),
    ])
    .unwrap();
    assert_eq!(selected.name, "Impl");
}

#[test]
fn constructor_wins_over_size() {
    let selected = select_main_artifact(vec![
        artifact("Big", &format!("0x{}", "60".repeat(400)), false),
        artifact("WithCtor", "0x6080", true),
    ])
    .unwrap();
    assert_eq!(selected.name, "WithCtor");
}

#[test]
fn largest_bytecode_breaks_ties() {
    let selected = select_main_artifact(vec![
        artifact("Small", "0x6080", false),
        artifact("Large", &format!("0x{}", "60".repeat(100)), false),
    ])
    .unwrap();
    assert_eq!(selected.name, "Large");
}

#[test]
fn all_interfaces_selects_nothing() {
    assert!(select_main_artifact(vec![
        artifact("IFaceA", "", false),
        artifact("IFaceB", "0x", false),
    ])
    .is_none());
}
