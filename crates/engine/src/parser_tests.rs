// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const DEMO: &str = r#"
// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

contract GasOptimizerEasyDemo {
    uint256[] public values;

    function seedValues(uint256[] calldata input) external {
        for (uint256 i = 0; i < input.length; i++) {
            values.push(input[i]);
        }
    }

    function total() public view returns (uint256 sum) {
        for (uint256 i = 0; i < values.length; i++) {
            sum += values[i];
        }
    }

    function helper(uint256 a) private pure returns (uint256) {
        return a * 2;
    }

    receive() external payable {}

    function fund() external payable {}
}
"#;

#[test]
fn extracts_contract_name() {
    let profile = HeuristicParser.parse(DEMO).unwrap();
    assert_eq!(profile.contract_name, "GasOptimizerEasyDemo");
}

#[test]
fn extracts_functions_with_visibility_and_mutability() {
    let profile = HeuristicParser.parse(DEMO).unwrap();
    let by_name: std::collections::HashMap<_, _> =
        profile.functions.iter().map(|f| (f.name.as_str(), f)).collect();

    let seed = by_name["seedValues"];
    assert_eq!(seed.visibility, Visibility::External);
    assert_eq!(seed.mutability, Mutability::Nonpayable);

    let total = by_name["total"];
    assert_eq!(total.visibility, Visibility::Public);
    assert_eq!(total.mutability, Mutability::View);

    let helper = by_name["helper"];
    assert_eq!(helper.visibility, Visibility::Private);
    assert_eq!(helper.mutability, Mutability::Pure);

    let fund = by_name["fund"];
    assert_eq!(fund.mutability, Mutability::Payable);
}

#[test]
fn abstract_contract_is_recognized() {
    let profile = HeuristicParser.parse("abstract contract Base { }").unwrap();
    assert_eq!(profile.contract_name, "Base");
}

#[test]
fn missing_contract_declaration_fails() {
    assert!(HeuristicParser.parse("library Math { }").is_err());
    assert!(HeuristicParser.parse("").is_err());
}
