// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gz-orchestrator: the analysis daemon's HTTP surface and wiring.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod http;
pub mod registry_client;
pub mod state;

pub use http::router;
pub use registry_client::RpcProofRegistry;
pub use state::{AppState, ChainConfig};
