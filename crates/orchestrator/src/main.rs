// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gzd: the gweizero analysis orchestrator daemon.

use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gz_ai::{providers_from_env, AiOptimizer, LadderReviser, ProviderLadder};
use gz_core::SystemClock;
use gz_engine::{Analyzer, HeuristicParser, WorkerClient};
use gz_orchestrator::{env, http, AppState, RpcProofRegistry};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gz_orchestrator=info,gz_engine=info,gz_ai=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "orchestrator failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let providers = providers_from_env();
    let ladder = Arc::new(ProviderLadder::new(providers, env::retry_policy()));
    for (name, models) in ladder.summary() {
        tracing::info!(provider = %name, models, "AI provider configured");
    }
    if ladder.is_empty() {
        tracing::warn!("no AI providers configured; analyses will return fallback responses");
    }

    let optimizer = Arc::new(AiOptimizer::new(ladder.clone(), env::optimizer_config()));
    let reviser = Arc::new(LadderReviser::new(ladder));
    let worker = Arc::new(WorkerClient::new(env::worker_url(), env::worker_client_config()));
    tracing::info!(worker_url = %env::worker_url(), "worker client configured");

    let analyzer = Analyzer::new(
        SystemClock,
        Arc::new(HeuristicParser),
        worker,
        optimizer,
        Some(reviser),
        env::analyzer_config(),
    );

    let chain = env::chain_config();
    let proof_registry: Option<Arc<dyn gz_engine::ProofRegistry>> = chain
        .clone()
        .map(|chain| Arc::new(RpcProofRegistry::new(chain)) as Arc<dyn gz_engine::ProofRegistry>);
    if chain.is_none() {
        tracing::info!("chain env vars absent; proof minting disabled");
    }

    let state = AppState { analyzer, chain, proof_registry };
    let app = http::router(state).layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], env::port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "orchestrator listening");
    axum::serve(listener, app).await?;
    Ok(())
}
