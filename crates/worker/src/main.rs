// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gzw: the gweizero gas measurement worker daemon.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gz_core::SystemClock;
use gz_worker::{env, http, JobStore, PgPersistence, RunnerConfig, SubprocessRunner};
use gz_worker::persistence::JobPersistence;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gz_worker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "worker failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = env::database_url()?;
    let persistence = Arc::new(PgPersistence::connect(&database_url).await?);
    persistence.ensure_schema().await?;
    tracing::info!("database schema ready");

    let (store, queue_rx) = JobStore::new(persistence, SystemClock);
    store.recover().await?;

    let runner_config: RunnerConfig = env::runner_config();
    tracing::info!(
        compiler = %runner_config.compiler_bin,
        estimator = %runner_config.estimator_bin,
        build_root = %runner_config.build_root.display(),
        "runner configured"
    );
    let runner = Arc::new(SubprocessRunner::new(runner_config));

    let shutdown = CancellationToken::new();
    let processor = tokio::spawn(store.clone().run_processor(
        queue_rx,
        runner,
        shutdown.clone(),
    ));

    let app = http::router(store.clone()).layer(TraceLayer::new_for_http());
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], env::worker_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "worker listening");

    let serve_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            serve_shutdown.cancel();
        })
        .await?;

    // Abort any in-flight subprocess so jobs land in `cancelled`, not as
    // orphaned `processing` rows.
    store.abort_all();
    shutdown.cancel();
    let _ = processor.await;
    tracing::info!("worker stopped");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(signal) => signal,
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
