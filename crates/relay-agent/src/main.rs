//! `relay` binary: load settings, authenticate, serve, supervise.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mimalloc::MiMalloc;
use relay_agent::bootstrap;
use relay_agent::cli::Cli;
use relay_auth::TokenSource;
use relay_server::{build_router, drain_connections, serve};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long open sessions get to unregister their subscriptions on shutdown.
const SESSION_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = relay_core::logging::with_bootstrap_logging(
        cli.log_level.as_deref().unwrap_or("info"),
        || bootstrap::load(&cli),
    )?;

    let _ = relay_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);
    info!(version = env!("CARGO_PKG_VERSION"), "starting relay");

    let metrics = match relay_server::metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "metrics disabled");
            None
        }
    };

    let token_cancel = CancellationToken::new();
    let (tokens, mut renewal) = bootstrap::start_tokens(&settings, token_cancel.clone()).await?;

    let shutdown = CancellationToken::new();
    let state = bootstrap::build_state(
        &settings,
        Arc::clone(&tokens) as Arc<dyn TokenSource>,
        metrics,
        shutdown.clone(),
    )?;
    let registry = Arc::clone(&state.registry);
    let connections = state.connections.clone();
    let app = build_router(state, &settings.server);
    let listener = relay_server::server::bind(&settings.server)
        .await
        .context("starting listener")?;
    let mut server = tokio::spawn(serve(listener, app, shutdown.clone()));

    let mut exit_code = 0;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown requested");
        }
        result = &mut renewal => {
            match result {
                Ok(Err(e)) => error!(error = %e, "token renewal failed, shutting down"),
                Ok(Ok(())) => error!("token renewal stopped unexpectedly, shutting down"),
                Err(e) => error!(error = %e, "token renewal task panicked, shutting down"),
            }
            exit_code = 1;
        }
        result = &mut server => {
            match result {
                Ok(Ok(())) => warn!("server exited"),
                Ok(Err(e)) => error!(error = %e, "server failed"),
                Err(e) => error!(error = %e, "server task panicked"),
            }
            exit_code = 1;
        }
    }

    token_cancel.cancel();
    shutdown.cancel();
    if !server.is_finished() {
        match server.await {
            Ok(Err(e)) => warn!(error = %e, "server stopped with error"),
            Err(e) => warn!(error = %e, "server task failed"),
            Ok(Ok(())) => {}
        }
    }
    let _ = drain_connections(&connections, SESSION_DRAIN_TIMEOUT).await;
    if !registry.disconnect_all().await {
        warn!("some subscriptions could not be removed from the broker");
    }
    info!("relay stopped");

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
