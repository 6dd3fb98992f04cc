// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relational_treasury_gateway::{
    api::router,
    chain::{
        erc20::Erc20Treasury,
        oracles::{AggregatorFeed, UniswapPool},
        signing::load_operator_key,
        ChainClient,
    },
    config::{GatewayConfig, LogFormat, DEFAULT_LOG_FILTER},
    gateway::{Collaborators, SystemClock, WithdrawalGateway},
    ledger::Ledger,
    state::AppState,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        return ExitCode::FAILURE;
    }

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn run(config: GatewayConfig) -> Result<(), BoxError> {
    let ledger = Arc::new(Ledger::open(&config.ledger_path())?);

    let operator = load_operator_key(&config.operator_key_path)?;
    let operator_address = operator.address();
    let client = ChainClient::connect(&config.rpc_url, config.chain_id, operator)?;
    client.verify_chain_id().await?;
    tracing::info!(
        chain_id = config.chain_id,
        operator = %operator_address,
        "Connected to chain"
    );

    let collaborators = Collaborators {
        eth_usd_feed: Arc::new(AggregatorFeed::connect(client.clone(), config.eth_usd_feed).await?),
        stable_usd_feed: Arc::new(
            AggregatorFeed::connect(client.clone(), config.stable_usd_feed).await?,
        ),
        pool: Arc::new(UniswapPool::new(client.clone(), config.pool)),
        transfers: Arc::new(Erc20Treasury::new(client, operator_address)),
        clock: Arc::new(SystemClock),
    };

    let gateway = Arc::new(WithdrawalGateway::new(
        config.gateway_params(),
        collaborators,
        ledger,
        &config.initial_settings(),
    )?);

    for signer in &config.trusted_signers {
        if gateway.set_trusted_signer(config.owner, *signer, true)? {
            tracing::info!(%signer, "Seeded trusted signer");
        }
    }

    let app = router(AppState::new(gateway));
    let addr = config.bind_addr()?;

    let handle: Handle<SocketAddr> = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            tracing::info!(%addr, "Treasury gateway listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::warn!(%addr, "Treasury gateway listening on plain http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: Handle<SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown requested, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
