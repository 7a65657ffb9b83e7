//! On-chain Guestbook Service
//!
//! A long-running service that mirrors a guestbook smart contract into
//! memory and exposes it over a JSON API.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌─────────────────────────────────────────────────┐
//!                     │                GUESTBOOK SERVICE                │
//!                     │                                                 │
//!   HTTP Request      │  ┌────────┐    ┌───────────┐    ┌───────────┐  │
//!   ──────────────────┼─▶│  http  │───▶│ guestbook │───▶│ guestbook │  │
//!                     │  │ server │    │   state   │    │  contract │──┼──▶ EVM
//!                     │  └────────┘    └─────┬─────┘    └───────────┘  │    JSON-RPC
//!                     │                      │                         │
//!                     │                      ▼                         │
//!                     │              ┌──────────────┐                  │
//!                     │              │   session    │◀── wallet (env)  │
//!                     │              └──────────────┘                  │
//!                     │                                                 │
//!                     │  ┌────────────────────────────────────────────┐ │
//!                     │  │           Cross-Cutting Concerns           │ │
//!                     │  │  ┌────────┐ ┌─────────────┐ ┌───────────┐  │ │
//!                     │  │  │ config │ │observability│ │ lifecycle │  │ │
//!                     │  │  └────────┘ └─────────────┘ └───────────┘  │ │
//!                     │  └────────────────────────────────────────────┘ │
//!                     └─────────────────────────────────────────────────┘
//! ```
//!
//! # Startup Sequence
//!
//! Config loads first, then logging and metrics come up, then the chain
//! client and optional signing wallet. A background monitor marks the
//! session connected once the chain answers and runs the initial message
//! load after a short settle delay. The API listener starts last.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use guestbook_service::chain::wallet::PRIVATE_KEY_ENV_VAR;
use guestbook_service::chain::{ChainClient, Wallet};
use guestbook_service::config::{load_config, ServiceConfig};
use guestbook_service::guestbook::state::CONNECT_SETTLE_DELAY;
use guestbook_service::guestbook::{GuestbookContract, GuestbookState, Session};
use guestbook_service::http::{AppState, HttpServer};
use guestbook_service::lifecycle::{signals, Shutdown};
use guestbook_service::observability::{logging, metrics};

/// How often the chain is probed to keep the session status current.
const SESSION_MONITOR_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_configuration();

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "guestbook-service starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.chain.rpc_url,
        contract = %config.contract.address,
        chain_id = config.chain.chain_id,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let client = ChainClient::new(config.chain.clone()).await?;
    let wallet = Wallet::from_env(config.chain.chain_id)?;
    match &wallet {
        Some(wallet) => {
            tracing::info!(address = %wallet.address(), "Signing wallet loaded");
        }
        None => {
            tracing::warn!(
                env_var = PRIVATE_KEY_ENV_VAR,
                "No signing wallet configured, mutations are disabled"
            );
        }
    }

    let session = Arc::new(Session::new(
        wallet.as_ref().map(|w| w.address()),
        config.chain.chain_id,
    ));
    let gateway = GuestbookContract::new(client.clone(), wallet, &config.contract)?;
    let guestbook = Arc::new(GuestbookState::new(Arc::new(gateway), session.clone()));

    let shutdown = Arc::new(Shutdown::new());

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::watch_signals(&signal_shutdown).await;
    });

    tokio::spawn(monitor_session(
        client,
        session.clone(),
        guestbook.clone(),
        shutdown.clone(),
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let state = AppState {
        guestbook,
        session,
        limits: config.limits.clone(),
    };
    let server = HttpServer::new(&config, state);
    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Read the config path from the first argument, falling back to defaults.
///
/// Logging is not up yet, so load failures go to stderr and exit.
fn load_configuration() -> ServiceConfig {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ServiceConfig::default(),
    }
}

/// Keep the session status in step with chain reachability.
///
/// The first healthy probe connects the session and runs the initial load
/// after the settle delay. Later transitions reconnect or disconnect the
/// session; each reconnect reloads.
async fn monitor_session(
    client: ChainClient,
    session: Arc<Session>,
    guestbook: Arc<GuestbookState>,
    shutdown: Arc<Shutdown>,
) {
    let mut signal = shutdown.subscribe();
    loop {
        let healthy = client.is_healthy().await;
        let was_connected = session.is_connected();
        session.set_connected(healthy);

        if healthy && !was_connected {
            tracing::info!("Session connected");
            tokio::time::sleep(CONNECT_SETTLE_DELAY).await;
            guestbook.load().await;
        } else if !healthy && was_connected {
            tracing::warn!("Session disconnected, chain unreachable");
        }

        tokio::select! {
            _ = tokio::time::sleep(SESSION_MONITOR_INTERVAL) => {}
            _ = signal.recv() => return,
        }
    }
}
