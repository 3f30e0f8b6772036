//! hostwake - Telegram bot for waking, shutting down and querying one PC.
//!
//! Configuration comes from command line flags or the environment; see
//! `hostwake --help`.

mod config;
mod health;
mod telegram;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hostwake_control::{ConversationEngine, HostRegistry, HostServices};
use hostwake_core::{Role, Username};
use hostwake_host::{LanPowerController, PingProber, ShellLocalInfo, SshSessionClient};
use hostwake_store::{Directory, RocksStore};
use teloxide::Bot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hostwake=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hostwake");

    let store = Arc::new(
        RocksStore::open(&args.data_dir)
            .with_context(|| format!("failed to open store at {}", args.data_dir.display()))?,
    );
    tracing::info!(data_dir = %args.data_dir.display(), "Initialized RocksDB store");

    if let Some(admin) = args.admin_to_bootstrap()? {
        bootstrap_admin(store.as_ref(), &admin)?;
    }

    let registry = HostRegistry::load(Arc::clone(&store), args.host_target()?)
        .context("failed to load host settings")?;

    let ssh = Arc::new(SshSessionClient::new(args.ssh_config()));
    let host = HostServices {
        prober: Arc::new(PingProber::new(args.probe_config())),
        power: Arc::new(LanPowerController::new(args.wake_config(), Arc::clone(&ssh))),
        remote: ssh,
        local: Arc::new(ShellLocalInfo::default()),
    };

    let engine = Arc::new(ConversationEngine::with_defaults(
        Arc::clone(&store),
        registry,
        host,
    ));

    if let Some(listen_addr) = args.listen_addr.clone() {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            if let Err(e) = health::serve(listen_addr, store).await {
                tracing::error!(error = %e, "Health server stopped");
            }
        });
    }

    telegram::run(Bot::new(args.bot_token), engine).await;

    tracing::info!("hostwake stopped");
    Ok(())
}

/// Grant the admin role to `username` unless it already has it.
fn bootstrap_admin<D: Directory>(directory: &D, username: &Username) -> anyhow::Result<()> {
    let existing = directory.get_user(username)?;
    if existing.is_some_and(|record| record.role == Role::Admin) {
        return Ok(());
    }

    directory
        .put_user(username, Role::Admin)
        .context("failed to bootstrap admin")?;
    tracing::info!(username = %username, "Bootstrapped admin");
    Ok(())
}
