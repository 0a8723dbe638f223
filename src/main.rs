use {
    clap::Parser,
    std::path::PathBuf,
    tracing_subscriber::EnvFilter,
    wallet_sync::{
        domain::sync,
        infra::{config, rpc},
    },
};

/// Keeps a local view of wallet accounts and token balances in sync with a
/// JSON-RPC node and polls submitted transactions until they are observed.
#[derive(Parser)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "WALLET_SYNC_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = config::load(&args.config).await;
    let client = rpc::Client::new(rpc::Config {
        endpoint: config.node_url.clone(),
    })?;
    let sync = sync::Sync::new(
        client,
        sync::Config {
            concurrent_requests: config.concurrent_requests,
            native_symbol: config.native_symbol.clone(),
        },
    );

    sync.load_accounts().await?;
    sync.load_token_list().await?;

    let snapshot = sync.snapshot().await;
    tracing::info!(
        accounts = snapshot.accounts.len(),
        tokens = snapshot.tokens.len(),
        "initial synchronization complete"
    );

    // The tracker has no internal scheduler; this process owns the timer.
    let mut interval = tokio::time::interval(config.poll_interval);
    loop {
        tokio::select! {
            _ = interval.tick() => sync.refresh_transactions().await,
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
