use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use finance_sim::{
    account::repository::AccountRepository,
    auth::{
        controller::AuthController, repository::AuthRepository, service::AuthService,
        session::SessionStore,
    },
    config::Config,
    db::Database,
    ledger::repository::LedgerRepository,
    quote::client::IexClient,
    server::Server,
    trade::{controller::TradeController, service::TradeService},
};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load config")?;
    let database = Database::connect(&config.database_url)
        .await
        .context("Failed to open database")?;

    let sessions = Arc::new(SessionStore::new(
        &config.session_secret,
        chrono::Duration::hours(config.session_ttl_hours),
    ));
    let auth_repository = AuthRepository::new(database.pool.clone())
        .await
        .context("Failed create repo")?;
    let auth = AuthController::new(AuthService::new(
        auth_repository,
        sessions,
        config.starting_cash,
    ));

    let quotes = Arc::new(IexClient::new(
        config.quote_api_url.clone(),
        config.api_key.clone(),
        Duration::from_secs(config.quote_timeout_secs),
    ));
    let trade = TradeController::new(TradeService::new(
        AccountRepository::new(database.pool.clone()),
        LedgerRepository::new(database.pool.clone()),
        quotes,
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    Server::new(Arc::new(auth), Arc::new(trade), config.bind_addr.clone())
        .start(shutdown_rx)
        .await?;
    database.pool.close().await;
    Ok(())
}
