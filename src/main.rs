// Sonic Investment Service
// File: src/main.rs

use anyhow::Context;
use sonic_invest::{
    config::Config,
    create_router,
    execution::{EvmTransactionSender, TransactionSender},
    price::{CoinGeckoClient, PriceFeed},
    store::{MemoryUserStore, PgUserStore, UserStore},
    AppState, InvestSettings,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🚀 Starting Sonic investment service...");

    let config = Config::from_env().context("Invalid configuration")?;

    let prices: Arc<dyn PriceFeed> = Arc::new(
        CoinGeckoClient::new(&config.coingecko_api_url, &config.token_id, &config.currency)
            .context("Failed to build price client")?,
    );

    let service_wallet = config
        .service_key
        .load()
        .context("Failed to load service wallet")?;
    let sender = EvmTransactionSender::new(&config.rpc_url, &service_wallet, config.gas_limit)
        .context("Failed to build transaction sender")?;
    tracing::info!("🔗 RPC: {}", config.rpc_url);
    tracing::info!("👛 Service wallet: {}", sender.sender_address());
    tracing::info!("🎯 Recipient: {}", config.recipient_address);
    let executor: Arc<dyn TransactionSender> = Arc::new(sender);

    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let store = PgUserStore::connect(url, config.database_max_connections)
                .await
                .context("Failed to connect to database")?;
            store
                .initialize()
                .await
                .context("Failed to initialize database")?;
            tracing::info!("🗄️ Using Postgres user store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, user records are kept in memory only");
            Arc::new(MemoryUserStore::new())
        }
    };

    let state = AppState::new(
        prices,
        executor,
        users,
        InvestSettings {
            recipient_address: config.recipient_address.clone(),
            price_history_days: config.price_history_days,
        },
    );
    let app = create_router(state, &config.static_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("✅ Investment service running on {}", addr);
    tracing::info!("📁 Serving client from {}", config.static_dir.display());

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
