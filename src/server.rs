// HTTP Server
use crate::execution::TransactionSender;
use crate::handlers;
use crate::price::PriceFeed;
use crate::store::UserStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

// ==================== SHARED STATE ====================
#[derive(Debug, Clone)]
pub struct InvestSettings {
    /// Normalized address that receives every investment transfer.
    pub recipient_address: String,
    pub price_history_days: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub prices: Arc<dyn PriceFeed>,
    pub executor: Arc<dyn TransactionSender>,
    pub users: Arc<dyn UserStore>,
    pub settings: Arc<InvestSettings>,
}

impl AppState {
    pub fn new(
        prices: Arc<dyn PriceFeed>,
        executor: Arc<dyn TransactionSender>,
        users: Arc<dyn UserStore>,
        settings: InvestSettings,
    ) -> Self {
        Self {
            prices,
            executor,
            users,
            settings: Arc::new(settings),
        }
    }
}

// ==================== ROUTES ====================
pub fn create_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/fetchsonicprice", get(handlers::fetch_sonic_price))
        .route("/api/analyze", get(handlers::analyze))
        .route("/api/invest", post(handlers::invest))
        .route("/api/user", post(handlers::upsert_user))
        .route("/api/user/investment", post(handlers::record_investment))
        .route("/api/user/:wallet_address", get(handlers::get_user))
        .route("/api/user/:wallet_address/history", get(handlers::get_user_history))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
