// Shared fixtures for the HTTP API tests: stub collaborators and request helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sonic_invest::{
    create_router,
    execution::{ExecutionError, InvestmentOrder, TransactionSender},
    models::{InvestmentRecord, User},
    price::{PriceError, PriceFeed, TokenQuote},
    store::{MemoryUserStore, StoreError, UserStore},
    AppState, InvestSettings,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TOKEN_ID: &str = "sonic-3";
pub const RECIPIENT: &str = "0x000000000000000000000000000000000000dead";
pub const WALLET_UPPER: &str = "0xABCDEF0123456789ABCDEF0123456789ABCDEF01";
pub const WALLET_LOWER: &str = "0xabcdef0123456789abcdef0123456789abcdef01";
pub const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

// ==================== STUBS ====================
pub struct StubPriceFeed {
    pub price: f64,
    pub history: Vec<f64>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubPriceFeed {
    pub fn new(price: f64, history: Vec<f64>) -> Self {
        Self {
            price,
            history,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0.0, Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for StubPriceFeed {
    fn token_id(&self) -> &str {
        TOKEN_ID
    }

    async fn current_price(&self) -> Result<TokenQuote, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PriceError::EmptyHistory(TOKEN_ID.to_string()));
        }
        Ok(TokenQuote {
            token_id: TOKEN_ID.to_string(),
            currency: "usd".to_string(),
            price: self.price,
            timestamp: Utc::now(),
        })
    }

    async fn price_history(&self, _days: u32) -> Result<Vec<f64>, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PriceError::EmptyHistory(TOKEN_ID.to_string()));
        }
        Ok(self.history.clone())
    }
}

#[derive(Default)]
pub struct StubSender {
    pub fail: bool,
    pub orders: Mutex<Vec<InvestmentOrder>>,
}

impl StubSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn last_order(&self) -> Option<InvestmentOrder> {
        self.orders.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TransactionSender for StubSender {
    async fn send_transaction(&self, order: &InvestmentOrder) -> Result<String, ExecutionError> {
        self.orders.lock().unwrap().push(order.clone());
        if self.fail {
            return Err(ExecutionError::InvalidOrder("insufficient funds".to_string()));
        }
        Ok(TX_HASH.to_string())
    }
}

/// Store whose writes always fail; reads see nothing.
pub struct BrokenStore;

#[async_trait]
impl UserStore for BrokenStore {
    async fn upsert_user(
        &self,
        wallet_address: &str,
        _last_seen: DateTime<Utc>,
        _chain_id: Option<String>,
    ) -> Result<User, StoreError> {
        Err(StoreError::Corrupt {
            wallet_address: wallet_address.to_string(),
            reason: "disk full".to_string(),
        })
    }

    async fn append_investment(
        &self,
        wallet_address: &str,
        _record: InvestmentRecord,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Corrupt {
            wallet_address: wallet_address.to_string(),
            reason: "disk full".to_string(),
        })
    }

    async fn find_user(&self, _wallet_address: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }
}

// ==================== APP ====================
pub struct TestApp {
    pub router: Router,
    pub prices: Arc<StubPriceFeed>,
    pub sender: Arc<StubSender>,
    pub store: MemoryUserStore,
}

pub fn default_history() -> Vec<f64> {
    vec![0.50, 0.51, 0.49, 0.50, 0.52, 0.50, 0.49, 0.51, 0.50]
}

pub fn build_app(prices: StubPriceFeed, sender: StubSender) -> TestApp {
    let prices = Arc::new(prices);
    let sender = Arc::new(sender);
    let store = MemoryUserStore::new();
    let router = router_with(prices.clone(), sender.clone(), Arc::new(store.clone()));
    TestApp {
        router,
        prices,
        sender,
        store,
    }
}

pub fn test_app() -> TestApp {
    build_app(StubPriceFeed::new(0.5, default_history()), StubSender::default())
}

pub fn router_with(
    prices: Arc<StubPriceFeed>,
    sender: Arc<StubSender>,
    users: Arc<dyn UserStore>,
) -> Router {
    let state = AppState::new(
        prices,
        sender,
        users,
        InvestSettings {
            recipient_address: RECIPIENT.to_string(),
            price_history_days: 30,
        },
    );
    create_router(state, "public")
}

// ==================== REQUESTS ====================
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(router, uri, body.to_string()).await
}

pub async fn post_raw(router: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}
