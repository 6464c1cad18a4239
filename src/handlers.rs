// API Handlers
use crate::error::ApiError;
use crate::execution::InvestmentOrder;
use crate::history::{self, HistorySummary};
use crate::models::{InvestmentRecord, RiskLevel, User, UserProfile};
use crate::server::AppState;
use crate::token_analysis::{self, TokenAnalysis};
use crate::wallet;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== DATA STRUCTURES ====================
#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub success: bool,
    pub price: f64,
    pub currency: String,
    pub token_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub token_id: String,
    pub analysis: TokenAnalysis,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestRequest {
    pub amount: Option<serde_json::Value>,
    pub risk_level: Option<String>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestResponse {
    pub success: bool,
    pub message: String,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    pub wallet_address: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub chain_id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentInput {
    pub amount: f64,
    pub risk_level: RiskLevel,
    pub token_price: f64,
    pub transaction_hash: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInvestmentRequest {
    pub wallet_address: Option<String>,
    pub investment: Option<InvestmentInput>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub success: bool,
    pub wallet_address: String,
    pub investments: Vec<InvestmentRecord>,
    pub summary: HistorySummary,
}

// ==================== VALIDATION ====================

/// Accepts a JSON number or a numeric string; the amount must be finite and positive.
pub fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

fn parse_wallet(address: &str) -> Result<String, ApiError> {
    wallet::normalize_address(address).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Chain ids are stored as `0x`-prefixed lower-case hex, the form wallets report.
/// Accepts a JSON number, a decimal string or a hex string.
fn normalize_chain_id(value: &serde_json::Value) -> Result<Option<u64>, ApiError> {
    let invalid = || ApiError::bad_request(format!("Invalid chain id: {}", value));
    let chain_id = match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Number(n) => n.as_u64().ok_or_else(invalid)?,
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| invalid())?,
                None => s.parse::<u64>().map_err(|_| invalid())?,
            }
        }
        _ => return Err(invalid()),
    };
    Ok(Some(chain_id))
}

fn chain_id_string(value: &serde_json::Value) -> Result<Option<String>, ApiError> {
    Ok(normalize_chain_id(value)?.map(|id| format!("0x{:x}", id)))
}

// ==================== PRICE & ANALYSIS ====================
pub async fn health_check() -> &'static str {
    "Investment service healthy ✅"
}

pub async fn fetch_sonic_price(State(state): State<AppState>) -> Result<Json<PriceResponse>, ApiError> {
    let quote = state
        .prices
        .current_price()
        .await
        .map_err(|e| ApiError::internal("Failed to fetch Sonic price", e))?;

    Ok(Json(PriceResponse {
        success: true,
        price: quote.price,
        currency: quote.currency,
        token_id: quote.token_id,
        timestamp: quote.timestamp,
    }))
}

pub async fn analyze(State(state): State<AppState>) -> Result<Json<AnalyzeResponse>, ApiError> {
    let history = state
        .prices
        .price_history(state.settings.price_history_days)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch price history", e))?;

    let analysis = token_analysis::analyze_token_risk(&history)
        .map_err(|e| ApiError::internal("Failed to analyze token", e))?;

    tracing::info!(
        "Analysis for {}: {} risk, MA {:.6}, suggested {}",
        state.prices.token_id(),
        analysis.risk_level,
        analysis.moving_average,
        analysis.suggested_investment
    );

    Ok(Json(AnalyzeResponse {
        success: true,
        token_id: state.prices.token_id().to_string(),
        analysis,
        timestamp: Utc::now(),
    }))
}

// ==================== INVESTMENT ====================
pub async fn invest(
    State(state): State<AppState>,
    payload: Result<Json<InvestRequest>, JsonRejection>,
) -> Result<Json<InvestResponse>, ApiError> {
    let Json(request) = payload?;

    let (Some(amount), Some(risk_level)) = (request.amount.as_ref(), request.risk_level.as_deref()) else {
        return Err(ApiError::bad_request("Amount and risk level are required"));
    };
    let amount = parse_amount(amount)
        .ok_or_else(|| ApiError::bad_request("Amount must be a positive number"))?;
    let risk_level = risk_level
        .parse::<RiskLevel>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let wallet_address = match request.wallet_address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => Some(parse_wallet(address)?),
        _ => None,
    };

    let quote = state
        .prices
        .current_price()
        .await
        .map_err(|e| ApiError::internal("Investment failed", e))?;

    let order = InvestmentOrder {
        amount,
        token_price: quote.price,
        recipient: state.settings.recipient_address.clone(),
        risk_level,
    };
    let transaction_hash = state
        .executor
        .send_transaction(&order)
        .await
        .map_err(|e| ApiError::internal("Investment failed", e))?;

    let timestamp = Utc::now();
    if let Some(address) = wallet_address {
        let record = InvestmentRecord {
            amount,
            risk_level,
            token_price: quote.price,
            transaction_hash: transaction_hash.clone(),
            timestamp,
        };
        // The transfer already happened; a failed write must not turn it into an error.
        match state.users.append_investment(&address, record).await {
            Ok(true) => tracing::info!("Recorded investment for {}", address),
            Ok(false) => tracing::warn!("Investment by unknown wallet {} not recorded", address),
            Err(e) => tracing::warn!("Failed to record investment for {}: {}", address, e),
        }
    }

    Ok(Json(InvestResponse {
        success: true,
        message: format!("Investment of {} at {} risk submitted", amount, risk_level),
        transaction_hash,
        timestamp,
    }))
}

// ==================== USERS ====================
pub async fn upsert_user(
    State(state): State<AppState>,
    payload: Result<Json<UpsertUserRequest>, JsonRejection>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let Json(request) = payload?;

    let address = request
        .wallet_address
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Wallet address is required"))?;
    let address = parse_wallet(address)?;

    let last_seen = request.last_seen.unwrap_or_else(Utc::now);
    let chain_id = match &request.chain_id {
        Some(value) => chain_id_string(value)?,
        None => None,
    };

    let user = state
        .users
        .upsert_user(&address, last_seen, chain_id)
        .await
        .map_err(|e| ApiError::internal("Failed to save user", e))?;

    tracing::info!("User {} seen (first seen {})", user.wallet_address, user.first_seen);
    Ok(Json(UserProfileResponse {
        success: true,
        user: user.profile(),
    }))
}

pub async fn record_investment(
    State(state): State<AppState>,
    payload: Result<Json<RecordInvestmentRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;

    let (Some(address), Some(investment)) = (request.wallet_address, request.investment) else {
        return Err(ApiError::bad_request("Wallet address and investment are required"));
    };
    let address = parse_wallet(&address)?;

    if !investment.amount.is_finite() || investment.amount <= 0.0 {
        return Err(ApiError::bad_request("Investment amount must be a positive number"));
    }
    if !investment.token_price.is_finite() || investment.token_price <= 0.0 {
        return Err(ApiError::bad_request("Token price must be a positive number"));
    }
    if investment.transaction_hash.trim().is_empty() {
        return Err(ApiError::bad_request("Transaction hash is required"));
    }

    let record = InvestmentRecord {
        amount: investment.amount,
        risk_level: investment.risk_level,
        token_price: investment.token_price,
        transaction_hash: investment.transaction_hash.trim().to_string(),
        timestamp: investment.timestamp.unwrap_or_else(Utc::now),
    };

    let recorded = state
        .users
        .append_investment(&address, record)
        .await
        .map_err(|e| ApiError::internal("Failed to record investment", e))?;
    if !recorded {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "Investment recorded".to_string(),
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let address = parse_wallet(&wallet_address)?;
    let user = state
        .users
        .find_user(&address)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse { success: true, user }))
}

pub async fn get_user_history(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let address = parse_wallet(&wallet_address)?;
    let user = state
        .users
        .find_user(&address)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let summary = history::summarize(&user.investments);
    Ok(Json(HistoryResponse {
        success: true,
        wallet_address: user.wallet_address,
        investments: user.investments,
        summary,
    }))
}
