// Execution Layer
// Dispatches investment transfers as native-value transactions through an alloy provider.

use crate::models::RiskLevel;
use crate::wallet::{ServiceWallet, WalletError};
use alloy_primitives::{Address, U256};
use alloy_provider::network::{Ethereum, EthereumWallet, Network, TransactionBuilder};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use std::str::FromStr;

pub const DEFAULT_SONIC_RPC: &str = "https://rpc.soniclabs.com";
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;
const WEI_PER_TOKEN: f64 = 1e18;

/// What the transaction dispatcher needs to move funds for one investment.
#[derive(Debug, Clone)]
pub struct InvestmentOrder {
    pub amount: f64,
    pub token_price: f64,
    pub recipient: String,
    pub risk_level: RiskLevel,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("invalid RPC url '{url}': {reason}")]
    InvalidRpcUrl { url: String, reason: String },
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),
}

#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Returns the transaction hash of the submitted transfer.
    async fn send_transaction(&self, order: &InvestmentOrder) -> Result<String, ExecutionError>;
}

/// Converts a fiat amount into wei of the native token at the given price.
pub fn fiat_to_wei(amount: f64, token_price: f64) -> Result<U256, ExecutionError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ExecutionError::InvalidOrder(format!("amount must be positive, got {}", amount)));
    }
    if !token_price.is_finite() || token_price <= 0.0 {
        return Err(ExecutionError::InvalidOrder(format!(
            "token price must be positive, got {}",
            token_price
        )));
    }
    let wei = (amount / token_price * WEI_PER_TOKEN).round();
    if !wei.is_finite() || wei < 1.0 || wei >= u128::MAX as f64 {
        return Err(ExecutionError::InvalidOrder(format!("transfer value {} out of range", wei)));
    }
    Ok(U256::from(wei as u128))
}

fn parse_recipient(recipient: &str) -> Result<Address, ExecutionError> {
    Address::from_str(recipient.trim())
        .map_err(|e| ExecutionError::InvalidOrder(format!("invalid recipient '{}': {}", recipient, e)))
}

/// Builds the transfer: plain value send with a fixed gas limit. Nonce, fees and chain id
/// are filled in by the provider.
pub fn transfer_request(
    to: Address,
    value: U256,
    gas_limit: u64,
) -> <Ethereum as Network>::TransactionRequest {
    <Ethereum as Network>::TransactionRequest::default()
        .with_to(to)
        .with_value(value)
        .with_gas_limit(gas_limit)
}

// ==================== EVM SENDER ====================
pub struct EvmTransactionSender {
    provider: DynProvider<Ethereum>,
    sender: Address,
    gas_limit: u64,
}

impl EvmTransactionSender {
    /// Nonces come from a per-account cache so overlapping transfers never reuse one.
    pub fn new(rpc_url: &str, wallet: &ServiceWallet, gas_limit: u64) -> Result<Self, ExecutionError> {
        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            ExecutionError::InvalidRpcUrl {
                url: rpc_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let signer = wallet.signer()?;
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .with_gas_estimation()
            .with_cached_nonce_management()
            .fetch_chain_id()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            sender,
            gas_limit,
        })
    }

    pub fn sender_address(&self) -> String {
        self.sender.to_checksum(None)
    }
}

#[async_trait]
impl TransactionSender for EvmTransactionSender {
    async fn send_transaction(&self, order: &InvestmentOrder) -> Result<String, ExecutionError> {
        let to = parse_recipient(&order.recipient)?;
        let value = fiat_to_wei(order.amount, order.token_price)?;

        tracing::info!(
            "Sending {} wei to {} (amount: {}, price: {}, risk: {})",
            value,
            order.recipient,
            order.amount,
            order.token_price,
            order.risk_level
        );

        let pending = self
            .provider
            .send_transaction(transfer_request(to, value, self.gas_limit))
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;

        let tx_hash = format!("{:#x}", pending.tx_hash());
        tracing::info!("✅ Transfer submitted: {}", tx_hash);
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";

    #[test]
    fn converts_fiat_to_wei() {
        assert_eq!(
            fiat_to_wei(100.0, 0.5).unwrap(),
            U256::from(200_000_000_000_000_000_000u128)
        );
        assert_eq!(fiat_to_wei(1.0, 1.0).unwrap(), U256::from(1_000_000_000_000_000_000u128));
        assert!(fiat_to_wei(0.0, 1.0).is_err());
        assert!(fiat_to_wei(10.0, 0.0).is_err());
        assert!(fiat_to_wei(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn transfer_request_carries_recipient_value_and_gas() {
        let to = parse_recipient("0x000000000000000000000000000000000000dead").unwrap();
        let request = transfer_request(to, U256::from(42u64), DEFAULT_GAS_LIMIT);

        assert_eq!(request.to.and_then(|kind| kind.to().copied()), Some(to));
        assert_eq!(request.value, Some(U256::from(42u64)));
        assert_eq!(request.gas, Some(DEFAULT_GAS_LIMIT));
        assert!(request.nonce.is_none());
    }

    #[test]
    fn rejects_malformed_recipient() {
        assert!(matches!(
            parse_recipient("0x1234"),
            Err(ExecutionError::InvalidOrder(_))
        ));
    }

    #[tokio::test]
    async fn sender_uses_service_wallet_account() {
        let wallet = ServiceWallet::from_hex(KEY).unwrap();
        let sender = EvmTransactionSender::new(DEFAULT_SONIC_RPC, &wallet, DEFAULT_GAS_LIMIT).unwrap();
        assert_eq!(
            sender.sender_address(),
            crate::wallet::to_checksum_address(wallet.address()).unwrap()
        );
    }

    #[tokio::test]
    async fn rejects_invalid_rpc_url() {
        let wallet = ServiceWallet::from_hex(KEY).unwrap();
        assert!(matches!(
            EvmTransactionSender::new("not a url", &wallet, DEFAULT_GAS_LIMIT),
            Err(ExecutionError::InvalidRpcUrl { .. })
        ));
    }
}
