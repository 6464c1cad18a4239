// User Store
// Per-wallet user records with an append-only investment history.

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::models::{InvestmentRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record for {wallet_address}: {reason}")]
    Corrupt {
        wallet_address: String,
        reason: String,
    },
}

/// Addresses passed to a store are already normalized (see `wallet::normalize_address`).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the user on first contact, otherwise refreshes `last_seen` (and `chain_id` when given).
    async fn upsert_user(
        &self,
        wallet_address: &str,
        last_seen: DateTime<Utc>,
        chain_id: Option<String>,
    ) -> Result<User, StoreError>;

    /// Appends to an existing user's history. Returns `false` without creating anything
    /// when the wallet is unknown.
    async fn append_investment(
        &self,
        wallet_address: &str,
        record: InvestmentRecord,
    ) -> Result<bool, StoreError>;

    async fn find_user(&self, wallet_address: &str) -> Result<Option<User>, StoreError>;
}
