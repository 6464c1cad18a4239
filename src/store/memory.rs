// In-Memory User Store

use super::{StoreError, UserStore};
use crate::models::{InvestmentRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process store used when no database is configured, and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn upsert_user(
        &self,
        wallet_address: &str,
        last_seen: DateTime<Utc>,
        chain_id: Option<String>,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .entry(wallet_address.to_string())
            .and_modify(|user| {
                user.last_seen = last_seen;
                if chain_id.is_some() {
                    user.chain_id = chain_id.clone();
                }
            })
            .or_insert_with(|| User::new(wallet_address.to_string(), last_seen, chain_id.clone()));
        Ok(user.clone())
    }

    async fn append_investment(
        &self,
        wallet_address: &str,
        record: InvestmentRecord,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(wallet_address) {
            Some(user) => {
                user.last_seen = Utc::now();
                user.investments.push(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_user(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(wallet_address).cloned())
    }
}
