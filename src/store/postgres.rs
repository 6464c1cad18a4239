// Postgres User Store

use super::{StoreError, UserStore};
use crate::models::{InvestmentRecord, RiskLevel, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        wallet_address TEXT PRIMARY KEY,
        first_seen TIMESTAMPTZ NOT NULL,
        last_seen TIMESTAMPTZ NOT NULL,
        chain_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS investments (
        id BIGSERIAL PRIMARY KEY,
        wallet_address TEXT NOT NULL REFERENCES users (wallet_address),
        amount DOUBLE PRECISION NOT NULL,
        risk_level TEXT NOT NULL,
        token_price DOUBLE PRECISION NOT NULL,
        transaction_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS investments_wallet_idx ON investments (wallet_address, id)",
];

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    wallet_address: String,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    chain_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct InvestmentRow {
    amount: f64,
    risk_level: String,
    token_price: f64,
    transaction_hash: String,
    created_at: DateTime<Utc>,
}

impl InvestmentRow {
    fn into_record(self, wallet_address: &str) -> Result<InvestmentRecord, StoreError> {
        let risk_level = self
            .risk_level
            .parse::<RiskLevel>()
            .map_err(|e| StoreError::Corrupt {
                wallet_address: wallet_address.to_string(),
                reason: e.to_string(),
            })?;
        Ok(InvestmentRecord {
            amount: self.amount,
            risk_level,
            token_price: self.token_price,
            transaction_hash: self.transaction_hash,
            timestamp: self.created_at,
        })
    }
}

/// Postgres-backed store. Addresses are stored already normalized, so the primary key
/// doubles as the case-insensitive uniqueness constraint.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn initialize(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }

    async fn load_investments(&self, wallet_address: &str) -> Result<Vec<InvestmentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, InvestmentRow>(
            r#"
            SELECT amount, risk_level, token_price, transaction_hash, created_at
            FROM investments
            WHERE wallet_address = $1
            ORDER BY id
            "#,
        )
        .bind(wallet_address)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.into_record(wallet_address))
            .collect()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn upsert_user(
        &self,
        wallet_address: &str,
        last_seen: DateTime<Utc>,
        chain_id: Option<String>,
    ) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (wallet_address, first_seen, last_seen, chain_id)
            VALUES ($1, $2, $2, $3)
            ON CONFLICT (wallet_address) DO UPDATE
            SET last_seen = EXCLUDED.last_seen,
                chain_id = COALESCE(EXCLUDED.chain_id, users.chain_id)
            RETURNING wallet_address, first_seen, last_seen, chain_id
            "#,
        )
        .bind(wallet_address)
        .bind(last_seen)
        .bind(chain_id)
        .fetch_one(&self.pool)
        .await?;

        let investments = self.load_investments(wallet_address).await?;
        Ok(User {
            wallet_address: row.wallet_address,
            first_seen: row.first_seen,
            last_seen: row.last_seen,
            chain_id: row.chain_id,
            investments,
        })
    }

    async fn append_investment(
        &self,
        wallet_address: &str,
        record: InvestmentRecord,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE users SET last_seen = $2 WHERE wallet_address = $1")
            .bind(wallet_address)
            .bind(Utc::now())
            .execute(&mut tx)
            .await?
            .rows_affected();
        if touched == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO investments
            (wallet_address, amount, risk_level, token_price, transaction_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(wallet_address)
        .bind(record.amount)
        .bind(record.risk_level.as_str())
        .bind(record.token_price)
        .bind(&record.transaction_hash)
        .bind(record.timestamp)
        .execute(&mut tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_user(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT wallet_address, first_seen, last_seen, chain_id FROM users WHERE wallet_address = $1",
        )
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let investments = self.load_investments(wallet_address).await?;
        Ok(Some(User {
            wallet_address: row.wallet_address,
            first_seen: row.first_seen,
            last_seen: row.last_seen,
            chain_id: row.chain_id,
            investments,
        }))
    }
}
