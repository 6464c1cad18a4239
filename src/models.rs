// User & Investment Records
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==================== RISK LEVEL ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Fiat amount suggested for a single investment at this risk level.
    pub fn suggested_investment(&self) -> f64 {
        match self {
            RiskLevel::Low => 100.0,
            RiskLevel::Medium => 50.0,
            RiskLevel::High => 25.0,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk level '{0}' (expected low, medium or high)")]
pub struct ParseRiskLevelError(pub String);

impl FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(ParseRiskLevelError(other.to_string())),
        }
    }
}

// ==================== USER ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRecord {
    pub amount: f64,
    pub risk_level: RiskLevel,
    pub token_price: f64,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub wallet_address: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub investments: Vec<InvestmentRecord>,
}

impl User {
    pub fn new(wallet_address: String, seen_at: DateTime<Utc>, chain_id: Option<String>) -> Self {
        Self {
            wallet_address,
            first_seen: seen_at,
            last_seen: seen_at,
            chain_id,
            investments: Vec::new(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            wallet_address: self.wallet_address.clone(),
            first_seen: self.first_seen,
            last_seen: self.last_seen,
        }
    }
}

/// The subset of a user returned when a wallet connects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub wallet_address: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_parses_case_insensitively() {
        assert_eq!("LOW".parse::<RiskLevel>().unwrap(), RiskLevel::Low);
        assert_eq!(" Medium ".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert!("extreme".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn suggested_investment_shrinks_with_risk() {
        assert!(RiskLevel::Low.suggested_investment() > RiskLevel::Medium.suggested_investment());
        assert!(RiskLevel::Medium.suggested_investment() > RiskLevel::High.suggested_investment());
    }

    #[test]
    fn user_serializes_camel_case() {
        let user = User::new("0xabc".to_string(), Utc::now(), None);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("walletAddress").is_some());
        assert!(json.get("firstSeen").is_some());
        assert!(json.get("chainId").is_none());
        assert_eq!(json["investments"], serde_json::json!([]));
    }
}
