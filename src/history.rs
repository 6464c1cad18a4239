// Investment History Module
use crate::models::{InvestmentRecord, RiskLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskBreakdown {
    pub risk_level: RiskLevel,
    pub count: usize,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_investments: usize,
    pub total_invested: f64,
    /// Amount-weighted average token price across all investments.
    pub average_entry_price: f64,
    pub by_risk_level: Vec<RiskBreakdown>,
    pub first_investment: Option<DateTime<Utc>>,
    pub last_investment: Option<DateTime<Utc>>,
}

pub fn summarize(records: &[InvestmentRecord]) -> HistorySummary {
    let total_invested: f64 = records.iter().map(|r| r.amount).sum();
    let weighted_price: f64 = records.iter().map(|r| r.amount * r.token_price).sum();

    let average_entry_price = if total_invested > 0.0 {
        weighted_price / total_invested
    } else {
        0.0
    };

    let by_risk_level = RiskLevel::ALL
        .iter()
        .map(|level| {
            let matching = records.iter().filter(|r| r.risk_level == *level);
            RiskBreakdown {
                risk_level: *level,
                count: matching.clone().count(),
                total_amount: matching.map(|r| r.amount).sum(),
            }
        })
        .collect();

    HistorySummary {
        total_investments: records.len(),
        total_invested,
        average_entry_price,
        by_risk_level,
        first_investment: records.iter().map(|r| r.timestamp).min(),
        last_investment: records.iter().map(|r| r.timestamp).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(amount: f64, risk_level: RiskLevel, token_price: f64, at: DateTime<Utc>) -> InvestmentRecord {
        InvestmentRecord {
            amount,
            risk_level,
            token_price,
            transaction_hash: format!("0x{:064x}", amount as u64),
            timestamp: at,
        }
    }

    #[test]
    fn empty_history() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_investments, 0);
        assert_eq!(summary.total_invested, 0.0);
        assert_eq!(summary.average_entry_price, 0.0);
        assert!(summary.first_investment.is_none());
        assert_eq!(summary.by_risk_level.len(), 3);
        assert!(summary.by_risk_level.iter().all(|b| b.count == 0));
    }

    #[test]
    fn totals_and_weighted_price() {
        let now = Utc::now();
        let records = vec![
            record(100.0, RiskLevel::Low, 0.5, now - Duration::days(2)),
            record(50.0, RiskLevel::Medium, 1.0, now - Duration::days(1)),
            record(50.0, RiskLevel::Low, 1.0, now),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.total_investments, 3);
        assert_eq!(summary.total_invested, 200.0);
        assert_eq!(summary.average_entry_price, 0.75);
        assert_eq!(summary.first_investment, Some(now - Duration::days(2)));
        assert_eq!(summary.last_investment, Some(now));

        let low = &summary.by_risk_level[0];
        assert_eq!((low.risk_level, low.count, low.total_amount), (RiskLevel::Low, 2, 150.0));
        let high = &summary.by_risk_level[2];
        assert_eq!(high.count, 0);
    }
}
