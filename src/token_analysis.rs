// Token Risk Analysis
// Turns a recent price series into a moving average, a risk tier and a suggested allocation.

use crate::models::RiskLevel;
use serde::Serialize;

pub const MOVING_AVERAGE_WINDOW: usize = 7;

/// Deviation from the moving average (as a fraction) below which the token counts as low risk.
pub const LOW_RISK_DEVIATION: f64 = 0.05;
/// Deviation below which the token counts as medium risk; anything above is high.
pub const MEDIUM_RISK_DEVIATION: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAnalysis {
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub suggested_investment: f64,
    pub moving_average: f64,
    pub current_price: f64,
    pub deviation_percent: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("price series is empty")]
    EmptySeries,
    #[error("price series contains a non-finite value at index {0}")]
    NonFinitePrice(usize),
    #[error("moving average {0} is not positive")]
    NonPositiveAverage(f64),
}

// ==================== CORE LOGIC ====================

/// Arithmetic mean of the trailing `window` prices (or of all prices when fewer are available).
pub fn moving_average(prices: &[f64], window: usize) -> Option<f64> {
    if prices.is_empty() || window == 0 {
        return None;
    }
    let start = prices.len().saturating_sub(window);
    let tail = &prices[start..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

pub fn classify_deviation(deviation: f64) -> RiskLevel {
    let magnitude = deviation.abs();
    if magnitude < LOW_RISK_DEVIATION {
        RiskLevel::Low
    } else if magnitude < MEDIUM_RISK_DEVIATION {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn recommendation_for(risk_level: RiskLevel) -> &'static str {
    match risk_level {
        RiskLevel::Low => "Price is trading close to its moving average. A standard position is reasonable.",
        RiskLevel::Medium => "Price is drifting away from its moving average. Consider a reduced position.",
        RiskLevel::High => "Price is far from its moving average. Only a small speculative position is advised.",
    }
}

/// Analyze a price series ordered oldest first; the last element is the current price.
pub fn analyze_token_risk(prices: &[f64]) -> Result<TokenAnalysis, AnalysisError> {
    if prices.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    if let Some(idx) = prices.iter().position(|p| !p.is_finite()) {
        return Err(AnalysisError::NonFinitePrice(idx));
    }

    let moving_average =
        moving_average(prices, MOVING_AVERAGE_WINDOW).ok_or(AnalysisError::EmptySeries)?;
    if moving_average <= 0.0 {
        return Err(AnalysisError::NonPositiveAverage(moving_average));
    }

    let current_price = prices[prices.len() - 1];
    let deviation = (current_price - moving_average) / moving_average;
    let risk_level = classify_deviation(deviation);

    Ok(TokenAnalysis {
        risk_level,
        recommendation: recommendation_for(risk_level).to_string(),
        suggested_investment: risk_level.suggested_investment(),
        moving_average,
        current_price,
        deviation_percent: deviation * 100.0,
        sample_size: prices.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_uses_trailing_window() {
        let prices = [100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(moving_average(&prices, 7), Some(4.0));
        assert_eq!(moving_average(&[2.0, 4.0], 7), Some(3.0));
        assert_eq!(moving_average(&[], 7), None);
    }

    #[test]
    fn flat_series_is_low_risk() {
        let analysis = analyze_token_risk(&[0.5; 10]).unwrap();
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert_eq!(analysis.suggested_investment, 100.0);
        assert_eq!(analysis.moving_average, 0.5);
        assert_eq!(analysis.deviation_percent, 0.0);
    }

    #[test]
    fn moderate_move_is_medium_risk() {
        // MA of the last 7 = (6 * 1.0 + 1.1) / 7
        let mut prices = vec![1.0; 9];
        prices.push(1.1);
        let analysis = analyze_token_risk(&prices).unwrap();
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.suggested_investment, 50.0);
    }

    #[test]
    fn sharp_drop_is_high_risk() {
        let prices = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5];
        let analysis = analyze_token_risk(&prices).unwrap();
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert_eq!(analysis.suggested_investment, 25.0);
        assert!(analysis.deviation_percent < 0.0);
    }

    #[test]
    fn same_series_gives_same_result() {
        let prices = [0.71, 0.69, 0.73, 0.75, 0.70, 0.68, 0.72, 0.74];
        assert_eq!(analyze_token_risk(&prices), analyze_token_risk(&prices));
    }

    #[test]
    fn rejects_empty_and_degenerate_series() {
        assert_eq!(analyze_token_risk(&[]), Err(AnalysisError::EmptySeries));
        assert_eq!(
            analyze_token_risk(&[1.0, f64::NAN]),
            Err(AnalysisError::NonFinitePrice(1))
        );
        assert!(matches!(
            analyze_token_risk(&[0.0, 0.0]),
            Err(AnalysisError::NonPositiveAverage(_))
        ));
    }
}
