use crate::domain::risk::{Metrics, RiskCategory};
use crate::error::AnalyzeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    /// Accepted for compatibility with existing clients; no computation reads it.
    #[serde(default)]
    pub amount: Option<f64>,
}

impl AnalysisRequest {
    pub fn new(symbol: impl Into<String>, amount: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
        }
    }

    pub fn normalized_symbol(&self) -> Result<String, AnalyzeError> {
        normalize_symbol(&self.symbol)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisResult {
    pub symbol: String,
    pub current_price: f64,
    pub expected_return: f64,
    pub volatility: f64,
    pub risk_category: RiskCategory,
    pub ai_recommendation: String,
}

/// Which sentence template goes into `ai_recommendation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationStyle {
    Summary,
    Advisory,
}

impl RecommendationStyle {
    pub fn render(&self, symbol: &str, risk: RiskCategory, expected_return: f64) -> String {
        let risk = risk.lowercase();
        match self {
            RecommendationStyle::Summary => format!(
                "{symbol} shows {risk} volatility with expected return {:.2}%.",
                expected_return * 100.0
            ),
            RecommendationStyle::Advisory => format!(
                "{symbol} shows {risk} volatility and {:.1}% expected return. \
                 Suitable for {risk}-risk investors. Holding period: 12–18 months.",
                expected_return * 100.0
            ),
        }
    }
}

impl AnalysisResult {
    pub fn build(
        symbol: String,
        metrics: Metrics,
        risk_category: RiskCategory,
        style: RecommendationStyle,
    ) -> Self {
        let ai_recommendation = style.render(&symbol, risk_category, metrics.expected_return);
        Self {
            symbol,
            current_price: round_to(metrics.current_price, 2),
            expected_return: metrics.expected_return,
            volatility: metrics.volatility,
            risk_category,
            ai_recommendation,
        }
    }
}

pub fn normalize_symbol(raw: &str) -> Result<String, AnalyzeError> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(AnalyzeError::BadRequest("symbol must be non-empty".into()));
    }
    // Tickers, share classes, indices and FX pairs: AAPL, BRK.B, ^GSPC, EURUSD=X, RDS-A.
    if let Some(c) = symbol
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(AnalyzeError::BadRequest(format!(
            "symbol contains invalid character {c:?}"
        )));
    }
    Ok(symbol)
}

/// Rounds the exact binary value to `places` decimals, ties to even.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}
