use crate::domain::analysis::round_to;
use crate::quotes::types::{DailyBar, PriceSnapshot};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Medium => "Medium",
            RiskCategory::High => "High",
        }
    }

    pub fn lowercase(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How volatility and expected return are derived. A process runs with exactly one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskPolicy {
    /// Intraday high-low range over the current price; return against the previous close.
    #[default]
    DayRange,
    /// Annualized statistics of one year of daily close-to-close returns.
    Annualized,
}

impl RiskPolicy {
    /// Upper bounds (exclusive) of the Low and Medium buckets.
    pub fn thresholds(&self) -> (f64, f64) {
        match self {
            RiskPolicy::DayRange => (0.02, 0.05),
            RiskPolicy::Annualized => (0.15, 0.35),
        }
    }

    pub fn classify(&self, volatility: f64) -> RiskCategory {
        let (low, medium) = self.thresholds();
        if volatility < low {
            RiskCategory::Low
        } else if volatility < medium {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }
}

impl FromStr for RiskPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "day_range" | "dayrange" | "intraday" => Ok(RiskPolicy::DayRange),
            "annualized" | "annual" => Ok(RiskPolicy::Annualized),
            other => anyhow::bail!("unknown risk policy: {other} (expected day_range or annualized)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub current_price: f64,
    pub volatility: f64,
    pub expected_return: f64,
}

pub fn day_range_metrics(snapshot: &PriceSnapshot) -> Metrics {
    let volatility = round_to((snapshot.high - snapshot.low) / snapshot.current, 3);
    let expected_return = round_to(
        (snapshot.current - snapshot.previous_close) / snapshot.previous_close,
        3,
    );

    Metrics {
        current_price: snapshot.current,
        volatility,
        expected_return,
    }
}

/// Returns `None` when there are fewer than two usable daily returns.
pub fn annualized_metrics(bars: &[DailyBar]) -> Option<Metrics> {
    let returns: Vec<f64> = bars
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect();

    if returns.len() < 2 {
        return None;
    }

    let mean = returns.iter().mean();
    let std_dev = returns.iter().std_dev();
    if !mean.is_finite() || !std_dev.is_finite() {
        return None;
    }

    let current_price = bars.last()?.close;

    Some(Metrics {
        current_price,
        volatility: round_to(std_dev * TRADING_DAYS_PER_YEAR.sqrt(), 3),
        expected_return: round_to((1.0 + mean).powf(TRADING_DAYS_PER_YEAR) - 1.0, 3),
    })
}
