pub mod finnhub;
pub mod types;
pub mod yahoo;

use crate::error::AnalyzeError;
use crate::quotes::types::{DailyBar, HistoryRange, PriceSnapshot};
use std::sync::Arc;

/// Result of a single provider attempt.
#[derive(Debug)]
pub enum ProviderOutcome<T> {
    Ready(T),
    /// Soft failure: the next provider in the chain gets a turn.
    Unavailable(String),
    /// Hard failure: the chain stops and the error reaches the caller.
    Fatal(AnalyzeError),
}

impl<T> ProviderOutcome<T> {
    /// Folds a plumbing error (network, status, decode) into a soft failure.
    pub fn from_result(res: anyhow::Result<T>) -> Self {
        match res {
            Ok(v) => ProviderOutcome::Ready(v),
            Err(err) => ProviderOutcome::Unavailable(format!("{err:#}")),
        }
    }
}

#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_snapshot(&self, symbol: &str) -> ProviderOutcome<PriceSnapshot>;
}

#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars in ascending date order.
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> ProviderOutcome<Vec<DailyBar>>;
}

/// History providers double as quote providers: the snapshot is read off the last five sessions.
pub struct HistoryQuotes<H>(pub H);

#[async_trait::async_trait]
impl<H: HistorySource> QuoteSource for HistoryQuotes<H> {
    fn provider_name(&self) -> &'static str {
        self.0.provider_name()
    }

    async fn fetch_snapshot(&self, symbol: &str) -> ProviderOutcome<PriceSnapshot> {
        match self.0.fetch_daily_bars(symbol, HistoryRange::FiveDays).await {
            ProviderOutcome::Ready(bars) => match types::snapshot_from_bars(&bars) {
                Some(snapshot) => ProviderOutcome::Ready(snapshot),
                None => ProviderOutcome::Unavailable(format!(
                    "need at least two daily bars, got {}",
                    bars.len()
                )),
            },
            ProviderOutcome::Unavailable(reason) => ProviderOutcome::Unavailable(reason),
            ProviderOutcome::Fatal(err) => ProviderOutcome::Fatal(err),
        }
    }
}

/// Tries each quote provider in order until one yields a usable snapshot.
pub async fn first_snapshot(
    providers: &[Arc<dyn QuoteSource>],
    symbol: &str,
) -> Result<PriceSnapshot, AnalyzeError> {
    for provider in providers {
        let name = provider.provider_name();
        match provider.fetch_snapshot(symbol).await {
            ProviderOutcome::Ready(snapshot) => match snapshot.unusable_reason() {
                None => {
                    tracing::debug!(provider = name, symbol, "quote snapshot ready");
                    return Ok(snapshot);
                }
                Some(reason) => {
                    tracing::warn!(provider = name, symbol, %reason, "unusable quote; trying next provider");
                }
            },
            ProviderOutcome::Unavailable(reason) => {
                tracing::warn!(provider = name, symbol, %reason, "quote provider unavailable; trying next provider");
            }
            ProviderOutcome::Fatal(err) => {
                tracing::error!(provider = name, symbol, error = %err, "quote provider failed hard");
                return Err(err);
            }
        }
    }

    Err(AnalyzeError::NotFound {
        symbol: symbol.to_string(),
    })
}

/// Tries each history provider in order; `accept` turns bars into a value or rejects them.
pub async fn first_history<T>(
    providers: &[Arc<dyn HistorySource>],
    symbol: &str,
    range: HistoryRange,
    accept: impl Fn(&[DailyBar]) -> Option<T>,
) -> Result<T, AnalyzeError> {
    for provider in providers {
        let name = provider.provider_name();
        match provider.fetch_daily_bars(symbol, range).await {
            ProviderOutcome::Ready(bars) => match accept(&bars) {
                Some(v) => return Ok(v),
                None => {
                    tracing::warn!(provider = name, symbol, bars = bars.len(), "insufficient history; trying next provider");
                }
            },
            ProviderOutcome::Unavailable(reason) => {
                tracing::warn!(provider = name, symbol, %reason, "history provider unavailable; trying next provider");
            }
            ProviderOutcome::Fatal(err) => {
                tracing::error!(provider = name, symbol, error = %err, "history provider failed hard");
                return Err(err);
            }
        }
    }

    Err(AnalyzeError::NotFound {
        symbol: symbol.to_string(),
    })
}
