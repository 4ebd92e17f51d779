use crate::config::Settings;
use crate::domain::analysis::{AnalysisRequest, AnalysisResult, RecommendationStyle};
use crate::domain::risk::{annualized_metrics, day_range_metrics, Metrics, RiskPolicy};
use crate::error::AnalyzeError;
use crate::quotes::finnhub::FinnhubClient;
use crate::quotes::types::HistoryRange;
use crate::quotes::yahoo::YahooChartClient;
use crate::quotes::{first_history, first_snapshot, HistoryQuotes, HistorySource, QuoteSource};
use anyhow::Result;
use std::sync::Arc;

/// Turns a ticker into volatility, expected return and a risk bucket.
///
/// Stateless between calls; cloning shares the underlying provider clients.
#[derive(Clone)]
pub struct QuoteAnalyzer {
    quotes: Vec<Arc<dyn QuoteSource>>,
    history: Vec<Arc<dyn HistorySource>>,
    policy: RiskPolicy,
}

impl QuoteAnalyzer {
    pub fn new(
        quotes: Vec<Arc<dyn QuoteSource>>,
        history: Vec<Arc<dyn HistorySource>>,
        policy: RiskPolicy,
    ) -> Self {
        Self {
            quotes,
            history,
            policy,
        }
    }

    /// Finnhub first, Yahoo's recent sessions as the fallback; Yahoo alone for history.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let finnhub = FinnhubClient::from_settings(settings)?;
        let yahoo = YahooChartClient::from_settings(settings)?;

        Ok(Self::new(
            vec![
                Arc::new(finnhub),
                Arc::new(HistoryQuotes(yahoo.clone())),
            ],
            vec![Arc::new(yahoo)],
            settings.risk_policy,
        ))
    }

    pub fn policy(&self) -> RiskPolicy {
        self.policy
    }

    pub async fn analyze(&self, req: &AnalysisRequest) -> Result<AnalysisResult, AnalyzeError> {
        self.run(req, RecommendationStyle::Summary).await
    }

    pub async fn recommend(&self, req: &AnalysisRequest) -> Result<AnalysisResult, AnalyzeError> {
        self.run(req, RecommendationStyle::Advisory).await
    }

    async fn run(
        &self,
        req: &AnalysisRequest,
        style: RecommendationStyle,
    ) -> Result<AnalysisResult, AnalyzeError> {
        let symbol = req.normalized_symbol()?;
        let metrics = self.metrics(&symbol).await?;
        let risk = self.policy.classify(metrics.volatility);

        tracing::info!(
            %symbol,
            policy = ?self.policy,
            volatility = metrics.volatility,
            expected_return = metrics.expected_return,
            risk = %risk,
            "analysis complete"
        );

        Ok(AnalysisResult::build(symbol, metrics, risk, style))
    }

    async fn metrics(&self, symbol: &str) -> Result<Metrics, AnalyzeError> {
        match self.policy {
            RiskPolicy::DayRange => {
                let snapshot = first_snapshot(&self.quotes, symbol).await?;
                Ok(day_range_metrics(&snapshot))
            }
            RiskPolicy::Annualized => {
                first_history(&self.history, symbol, HistoryRange::OneYear, annualized_metrics)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::risk::RiskCategory;
    use crate::quotes::types::{DailyBar, PriceSnapshot};
    use crate::quotes::ProviderOutcome;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Canned {
        Quote(PriceSnapshot),
        Unavailable,
        MissingKey,
    }

    struct FakeQuotes {
        name: &'static str,
        canned: Canned,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl FakeQuotes {
        fn new(name: &'static str, canned: Canned) -> Arc<Self> {
            Arc::new(Self {
                name,
                canned,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl QuoteSource for FakeQuotes {
        fn provider_name(&self) -> &'static str {
            self.name
        }

        async fn fetch_snapshot(&self, symbol: &str) -> ProviderOutcome<PriceSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(symbol.to_string());
            match &self.canned {
                Canned::Quote(s) => ProviderOutcome::Ready(s.clone()),
                Canned::Unavailable => ProviderOutcome::Unavailable("boom".into()),
                Canned::MissingKey => ProviderOutcome::Fatal(AnalyzeError::Configuration(
                    "FINNHUB_API_KEY is required".into(),
                )),
            }
        }
    }

    struct FakeHistory(Vec<DailyBar>);

    #[async_trait::async_trait]
    impl HistorySource for FakeHistory {
        fn provider_name(&self) -> &'static str {
            "fake_history"
        }

        async fn fetch_daily_bars(
            &self,
            _symbol: &str,
            _range: HistoryRange,
        ) -> ProviderOutcome<Vec<DailyBar>> {
            ProviderOutcome::Ready(self.0.clone())
        }
    }

    fn snapshot(current: f64, high: f64, low: f64, previous_close: f64) -> PriceSnapshot {
        PriceSnapshot {
            current,
            high,
            low,
            previous_close,
            as_of: None,
        }
    }

    fn zero_quote() -> Canned {
        Canned::Quote(snapshot(0.0, 0.0, 0.0, 0.0))
    }

    fn day_range(quotes: Vec<Arc<dyn QuoteSource>>) -> QuoteAnalyzer {
        QuoteAnalyzer::new(quotes, vec![], RiskPolicy::DayRange)
    }

    #[tokio::test]
    async fn primary_quote_drives_the_result() {
        let primary = FakeQuotes::new("primary", Canned::Quote(snapshot(150.0, 153.0, 147.0, 148.0)));
        let fallback = FakeQuotes::new("fallback", Canned::Unavailable);
        let analyzer = day_range(vec![primary.clone(), fallback.clone()]);

        let res = analyzer
            .analyze(&AnalysisRequest::new("aapl", Some(1000.0)))
            .await
            .unwrap();

        assert_eq!(res.symbol, "AAPL");
        assert_eq!(res.current_price, 150.0);
        assert_eq!(res.volatility, 0.04);
        assert_eq!(res.expected_return, 0.014);
        assert_eq!(res.risk_category, RiskCategory::Medium);
        assert_eq!(
            res.ai_recommendation,
            "AAPL shows medium volatility with expected return 1.40%."
        );
        assert_eq!(primary.seen.lock().unwrap().as_slice(), ["AAPL".to_string()]);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn zero_price_falls_back_exactly_once() {
        let primary = FakeQuotes::new("primary", zero_quote());
        let fallback = FakeQuotes::new("fallback", Canned::Quote(snapshot(100.0, 101.0, 99.5, 100.0)));
        let analyzer = day_range(vec![primary.clone(), fallback.clone()]);

        let res = analyzer.analyze(&AnalysisRequest::new("msft", None)).await.unwrap();

        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(res.volatility, 0.015);
        assert_eq!(res.expected_return, 0.0);
        assert_eq!(res.risk_category, RiskCategory::Low);
    }

    #[tokio::test]
    async fn both_providers_failing_is_not_found() {
        let primary = FakeQuotes::new("primary", Canned::Unavailable);
        let fallback = FakeQuotes::new("fallback", zero_quote());
        let analyzer = day_range(vec![primary.clone(), fallback.clone()]);

        let err = analyzer
            .analyze(&AnalysisRequest::new("nope", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::NotFound { ref symbol } if symbol == "NOPE"));
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn missing_credential_stops_the_chain() {
        let primary = FakeQuotes::new("primary", Canned::MissingKey);
        let fallback = FakeQuotes::new("fallback", Canned::Quote(snapshot(100.0, 101.0, 99.0, 100.0)));
        let analyzer = day_range(vec![primary, fallback.clone()]);

        let err = analyzer
            .analyze(&AnalysisRequest::new("AAPL", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::Configuration(_)));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn empty_symbol_is_rejected_without_provider_calls() {
        let primary = FakeQuotes::new("primary", Canned::Unavailable);
        let analyzer = day_range(vec![primary.clone()]);

        let err = analyzer
            .analyze(&AnalysisRequest::new("  ", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::BadRequest(_)));
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn recommend_uses_advisory_wording() {
        let primary = FakeQuotes::new("primary", Canned::Quote(snapshot(200.0, 215.0, 195.0, 190.0)));
        let analyzer = day_range(vec![primary]);

        let res = analyzer
            .recommend(&AnalysisRequest::new("nvda", None))
            .await
            .unwrap();

        assert_eq!(res.volatility, 0.1);
        assert_eq!(res.expected_return, 0.053);
        assert_eq!(res.risk_category, RiskCategory::High);
        assert_eq!(
            res.ai_recommendation,
            "NVDA shows high volatility and 5.3% expected return. \
             Suitable for high-risk investors. Holding period: 12–18 months."
        );
    }

    #[tokio::test]
    async fn annualized_policy_reads_history_only() {
        let quotes = FakeQuotes::new("primary", Canned::Unavailable);
        let bars = (2..=6)
            .map(|d| DailyBar {
                date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
                high: 50.0,
                low: 50.0,
                close: 50.0,
            })
            .collect();
        let analyzer = QuoteAnalyzer::new(
            vec![quotes.clone()],
            vec![Arc::new(FakeHistory(bars))],
            RiskPolicy::Annualized,
        );

        let res = analyzer.analyze(&AnalysisRequest::new("spy", None)).await.unwrap();

        assert_eq!(quotes.calls(), 0);
        assert_eq!(res.current_price, 50.0);
        assert_eq!(res.volatility, 0.0);
        assert_eq!(res.risk_category, RiskCategory::Low);
        assert_eq!(
            res.ai_recommendation,
            "SPY shows low volatility with expected return 0.00%."
        );
    }

    #[tokio::test]
    async fn annualized_policy_with_short_history_is_not_found() {
        let analyzer = QuoteAnalyzer::new(
            vec![],
            vec![Arc::new(FakeHistory(vec![]))],
            RiskPolicy::Annualized,
        );

        let err = analyzer
            .analyze(&AnalysisRequest::new("new", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::NotFound { .. }));
    }
}
