use crate::config::Settings;
use crate::quotes::types::{DailyBar, HistoryRange};
use crate::quotes::{HistorySource, ProviderOutcome};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

// The chart endpoint rejects requests without a browser-like agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct YahooChartClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .yahoo_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings.yahoo_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build Yahoo http client")?;

        Ok(Self { http, base_url })
    }

    /// The symbol is pushed as one percent-encoded segment so it cannot alter the path.
    fn url(&self, symbol: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&format!(
            "{}/v8/finance/chart",
            self.base_url.trim_end_matches('/')
        ))
        .with_context(|| format!("invalid Yahoo base url: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Yahoo base url cannot carry a path: {}", self.base_url))?
            .push(symbol);
        Ok(url)
    }

    async fn fetch_chart(&self, symbol: &str, range: HistoryRange) -> Result<Vec<DailyBar>> {
        let res = self
            .http
            .get(self.url(symbol)?)
            .query(&[("range", range.as_query()), ("interval", "1d")])
            .send()
            .await
            .context("Yahoo chart request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Yahoo chart response")?;

        if !status.is_success() {
            anyhow::bail!("Yahoo chart HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<ChartEnvelope>(&text)
            .with_context(|| format!("Yahoo chart response is not valid: {text}"))?;
        parsed.into_bars()
    }
}

#[async_trait::async_trait]
impl HistorySource for YahooChartClient {
    fn provider_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> ProviderOutcome<Vec<DailyBar>> {
        ProviderOutcome::from_result(self.fetch_chart(symbol, range).await)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartEnvelope {
    fn into_bars(self) -> Result<Vec<DailyBar>> {
        if let Some(err) = self.chart.error {
            anyhow::bail!("Yahoo chart error {}: {}", err.code, err.description);
        }

        let result = self
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .context("Yahoo chart response has no result")?;
        let series = result
            .indicators
            .quote
            .into_iter()
            .next()
            .context("Yahoo chart response has no quote series")?;

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            // Sessions with a missing print (halts, partial days) are skipped.
            let (Some(high), Some(low), Some(close)) =
                (field(&series.high), field(&series.low), field(&series.close))
            else {
                continue;
            };
            let Some(dt) = DateTime::<Utc>::from_timestamp(*ts, 0) else {
                continue;
            };
            bars.push(DailyBar {
                date: dt.date_naive(),
                high,
                low,
                close,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
