use crate::config::Settings;
use crate::error::AnalyzeError;
use crate::quotes::types::PriceSnapshot;
use crate::quotes::{ProviderOutcome, QuoteSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const TOKEN_HEADER: &str = "x-finnhub-token";

/// Real-time quote endpoint. Primary source for the day-range policy.
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FinnhubClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .finnhub_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings.finnhub_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build Finnhub http client")?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.finnhub_api_key.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/quote", self.base_url.trim_end_matches('/'))
    }

    fn headers(api_key: &str) -> Result<HeaderMap> {
        let mut token = HeaderValue::from_str(api_key).context("FINNHUB_API_KEY is not a valid header value")?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token);
        Ok(headers)
    }

    /// The key travels in a header and errors are stripped of their URL, so no failure text carries it.
    async fn fetch_quote(&self, symbol: &str, api_key: &str) -> Result<FinnhubQuote> {
        let res = self
            .http
            .get(self.url())
            .headers(Self::headers(api_key)?)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Finnhub request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to read Finnhub response")?;

        if !status.is_success() {
            anyhow::bail!("Finnhub HTTP {status}: {text}");
        }

        serde_json::from_str::<FinnhubQuote>(&text)
            .with_context(|| format!("Finnhub response is not a quote: {text}"))
    }
}

#[async_trait::async_trait]
impl QuoteSource for FinnhubClient {
    fn provider_name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_snapshot(&self, symbol: &str) -> ProviderOutcome<PriceSnapshot> {
        let Some(api_key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return ProviderOutcome::Fatal(AnalyzeError::Configuration(
                "FINNHUB_API_KEY is required".into(),
            ));
        };

        match self.fetch_quote(symbol, api_key).await {
            Ok(quote) => quote.into_outcome(),
            Err(err) => ProviderOutcome::Unavailable(format!("{err:#}")),
        }
    }
}

/// Finnhub's `/quote` payload. Unknown symbols come back with every field zeroed.
#[derive(Debug, Clone, Deserialize)]
struct FinnhubQuote {
    #[serde(rename = "c")]
    current: Option<f64>,
    #[serde(rename = "h")]
    high: Option<f64>,
    #[serde(rename = "l")]
    low: Option<f64>,
    #[serde(rename = "pc")]
    previous_close: Option<f64>,
    #[serde(rename = "t")]
    timestamp: Option<i64>,
}

impl FinnhubQuote {
    fn into_outcome(self) -> ProviderOutcome<PriceSnapshot> {
        let current = match self.current {
            Some(c) if c != 0.0 => c,
            _ => return ProviderOutcome::Unavailable("no current price from Finnhub".into()),
        };

        let (Some(high), Some(low), Some(previous_close)) =
            (self.high, self.low, self.previous_close)
        else {
            return ProviderOutcome::Unavailable("Finnhub quote is missing high/low/previous close".into());
        };

        ProviderOutcome::Ready(PriceSnapshot {
            current,
            high,
            low,
            previous_close,
            as_of: self
                .timestamp
                .filter(|t| *t > 0)
                .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
        })
    }
}
