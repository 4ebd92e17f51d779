pub mod analyzer;
pub mod domain;
pub mod error;
pub mod quotes;

pub use analyzer::QuoteAnalyzer;
pub use error::AnalyzeError;

pub mod config {
    use crate::domain::risk::RiskPolicy;
    use crate::error::AnalyzeError;
    use anyhow::Context;

    const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub finnhub_api_key: Option<String>,
        pub finnhub_base_url: Option<String>,
        pub finnhub_timeout_secs: Option<u64>,
        pub yahoo_base_url: Option<String>,
        pub yahoo_timeout_secs: Option<u64>,
        pub risk_policy: RiskPolicy,
        pub cors_allowed_origins: Vec<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let risk_policy = match std::env::var("RISK_POLICY").ok() {
                Some(s) if !s.trim().is_empty() => s
                    .parse::<RiskPolicy>()
                    .with_context(|| format!("invalid RISK_POLICY: {s}"))?,
                _ => RiskPolicy::default(),
            };

            let cors_allowed_origins = parse_origins(
                &std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            );

            Ok(Self {
                finnhub_api_key: non_empty_var("FINNHUB_API_KEY"),
                finnhub_base_url: non_empty_var("FINNHUB_BASE_URL"),
                finnhub_timeout_secs: parse_var("FINNHUB_TIMEOUT_SECS"),
                yahoo_base_url: non_empty_var("YAHOO_BASE_URL"),
                yahoo_timeout_secs: parse_var("YAHOO_TIMEOUT_SECS"),
                risk_policy,
                cors_allowed_origins,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        /// The quote credential has no default: a missing key is a configuration error.
        pub fn require_finnhub_api_key(&self) -> Result<&str, AnalyzeError> {
            self.finnhub_api_key
                .as_deref()
                .ok_or_else(|| AnalyzeError::Configuration("FINNHUB_API_KEY is required".into()))
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

    pub fn parse_origins(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

}
