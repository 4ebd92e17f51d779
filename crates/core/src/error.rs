use thiserror::Error;

/// Errors surfaced to callers of the analyzer.
///
/// Provider-level failures never appear here directly: they either move the
/// lookup on to the next provider or collapse into `NotFound` once every
/// provider has been tried.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Invalid symbol or no data found for {symbol}")]
    NotFound { symbol: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}
