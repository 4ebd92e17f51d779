use anyhow::Context;
use clap::Parser;
use nexavest_core::config::Settings;
use nexavest_core::domain::analysis::AnalysisRequest;
use nexavest_core::domain::risk::RiskPolicy;
use nexavest_core::QuoteAnalyzer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "nexavest_cli")]
struct Args {
    /// Ticker symbol, any case (e.g. aapl).
    symbol: String,

    /// Position size. Accepted for parity with the HTTP API; not used in the math.
    #[arg(long)]
    amount: Option<f64>,

    /// Overrides RISK_POLICY: day_range or annualized.
    #[arg(long)]
    policy: Option<RiskPolicy>,

    /// Use the advisory wording instead of the summary sentence.
    #[arg(long)]
    advice: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(policy) = args.policy {
        settings.risk_policy = policy;
    }

    let analyzer = QuoteAnalyzer::from_settings(&settings)?;
    let req = AnalysisRequest::new(args.symbol, args.amount);

    let outcome = if args.advice {
        analyzer.recommend(&req).await
    } else {
        analyzer.analyze(&req).await
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(symbol = %req.symbol, error = %err, "analysis failed");
            return Err(err);
        }
    };

    let out = serde_json::to_string_pretty(&result).context("failed to encode analysis result")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
