use call_risk_classifier::{ClassifierConfig, RiskEngine};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = ClassifierConfig::from_env()?;
    let engine = RiskEngine::from_config(config)?;

    // Transcript from arguments, or stdin when none are given
    let args: Vec<String> = std::env::args().skip(1).collect();
    let transcript = if args.is_empty() {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        buffer
    } else {
        args.join(" ")
    };

    info!(oracle = engine.oracle_enabled(), "Classifying transcript");

    let result = engine.classify(&transcript).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
