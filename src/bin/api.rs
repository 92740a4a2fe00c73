use call_risk_classifier::{api::start_server, ClassifierConfig, RiskEngine};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Loads .env; malformed configuration stops the process here
    let config = ClassifierConfig::from_env()?;

    if !config.oracle.is_enabled() {
        info!("GEMINI_API_KEY not set - running lexical-only");
    }

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("Call Risk Classifier - API Server");
    info!("Port: {}", api_port);

    let engine = Arc::new(RiskEngine::from_config(config)?);

    info!(oracle = engine.oracle_enabled(), "Risk engine initialized");

    start_server(engine, api_port).await?;

    Ok(())
}
