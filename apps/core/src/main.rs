// Soul Buddy Core Entry Point
// Intent classification pipeline behind a small JSON API

mod actors;
mod brain;
mod config;
mod error;
mod rate_limiter;
mod server;
mod telemetry;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use actors::llm::LlmActorHandle;
use brain::IntentPipeline;
use config::AppConfig;
use telemetry::LogFormat;
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine, the environment alone is enough
    dotenv::dotenv().ok();

    telemetry::init_tracing(LogFormat::from_env()?)?;

    let config = AppConfig::from_env()?;
    info!(
        model = %config.llm.model,
        llm = %config.llm.base_url,
        "Configuration loaded"
    );

    let llm = LlmActorHandle::new(config.llm.clone())?;
    let pipeline = IntentPipeline::new(Arc::new(llm));

    if !pipeline.llm_available().await {
        warn!(
            "LLM server at {} is not answering; requests will degrade until it is up",
            config.llm.base_url
        );
    }

    server::run(config, pipeline).await?;
    Ok(())
}
