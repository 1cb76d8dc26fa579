use std::sync::Arc;

use anyhow::Context;
use ai_vision::{
    analysis::AnalysisClient, config::Config, controller::InteractionController,
    gemini::GeminiClient, routes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(model = %config.gemini.model, "using Gemini");

    let model = GeminiClient::new(&config.gemini).context("failed to build HTTP client")?;
    let client = AnalysisClient::new(Arc::new(model));
    let controller = Arc::new(InteractionController::new(client, config.follow_up_delay));

    let app = routes::router(controller, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
