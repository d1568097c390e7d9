use anyhow::Context;
use artconnect_ai::{router, AppState, ContentGenerator, Settings};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let content = ContentGenerator::from_settings(&settings).context("failed to build Gemini client")?;
    if content.is_online() {
        tracing::info!(
            key = %settings.masked_api_key(),
            text_model = %settings.text_model,
            vision_model = %settings.vision_model,
            "Gemini content generation enabled"
        );
    } else {
        tracing::info!("GEMINI_API_KEY not set, serving fallback content only");
    }

    let app = router(AppState { content });

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
