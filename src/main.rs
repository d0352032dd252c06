use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

mod api;
mod cache;
mod config;
mod error;
mod news;
mod normalize;
mod resources;
mod scheduler;
mod upstream;

use api::AppState;
use cache::CacheStore;
use config::Config;
use news::NewsClient;
use scheduler::Scheduler;
use upstream::{SportMonksClient, Upstream};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let sportmonks: Arc<dyn Upstream> = Arc::new(SportMonksClient::new(
        &config.sportmonks_api_url,
        &config.api_token,
    )?);
    let news = NewsClient::new(&config.news_api_url, config.news_api_key.clone())?;
    if !news.is_configured() {
        info!("NEWS_API_KEY not set; /api/news will answer 500");
    }

    // Slots start empty; every resource refreshes immediately on spawn
    let store = CacheStore::new();
    let handles = Scheduler::new(sportmonks, store.clone()).spawn();
    info!("Started {} refresh task(s)", handles.len());

    let app = api::router(AppState { store, news }, config.allowed_origins()?);
    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);

    // Runs until the process is killed
    axum::serve(listener, app).await?;

    Ok(())
}
