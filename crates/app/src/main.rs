mod app;
mod auth;
mod config;
mod nav;
mod pages;
mod secrets;
mod session;
mod simple_md;

use anyhow::{anyhow, Context, Result};
use app::ResearchAssistantApp;
use config::AppConfig;
use eframe::egui;
use providers::{CompletionClient, PerplexityClient};
use secrets::DeploymentSecrets;
use services::{ConversationStore, LocalStore, MemoryStore};
use session::SessionContext;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    tracing::info!(data_dir = %config.data_dir.display(), "starting research assistant");

    let backend = config.open_store().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "conversation store unavailable, keeping history in memory");
        Box::new(MemoryStore::new())
    });
    let session = SessionContext::new(ConversationStore::open(LocalStore::new(backend)));
    let secrets = DeploymentSecrets::load(&config.secrets_path());
    let client: Arc<dyn CompletionClient> = Arc::new(
        PerplexityClient::with_endpoint(&config.api_url).context("building Perplexity client")?,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([760.0, 520.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Research Assistant",
        options,
        Box::new(move |_cc| Box::new(ResearchAssistantApp::new(session, secrets, client))),
    )
    .map_err(|e| anyhow!("ui exited with an error: {}", e))
}
